use std::path::PathBuf;

use omv_merge::MergePolicy;
use omv_model::{LookupFailure, MergedReport, SourceName, Statistics};

#[derive(Debug)]
pub struct VerifyResult {
    pub source: SourceName,
    pub statistics: Statistics,
    pub failures: Vec<LookupFailure>,
    pub lookups: usize,
    pub output: Option<PathBuf>,
}

impl VerifyResult {
    /// True when the pass should exit nonzero: some lookups errored or some
    /// entities were left unchecked.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty() || !self.statistics.is_complete()
    }
}

#[derive(Debug)]
pub struct MergeResult {
    pub merged: MergedReport,
    pub policy: MergePolicy,
    pub output: Option<PathBuf>,
}
