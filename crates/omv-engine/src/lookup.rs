//! The lookup capability boundary.
//!
//! A [`Lookup`] answers one question: does this identifier exist in one
//! remote source? Transport details (REST GET, query search) live behind the
//! trait; the engine only sees found / not-found / error.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use omv_model::ExternalId;

/// Result of a successful existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Found,
    NotFound,
}

/// A lookup that could not produce a trustworthy answer.
///
/// Never fatal: the engine folds these into the Missing count and keeps
/// going, recording the failure for the report's audit list.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("lookup timed out after {0:?}")]
    TimedOut(Duration),
}

/// Single-identifier existence check against one named source.
#[async_trait]
pub trait Lookup: Send + Sync {
    async fn lookup(&self, id: &ExternalId) -> Result<LookupOutcome, LookupError>;
}
