//! Statistics bookkeeping for one verification pass.

use omv_model::{EntityKind, Statistics};

/// Classified lookup result as it lands in the counters. Errors have already
/// been folded into `Missing` by the time they reach the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Found,
    Missing,
}

/// Owns the per-kind counters for one source while lookups are in flight.
///
/// Every recorded outcome moves exactly one entity out of `not_checked`; the
/// caller pairs each `record` with the matching status write, so
/// `found + missing + not_checked == total` holds at every observable point.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    statistics: Statistics,
}

impl StatsAggregator {
    pub fn new(statistics: Statistics) -> Self {
        Self { statistics }
    }

    pub fn record(&mut self, kind: EntityKind, outcome: Outcome) {
        let bucket = self.statistics.bucket_mut(kind);
        match outcome {
            Outcome::Found => bucket.record_found(),
            Outcome::Missing => bucket.record_missing(),
        }
    }

    pub fn snapshot(&self) -> Statistics {
        self.statistics.clone()
    }

    pub fn into_statistics(self) -> Statistics {
        self.statistics
    }
}
