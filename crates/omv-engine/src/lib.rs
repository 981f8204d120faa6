//! Entity verification engine.
//!
//! Fan-out of single-identifier existence checks against a remote source,
//! with consistent per-kind statistics and idempotent re-runs.

pub mod aggregate;
pub mod lookup;
pub mod verifier;

pub use aggregate::{Outcome, StatsAggregator};
pub use lookup::{Lookup, LookupError, LookupOutcome};
pub use verifier::{Verifier, VerifyConfig, VerifyRun};
