//! Per-source verification: bounded fan-out of lookups over a catalog.
//!
//! Lookups for distinct entities run concurrently under a semaphore bound;
//! their outcomes are folded back on the calling task, so the catalog and
//! the statistics counters are only ever written by a single writer and the
//! status/counter pair for one entity is applied as a unit.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use omv_model::{
    Catalog, EntityKind, LookupFailure, SourceName, StatBucket, Statistics, Status,
};

use crate::aggregate::{Outcome, StatsAggregator};
use crate::lookup::{Lookup, LookupError, LookupOutcome};

/// Tuning for one verification pass.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Maximum lookups in flight at once.
    pub concurrency: usize,
    /// Ceiling on a single lookup; expiry counts the entity as missing.
    pub timeout: Duration,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome of one verification pass over one or more kinds.
#[derive(Debug)]
pub struct VerifyRun {
    /// Final counters, seeded from statuses resolved on earlier runs.
    pub statistics: Statistics,
    /// Lookups that errored; their entities were counted as missing.
    pub failures: Vec<LookupFailure>,
    /// Number of lookups actually issued (zero on a fully-resolved re-run).
    pub lookups: usize,
}

/// Drives lookups for one source over a catalog and updates it in place.
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    config: VerifyConfig,
}

impl Verifier {
    pub fn new(config: VerifyConfig) -> Self {
        Self { config }
    }

    /// Verify every kind in the catalog against one source.
    pub async fn verify_all(
        &self,
        catalog: &mut Catalog,
        source: &SourceName,
        lookup: &Arc<dyn Lookup>,
    ) -> VerifyRun {
        self.verify(catalog, &EntityKind::ALL, source, lookup).await
    }

    /// Verify the given kinds against one source.
    ///
    /// Entities already carrying a resolved status for `source` are skipped
    /// and pre-folded into the counters, so re-invocation only retries
    /// entities left not-checked by an earlier, partially failed run.
    pub async fn verify(
        &self,
        catalog: &mut Catalog,
        kinds: &[EntityKind],
        source: &SourceName,
        lookup: &Arc<dyn Lookup>,
    ) -> VerifyRun {
        let mut statistics = Statistics::default();
        for &kind in kinds {
            *statistics.bucket_mut(kind) = StatBucket::new(catalog.len(kind));
        }
        let mut aggregator = StatsAggregator::new(statistics);
        let mut failures = Vec::new();
        let mut lookups = 0;
        for &kind in kinds {
            lookups += self
                .verify_kind(catalog, kind, source, lookup, &mut aggregator, &mut failures)
                .await;
        }
        let statistics = aggregator.into_statistics();
        if !statistics.is_complete() {
            warn!(
                %source,
                not_checked = statistics.summary().not_checked,
                "verification pass left entities unchecked"
            );
        }
        VerifyRun {
            statistics,
            failures,
            lookups,
        }
    }

    async fn verify_kind(
        &self,
        catalog: &mut Catalog,
        kind: EntityKind,
        source: &SourceName,
        lookup: &Arc<dyn Lookup>,
        aggregator: &mut StatsAggregator,
        failures: &mut Vec<LookupFailure>,
    ) -> usize {
        let mut pending = Vec::new();
        for entity in catalog.entities(kind) {
            match entity.status_for(source) {
                Status::Found => aggregator.record(kind, Outcome::Found),
                Status::NotFound => aggregator.record(kind, Outcome::Missing),
                Status::NotChecked => pending.push(entity.id.clone()),
            }
        }
        if pending.is_empty() {
            debug!(%source, %kind, "nothing to verify");
            return 0;
        }
        let issued = pending.len();
        debug!(
            %source,
            %kind,
            pending = issued,
            concurrency = self.config.concurrency,
            "issuing lookups"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut in_flight = JoinSet::new();
        for id in pending {
            let semaphore = Arc::clone(&semaphore);
            let lookup = Arc::clone(lookup);
            let timeout = self.config.timeout;
            in_flight.spawn(async move {
                // Held for the duration of the lookup to bound concurrency.
                let _permit = semaphore.acquire_owned().await.ok();
                let result = match tokio::time::timeout(timeout, lookup.lookup(&id)).await {
                    Ok(result) => result,
                    Err(_) => Err(LookupError::TimedOut(timeout)),
                };
                (id, result)
            });
        }

        while let Some(joined) = in_flight.join_next().await {
            let (id, result) = match joined {
                Ok(pair) => pair,
                Err(error) => {
                    // A panicked lookup task leaves its entity not-checked;
                    // a re-run picks it up.
                    warn!(%source, %kind, error = %error, "lookup task failed to join");
                    continue;
                }
            };
            let Some(entity) = catalog.get_mut(kind, &id) else {
                continue;
            };
            // Status write and counter update land together on this task.
            match result {
                Ok(LookupOutcome::Found) => {
                    entity.statuses.insert(source.clone(), Status::Found);
                    aggregator.record(kind, Outcome::Found);
                }
                Ok(LookupOutcome::NotFound) => {
                    debug!(%source, %kind, %id, "not found");
                    entity.statuses.insert(source.clone(), Status::NotFound);
                    aggregator.record(kind, Outcome::Missing);
                }
                Err(error) => {
                    warn!(%source, %kind, %id, error = %error, "lookup failed, counting as missing");
                    entity.statuses.insert(source.clone(), Status::NotFound);
                    aggregator.record(kind, Outcome::Missing);
                    failures.push(LookupFailure {
                        external_id: id,
                        kind,
                        source: source.clone(),
                        message: error.to_string(),
                    });
                }
            }
        }
        issued
    }
}
