//! Integration tests for the verification fan-out.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use omv_engine::{Lookup, LookupError, LookupOutcome, Verifier, VerifyConfig};
use omv_model::{Catalog, EntityKind, ExternalId, SourceName, Status};

#[derive(Clone, Copy)]
enum Script {
    Found,
    NotFound,
    Fail,
    Hang,
}

/// Lookup that replays scripted outcomes and counts invocations.
struct ScriptedLookup {
    outcomes: HashMap<ExternalId, Script>,
    calls: AtomicUsize,
}

impl ScriptedLookup {
    fn new(outcomes: impl IntoIterator<Item = (&'static str, Script)>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: outcomes
                .into_iter()
                .map(|(id, script)| (id_of(id), script))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Lookup for ScriptedLookup {
    async fn lookup(&self, id: &ExternalId) -> Result<LookupOutcome, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.outcomes.get(id) {
            Some(Script::Found) => Ok(LookupOutcome::Found),
            Some(Script::NotFound) | None => Ok(LookupOutcome::NotFound),
            Some(Script::Fail) => Err(LookupError::Transport("connection refused".to_string())),
            Some(Script::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(LookupOutcome::Found)
            }
        }
    }
}

fn id_of(value: &str) -> ExternalId {
    ExternalId::new(value).unwrap()
}

fn source_of(value: &str) -> SourceName {
    SourceName::new(value).unwrap()
}

fn concept_catalog(ids: &[&str]) -> Catalog {
    let mut catalog = Catalog::new();
    for id in ids {
        catalog.insert_or_get(EntityKind::Concept, id_of(id));
    }
    catalog
}

#[tokio::test]
async fn found_and_not_found_update_statuses_and_counters() {
    let mut catalog = concept_catalog(&["id1", "id2"]);
    let lookup: Arc<dyn Lookup> =
        ScriptedLookup::new([("id1", Script::Found), ("id2", Script::NotFound)]);
    let source = source_of("env1");

    let run = Verifier::default()
        .verify(&mut catalog, &[EntityKind::Concept], &source, &lookup)
        .await;

    let id1 = catalog.get(EntityKind::Concept, &id_of("id1")).unwrap();
    let id2 = catalog.get(EntityKind::Concept, &id_of("id2")).unwrap();
    assert_eq!(id1.status_for(&source), Status::Found);
    assert_eq!(id2.status_for(&source), Status::NotFound);

    let bucket = run.statistics.bucket(EntityKind::Concept);
    assert_eq!(bucket.total, 2);
    assert_eq!(bucket.found, 1);
    assert_eq!(bucket.missing, 1);
    assert_eq!(bucket.not_checked, 0);
    assert!(run.failures.is_empty());
    assert_eq!(run.lookups, 2);
}

#[tokio::test]
async fn rerun_skips_resolved_entities_and_keeps_statistics() {
    let mut catalog = concept_catalog(&["id1", "id2"]);
    let scripted = ScriptedLookup::new([("id1", Script::Found), ("id2", Script::NotFound)]);
    let lookup: Arc<dyn Lookup> = scripted.clone();
    let source = source_of("env1");
    let verifier = Verifier::default();

    let first = verifier
        .verify(&mut catalog, &[EntityKind::Concept], &source, &lookup)
        .await;
    assert_eq!(scripted.calls(), 2);

    let second = verifier
        .verify(&mut catalog, &[EntityKind::Concept], &source, &lookup)
        .await;
    assert_eq!(scripted.calls(), 2, "re-run must issue no lookups");
    assert_eq!(second.lookups, 0);
    assert_eq!(second.statistics, first.statistics);
}

#[tokio::test]
async fn errors_fold_into_missing_without_aborting_the_batch() {
    let mut catalog = concept_catalog(&["id1", "id2", "id3"]);
    let lookup: Arc<dyn Lookup> = ScriptedLookup::new([
        ("id1", Script::Found),
        ("id2", Script::Fail),
        ("id3", Script::Found),
    ]);
    let source = source_of("env1");

    let run = Verifier::default()
        .verify(&mut catalog, &[EntityKind::Concept], &source, &lookup)
        .await;

    let id2 = catalog.get(EntityKind::Concept, &id_of("id2")).unwrap();
    assert_eq!(id2.status_for(&source), Status::NotFound);

    let bucket = run.statistics.bucket(EntityKind::Concept);
    assert_eq!(bucket.found, 2);
    assert_eq!(bucket.missing, 1);
    assert_eq!(bucket.not_checked, 0);

    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].external_id, id_of("id2"));
    assert!(run.failures[0].message.contains("connection refused"));
}

#[tokio::test]
async fn timed_out_lookup_counts_as_missing_not_unchecked() {
    let mut catalog = concept_catalog(&["id1", "id2"]);
    let lookup: Arc<dyn Lookup> =
        ScriptedLookup::new([("id1", Script::Hang), ("id2", Script::Found)]);
    let source = source_of("env1");
    let verifier = Verifier::new(VerifyConfig {
        concurrency: 4,
        timeout: Duration::from_millis(50),
    });

    let run = verifier
        .verify(&mut catalog, &[EntityKind::Concept], &source, &lookup)
        .await;

    let id1 = catalog.get(EntityKind::Concept, &id_of("id1")).unwrap();
    assert_eq!(id1.status_for(&source), Status::NotFound);

    let bucket = run.statistics.bucket(EntityKind::Concept);
    assert_eq!(bucket.not_checked, 0);
    assert_eq!(bucket.found, 1);
    assert_eq!(bucket.missing, 1);
    assert_eq!(run.failures.len(), 1);
    assert!(run.failures[0].message.contains("timed out"));
}

#[tokio::test]
async fn concurrent_and_sequential_runs_agree() {
    let script = [
        ("a", Script::Found),
        ("b", Script::NotFound),
        ("c", Script::Found),
        ("d", Script::Fail),
        ("e", Script::NotFound),
    ];
    let source = source_of("env1");

    let mut results = Vec::new();
    for concurrency in [1, 8] {
        let mut catalog = concept_catalog(&["a", "b", "c", "d", "e"]);
        let lookup: Arc<dyn Lookup> = ScriptedLookup::new(script);
        let verifier = Verifier::new(VerifyConfig {
            concurrency,
            ..VerifyConfig::default()
        });
        let run = verifier
            .verify(&mut catalog, &[EntityKind::Concept], &source, &lookup)
            .await;
        let statuses: Vec<Status> = catalog
            .entities(EntityKind::Concept)
            .iter()
            .map(|entity| entity.status_for(&source))
            .collect();
        results.push((statuses, run.statistics));
    }

    assert_eq!(results[0].0, results[1].0);
    assert_eq!(results[0].1, results[1].1);
}

#[tokio::test]
async fn verify_all_covers_every_kind() {
    let mut catalog = Catalog::new();
    catalog.insert_or_get(EntityKind::Concept, id_of("c1"));
    catalog.insert_or_get(EntityKind::AttributeType, id_of("a1"));
    catalog.insert_or_get(EntityKind::IdentifierType, id_of("i1"));
    let lookup: Arc<dyn Lookup> = ScriptedLookup::new([
        ("c1", Script::Found),
        ("a1", Script::NotFound),
        ("i1", Script::Found),
    ]);
    let source = source_of("env1");

    let run = Verifier::default()
        .verify_all(&mut catalog, &source, &lookup)
        .await;

    assert_eq!(run.statistics.bucket(EntityKind::Concept).found, 1);
    assert_eq!(run.statistics.bucket(EntityKind::AttributeType).missing, 1);
    assert_eq!(run.statistics.bucket(EntityKind::IdentifierType).found, 1);
    let summary = run.statistics.summary();
    assert_eq!(summary.total, 3);
    assert!(run.statistics.is_complete());
}

#[tokio::test]
async fn mixed_seed_statuses_produce_consistent_counters() {
    let mut catalog = concept_catalog(&["a", "b", "c"]);
    let source = source_of("env1");
    // One entity already resolved by an earlier run.
    catalog
        .get_mut(EntityKind::Concept, &id_of("a"))
        .unwrap()
        .statuses
        .insert(source.clone(), Status::Found);

    let scripted = ScriptedLookup::new([("b", Script::NotFound), ("c", Script::Found)]);
    let lookup: Arc<dyn Lookup> = scripted.clone();

    let run = Verifier::default()
        .verify(&mut catalog, &[EntityKind::Concept], &source, &lookup)
        .await;

    assert_eq!(scripted.calls(), 2);
    let bucket = run.statistics.bucket(EntityKind::Concept);
    assert_eq!(bucket.total, 3);
    assert_eq!(bucket.found, 2);
    assert_eq!(bucket.missing, 1);
    assert!(run.statistics.is_consistent());
}
