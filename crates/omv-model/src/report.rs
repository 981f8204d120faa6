use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Catalog, EntityKind, ExternalId, FormName, SourceName, StatBucket, Statistics, Status};

/// Audit record for a lookup that errored during a verification pass.
///
/// Errored lookups are folded into the Missing count, but they are kept here
/// so partial failures stay auditable instead of only being logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupFailure {
    pub external_id: ExternalId,
    pub kind: EntityKind,
    pub source: SourceName,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub source: SourceName,
    pub display: String,
    pub timestamp: DateTime<Utc>,
}

/// One entity entry inside a report's per-form tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub external_id: ExternalId,
    pub kind: EntityKind,
    #[serde(default)]
    pub statuses: BTreeMap<SourceName, Status>,
}

/// The externally visible artifact of one verification pass.
///
/// Entities are restructured as per-form trees; entities without form
/// provenance (attribute and identifier types) are grouped under their
/// kind's group name so every entry has a form key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub meta: ReportMeta,
    pub processed_forms: BTreeMap<FormName, Vec<ReportEntry>>,
    pub statistics: Statistics,
    #[serde(default)]
    pub errors: Vec<LookupFailure>,
}

impl Report {
    /// Restructure a verified catalog into the per-form report tree.
    pub fn from_catalog(
        catalog: &Catalog,
        meta: ReportMeta,
        statistics: Statistics,
        errors: Vec<LookupFailure>,
    ) -> Self {
        let mut processed_forms: BTreeMap<FormName, Vec<ReportEntry>> = BTreeMap::new();
        for kind in EntityKind::ALL {
            for entity in catalog.entities(kind) {
                let entry = ReportEntry {
                    external_id: entity.id.clone(),
                    kind,
                    statuses: entity.statuses.clone(),
                };
                if entity.forms.is_empty() {
                    processed_forms
                        .entry(pseudo_form(kind))
                        .or_default()
                        .push(entry);
                } else {
                    for form in &entity.forms {
                        processed_forms
                            .entry(form.clone())
                            .or_default()
                            .push(entry.clone());
                    }
                }
            }
        }
        Self {
            meta,
            processed_forms,
            statistics,
            errors,
        }
    }

    /// Number of entity entries across all form trees.
    pub fn entry_count(&self) -> usize {
        self.processed_forms.values().map(Vec::len).sum()
    }
}

/// Group key used when an entity carries no form provenance.
pub fn pseudo_form(kind: EntityKind) -> FormName {
    FormName::new(kind.group_name()).expect("kind group names are non-empty")
}

/// Merge-side status for one `(record, source)` cell.
///
/// Distinguishes "the source checked and did not find" from "the source's
/// report never contained the entity"; display policy decides whether the
/// two collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergedStatus {
    Found,
    #[serde(rename = "Missing")]
    NotFound,
    NeverChecked,
}

impl From<Status> for MergedStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Found => MergedStatus::Found,
            Status::NotFound => MergedStatus::NotFound,
            // A status the source never resolved is indistinguishable from
            // the source never having seen the entity.
            Status::NotChecked => MergedStatus::NeverChecked,
        }
    }
}

impl fmt::Display for MergedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergedStatus::Found => f.write_str("Found"),
            MergedStatus::NotFound => f.write_str("Missing"),
            MergedStatus::NeverChecked => f.write_str("Never checked"),
        }
    }
}

/// One row of the cross-source matrix, keyed by `(externalId, formName)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedRecord {
    pub external_id: ExternalId,
    pub form_name: FormName,
    pub kind: EntityKind,
    pub statuses: BTreeMap<SourceName, MergedStatus>,
}

/// Per-source coverage counters for one merge.
///
/// `total_forms` counts the entries the source's own report contained, not
/// the merged universe size; `missing_external_ids` counts merged records
/// that source never covered. The asymmetry is deliberate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMergeStats {
    pub total_forms: usize,
    pub forms_counted: usize,
    pub missing_external_ids: usize,
}

/// The unified matrix built from N per-source reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedReport {
    pub merged_entities: Vec<MergedRecord>,
    pub per_source_stats: BTreeMap<SourceName, SourceMergeStats>,
    pub missing_by_source: BTreeMap<SourceName, Vec<ExternalId>>,
    pub meta: BTreeMap<SourceName, DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Dashboard notification payload
// ---------------------------------------------------------------------------

/// Progress payload pushed to the status dashboard, one per (kind, source).
/// Delivery is best effort and never feeds back into verification state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardNotification {
    pub system: String,
    pub group: String,
    pub message: String,
    pub stats: DashboardStats,
    pub meta: DashboardMeta,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: usize,
    pub not_checked: usize,
    pub found: usize,
    pub not_found: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMeta {
    pub validation_url: String,
}

impl DashboardNotification {
    /// Build the progress payload for one kind's bucket.
    pub fn for_bucket(
        system: impl Into<String>,
        kind: EntityKind,
        bucket: StatBucket,
        validation_url: impl Into<String>,
    ) -> Self {
        Self {
            system: system.into(),
            group: kind.group_name().to_string(),
            message: "Verification Progress".to_string(),
            stats: DashboardStats {
                total: bucket.total,
                not_checked: bucket.not_checked,
                found: bucket.found,
                not_found: bucket.missing,
            },
            meta: DashboardMeta {
                validation_url: validation_url.into(),
            },
        }
    }
}
