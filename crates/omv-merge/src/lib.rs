//! Cross-source report merge.
//!
//! Joins N independently produced verification reports into one matrix of
//! `(externalId, formName)` records, each carrying a status per source.
//! Records appear in first-seen order across the input reports, so merging
//! the same reports in the same order is reproducible byte for byte.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use omv_model::{
    ExternalId, FormName, MergedRecord, MergedReport, MergedStatus, Report, SourceName,
};

/// How `NeverChecked` is rendered next to `NotFound` in display output.
///
/// The merged data always stores the two distinctly; only rendering
/// collapses them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Render both "checked, not found" and "never covered by this source"
    /// as "Missing" (the original dashboard behavior).
    #[default]
    CollapseToMissing,
    /// Keep "Never checked" visible for audit output.
    Distinguish,
}

impl MergePolicy {
    pub fn display(self, status: MergedStatus) -> &'static str {
        match (self, status) {
            (_, MergedStatus::Found) => "Found",
            (_, MergedStatus::NotFound) => "Missing",
            (MergePolicy::CollapseToMissing, MergedStatus::NeverChecked) => "Missing",
            (MergePolicy::Distinguish, MergedStatus::NeverChecked) => "Never checked",
        }
    }
}

/// Merge reports in the given order into one cross-source matrix.
///
/// Join key is the `(externalId, formName)` pair: the same identifier under
/// different form names yields one record per form, preserving form-level
/// provenance. Every record carries a status for every input source; sources
/// whose report never contained a record are filled with
/// [`MergedStatus::NeverChecked`] and listed under `missingBySource`.
pub fn merge_reports(reports: &[Report]) -> MergedReport {
    let mut merged: Vec<MergedRecord> = Vec::new();
    let mut index: HashMap<(ExternalId, FormName), usize> = HashMap::new();
    let mut out = MergedReport::default();
    let mut sources: Vec<SourceName> = Vec::new();

    for report in reports {
        let source = report.meta.source.clone();
        if !sources.contains(&source) {
            sources.push(source.clone());
        }
        out.meta.insert(source.clone(), report.meta.timestamp);
        let mut stats = out.per_source_stats.remove(&source).unwrap_or_default();
        let mut missing = out.missing_by_source.remove(&source).unwrap_or_default();

        for (form_name, entries) in &report.processed_forms {
            stats.total_forms += entries.len();
            for entry in entries {
                let key = (entry.external_id.clone(), form_name.clone());
                let position = match index.get(&key) {
                    Some(&position) => position,
                    None => {
                        let position = merged.len();
                        merged.push(MergedRecord {
                            external_id: entry.external_id.clone(),
                            form_name: form_name.clone(),
                            kind: entry.kind,
                            statuses: BTreeMap::new(),
                        });
                        index.insert(key, position);
                        position
                    }
                };
                let record = &mut merged[position];
                let status = entry
                    .statuses
                    .get(&source)
                    .copied()
                    .map_or(MergedStatus::NeverChecked, MergedStatus::from);

                match record.statuses.get(&source) {
                    Some(&existing) if existing != status => {
                        // Conflicting data for the same key; keep the first
                        // value so merge order stays the only tiebreak.
                        warn!(
                            external_id = %record.external_id,
                            form = %record.form_name,
                            %source,
                            kept = %existing,
                            dropped = %status,
                            "join ambiguity: conflicting statuses for one merge key"
                        );
                    }
                    _ => {
                        record.statuses.insert(source.clone(), status);
                    }
                }
                if status == MergedStatus::NeverChecked {
                    missing.push(entry.external_id.clone());
                    stats.missing_external_ids += 1;
                } else {
                    stats.forms_counted += 1;
                }
            }
        }
        out.per_source_stats.insert(source.clone(), stats);
        out.missing_by_source.insert(source, missing);
    }

    // Fill sources that never contained a record at all. total_forms stays
    // untouched: it reflects what each source's own report attempted.
    for record in &mut merged {
        for source in &sources {
            if record.statuses.contains_key(source) {
                continue;
            }
            record
                .statuses
                .insert(source.clone(), MergedStatus::NeverChecked);
            if let Some(stats) = out.per_source_stats.get_mut(source) {
                stats.missing_external_ids += 1;
            }
            if let Some(missing) = out.missing_by_source.get_mut(source) {
                missing.push(record.external_id.clone());
            }
        }
    }

    out.merged_entities = merged;
    out
}
