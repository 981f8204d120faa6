//! End-to-end test for the merge command's file round trip.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use omv_cli::cli::MergeArgs;
use omv_cli::commands::run_merge;
use omv_model::{
    EntityKind, ExternalId, FormName, MergedReport, Report, ReportEntry, ReportMeta, SourceName,
    Statistics, Status,
};

fn unique_temp_dir(name: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "omv-{}-{}-{}",
        name,
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    dir
}

fn write_report(path: &Path, source_name: &str, entries: &[(&str, Status)]) {
    let source = SourceName::new(source_name).unwrap();
    let entries: Vec<ReportEntry> = entries
        .iter()
        .map(|(id, status)| {
            let mut statuses = BTreeMap::new();
            statuses.insert(source.clone(), *status);
            ReportEntry {
                external_id: ExternalId::new(*id).unwrap(),
                kind: EntityKind::Concept,
                statuses,
            }
        })
        .collect();
    let mut processed_forms = BTreeMap::new();
    processed_forms.insert(FormName::new("F01").unwrap(), entries);
    let report = Report {
        meta: ReportMeta {
            source: source.clone(),
            display: source.display_name(),
            timestamp: Utc::now(),
        },
        processed_forms,
        statistics: Statistics::default(),
        errors: Vec::new(),
    };
    fs::write(path, serde_json::to_string_pretty(&report).unwrap()).unwrap();
}

#[test]
fn merge_command_round_trips_reports_through_files() {
    let dir = unique_temp_dir("merge");
    fs::create_dir_all(&dir).unwrap();
    let r1_path = dir.join("env1.json");
    let r2_path = dir.join("env2.json");
    let out_path = dir.join("merged.json");

    write_report(&r1_path, "env1", &[("id1", Status::Found)]);
    write_report(
        &r2_path,
        "env2",
        &[("id1", Status::NotFound), ("id2", Status::Found)],
    );

    let args = MergeArgs {
        reports: vec![r1_path, r2_path],
        output: Some(out_path.clone()),
        distinguish_never_checked: false,
    };
    let result = run_merge(&args).unwrap();
    assert_eq!(result.merged.merged_entities.len(), 2);

    let written: MergedReport =
        serde_json::from_str(&fs::read_to_string(&out_path).unwrap()).unwrap();
    assert_eq!(written.merged_entities.len(), 2);

    let env1 = SourceName::new("env1").unwrap();
    let id2 = written
        .merged_entities
        .iter()
        .find(|record| record.external_id.as_str() == "id2")
        .unwrap();
    // env1's report never contained id2
    assert_eq!(
        serde_json::to_value(id2.statuses.get(&env1).unwrap()).unwrap(),
        serde_json::json!("NeverChecked")
    );
    assert_eq!(
        written.missing_by_source[&env1],
        vec![ExternalId::new("id2").unwrap()]
    );

    fs::remove_dir_all(&dir).unwrap();
}
