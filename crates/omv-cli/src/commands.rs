use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use comfy_table::Table;
use tracing::info;

use omv_client::{DashboardSink, OclLookup, OpenMrsLookup, build_http_client};
use omv_engine::{Lookup, Verifier, VerifyConfig};
use omv_merge::{MergePolicy, merge_reports};
use omv_model::{Catalog, CatalogInput, EntityKind, Report, ReportMeta, SourceName, Statistics};

use crate::cli::{MergeArgs, VerifyArgs};
use crate::summary::apply_table_style;
use crate::types::{MergeResult, VerifyResult};

pub fn run_kinds() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Kind", "REST resource", "Group"]);
    apply_table_style(&mut table);
    for kind in EntityKind::ALL {
        table.add_row(vec![kind.label(), kind.rest_segment(), kind.group_name()]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_verify(args: &VerifyArgs) -> Result<VerifyResult> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("build async runtime")?;
    runtime.block_on(verify_catalog(args))
}

/// Which remote-system flavor a verification pass talks to.
#[derive(Clone, Copy)]
enum SourceFlavor<'a> {
    OpenMrs(&'a str),
    Ocl(&'a str),
}

impl SourceFlavor<'_> {
    fn system(&self) -> &'static str {
        match self {
            SourceFlavor::OpenMrs(_) => "OpenMRS",
            SourceFlavor::Ocl(_) => "OCL",
        }
    }

    fn url(&self) -> &str {
        match self {
            SourceFlavor::OpenMrs(url) | SourceFlavor::Ocl(url) => url,
        }
    }

    /// Kinds verified when no `--kind` filter is given. OCL is a terminology
    /// service, so identifier types are skipped there.
    fn default_kinds(&self) -> Vec<EntityKind> {
        match self {
            SourceFlavor::OpenMrs(_) => EntityKind::ALL.to_vec(),
            SourceFlavor::Ocl(_) => vec![EntityKind::Concept, EntityKind::AttributeType],
        }
    }
}

async fn verify_catalog(args: &VerifyArgs) -> Result<VerifyResult> {
    let source = SourceName::new(args.source.clone())?;
    let flavor = match (&args.base_url, &args.ocl_url) {
        (Some(base), None) => SourceFlavor::OpenMrs(base.as_str()),
        (None, Some(url)) => SourceFlavor::Ocl(url.as_str()),
        (Some(_), Some(_)) => bail!("--base-url and --ocl-url are mutually exclusive"),
        (None, None) => bail!("one of --base-url or --ocl-url is required"),
    };

    let input: CatalogInput = read_json(&args.catalog)
        .with_context(|| format!("read catalog {}", args.catalog.display()))?;
    let mut catalog = Catalog::from_input(input)?;

    let kinds: Vec<EntityKind> = if args.kinds.is_empty() {
        flavor.default_kinds()
    } else {
        args.kinds.iter().map(|&kind| kind.into()).collect()
    };

    let timeout = Duration::from_secs(args.timeout_secs);
    let http = build_http_client(timeout)?;
    let verifier = Verifier::new(VerifyConfig {
        concurrency: args.concurrency,
        timeout,
    });

    info!(
        %source,
        system = flavor.system(),
        entities = catalog.total_len(),
        "starting verification pass"
    );
    let mut statistics = Statistics::default();
    let mut failures = Vec::new();
    let mut lookups = 0;
    for &kind in &kinds {
        let lookup: Arc<dyn Lookup> = match flavor {
            SourceFlavor::OpenMrs(base) => Arc::new(OpenMrsLookup::new(http.clone(), base, kind)),
            SourceFlavor::Ocl(url) => Arc::new(OclLookup::new(http.clone(), url)),
        };
        let run = verifier.verify(&mut catalog, &[kind], &source, &lookup).await;
        *statistics.bucket_mut(kind) = run.statistics.bucket(kind);
        failures.extend(run.failures);
        lookups += run.lookups;
        info!(%kind, lookups = run.lookups, "kind verified");
    }

    let report = Report::from_catalog(
        &catalog,
        ReportMeta {
            source: source.clone(),
            display: source.display_name(),
            timestamp: Utc::now(),
        },
        statistics.clone(),
        failures.clone(),
    );
    if let Some(path) = &args.output {
        write_json(path, &report).with_context(|| format!("write report {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }

    if let Some(dashboard_url) = &args.dashboard_url {
        let validation_url = args
            .validation_url
            .clone()
            .unwrap_or_else(|| flavor.url().to_string());
        DashboardSink::new(http.clone(), dashboard_url)
            .push_statistics(flavor.system(), &statistics, &validation_url)
            .await;
    }

    Ok(VerifyResult {
        source,
        statistics,
        failures,
        lookups,
        output: args.output.clone(),
    })
}

pub fn run_merge(args: &MergeArgs) -> Result<MergeResult> {
    let mut reports: Vec<Report> = Vec::new();
    for path in &args.reports {
        let report =
            read_json(path).with_context(|| format!("read report {}", path.display()))?;
        reports.push(report);
    }
    let merged = merge_reports(&reports);
    info!(
        reports = reports.len(),
        records = merged.merged_entities.len(),
        "reports merged"
    );
    if let Some(path) = &args.output {
        write_json(path, &merged)
            .with_context(|| format!("write merged report {}", path.display()))?;
        info!(path = %path.display(), "merged report written");
    }
    let policy = if args.distinguish_never_checked {
        MergePolicy::Distinguish
    } else {
        MergePolicy::CollapseToMissing
    };
    Ok(MergeResult {
        merged,
        policy,
        output: args.output.clone(),
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path)?;
    let value = serde_json::from_str(&contents)?;
    Ok(value)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}
