//! CLI argument definitions for the metadata verifier.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use omv_model::EntityKind;

#[derive(Parser)]
#[command(
    name = "omv",
    version,
    about = "OpenMRS Metadata Verifier - Reconcile metadata identifiers across systems",
    long_about = "Verify that concepts, person attribute types, and patient identifier\n\
                  types from a configuration catalog exist in OpenMRS deployments and\n\
                  OCL collections, and merge per-source reports into one matrix."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Verify a catalog against one source and write a report.
    Verify(VerifyArgs),

    /// Merge per-source reports into one cross-source matrix.
    Merge(MergeArgs),

    /// List the entity kinds and their remote resource names.
    Kinds,
}

#[derive(Parser)]
pub struct VerifyArgs {
    /// Path to the catalog JSON produced by spreadsheet ingestion.
    #[arg(value_name = "CATALOG")]
    pub catalog: PathBuf,

    /// Source name for this pass (e.g. lime-mosul-uat or OCL-MSFOCG-IraqMosul).
    #[arg(long = "source", value_name = "NAME")]
    pub source: String,

    /// OpenMRS REST base URL (e.g. http://env.example.org/openmrs/ws/rest/v1).
    #[arg(long = "base-url", value_name = "URL", conflicts_with = "ocl_url")]
    pub base_url: Option<String>,

    /// OCL collection concepts URL; the lookup searches by external id.
    #[arg(long = "ocl-url", value_name = "URL")]
    pub ocl_url: Option<String>,

    /// Restrict verification to specific kinds (repeatable).
    ///
    /// Defaults to all kinds for an OpenMRS source, and to concepts plus
    /// attribute types for an OCL source (identifier types are not
    /// terminology).
    #[arg(long = "kind", value_enum)]
    pub kinds: Vec<KindArg>,

    /// Maximum lookups in flight at once.
    #[arg(long = "concurrency", default_value_t = 8)]
    pub concurrency: usize,

    /// Per-lookup timeout in seconds; expiry counts the entity as missing.
    #[arg(long = "timeout", value_name = "SECONDS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Write the verification report JSON to this path.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Push per-kind progress payloads to this dashboard endpoint.
    #[arg(long = "dashboard-url", value_name = "URL")]
    pub dashboard_url: Option<String>,

    /// Validation URL advertised in dashboard payloads (defaults to the
    /// source's base URL).
    #[arg(long = "validation-url", value_name = "URL")]
    pub validation_url: Option<String>,
}

#[derive(Parser)]
pub struct MergeArgs {
    /// Report JSON files, merged in argument order.
    #[arg(value_name = "REPORT", required = true, num_args = 1..)]
    pub reports: Vec<PathBuf>,

    /// Write the merged report JSON to this path.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Show "Never checked" separately instead of collapsing it into
    /// "Missing".
    #[arg(long = "distinguish-never-checked")]
    pub distinguish_never_checked: bool,
}

/// CLI entity kind choices.
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Concept,
    Attribute,
    Identifier,
}

impl From<KindArg> for EntityKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Concept => EntityKind::Concept,
            KindArg::Attribute => EntityKind::AttributeType,
            KindArg::Identifier => EntityKind::IdentifierType,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
