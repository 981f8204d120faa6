//! Shared data model for OpenMRS metadata verification.
//!
//! Entities, catalogs, per-source statuses, statistics counters, and the
//! report shapes exchanged between verification passes and the merger.

pub mod entity;
pub mod error;
pub mod ids;
pub mod report;
pub mod stats;

pub use entity::{Catalog, CatalogInput, CatalogMember, Entity, EntityKind, Status};
pub use error::ModelError;
pub use ids::{ExternalId, FormName, SourceName};
pub use report::{
    DashboardMeta, DashboardNotification, DashboardStats, LookupFailure, MergedRecord,
    MergedReport, MergedStatus, Report, ReportEntry, ReportMeta, SourceMergeStats, pseudo_form,
};
pub use stats::{StatBucket, Statistics};
