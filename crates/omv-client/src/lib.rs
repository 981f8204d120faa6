//! Concrete lookup capabilities and the dashboard notification sink.
//!
//! Two remote-system flavors: direct REST GETs against OpenMRS deployments
//! and query-based searches against an OCL collection. Both implement the
//! engine's [`omv_engine::Lookup`] trait; the engine never sees HTTP.

pub mod dashboard;
pub mod ocl;
pub mod openmrs;

use std::time::Duration;

use thiserror::Error;

pub use dashboard::DashboardSink;
pub use ocl::{OclConceptHit, OclLookup, search_matches};
pub use openmrs::OpenMrsLookup;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build http client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Shared HTTP client with connect and request ceilings applied.
///
/// The per-lookup verification timeout is enforced by the engine; this is a
/// transport-level backstop.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ClientError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    Ok(client)
}
