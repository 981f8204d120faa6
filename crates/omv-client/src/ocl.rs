//! Query-based existence checks against an OCL collection.
//!
//! OCL's search endpoint returns 200 with a (possibly empty or fuzzy) result
//! list, so a successful status alone proves nothing; the result set must
//! contain an entry whose `external_id` equals the identifier.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use omv_engine::{Lookup, LookupError, LookupOutcome};
use omv_model::ExternalId;

/// One entry of an OCL concept search result; only the matching field is
/// deserialized.
#[derive(Debug, Clone, Deserialize)]
pub struct OclConceptHit {
    #[serde(default)]
    pub external_id: Option<String>,
}

/// True when any search hit carries the exact external id.
pub fn search_matches(hits: &[OclConceptHit], id: &ExternalId) -> bool {
    hits.iter()
        .any(|hit| hit.external_id.as_deref() == Some(id.as_str()))
}

/// Searches a collection's concepts URL
/// (e.g. `https://api.openconceptlab.org/orgs/ORG/collections/NAME/concepts/`)
/// with `?q=<id>` and matches on `external_id`.
#[derive(Debug, Clone)]
pub struct OclLookup {
    client: Client,
    collection_url: String,
}

impl OclLookup {
    pub fn new(client: Client, collection_url: impl Into<String>) -> Self {
        Self {
            client,
            collection_url: collection_url.into(),
        }
    }

    fn url_for(&self, id: &ExternalId) -> String {
        format!("{}?q={}", self.collection_url, id)
    }
}

#[async_trait]
impl Lookup for OclLookup {
    async fn lookup(&self, id: &ExternalId) -> Result<LookupOutcome, LookupError> {
        let url = self.url_for(id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| LookupError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::UnexpectedResponse(format!(
                "search returned status {status}"
            )));
        }

        let hits: Vec<OclConceptHit> = response
            .json()
            .await
            .map_err(|error| LookupError::UnexpectedResponse(error.to_string()))?;
        let matched = search_matches(&hits, id);
        debug!(%url, hits = hits.len(), matched, "ocl search");
        if matched {
            Ok(LookupOutcome::Found)
        } else {
            Ok(LookupOutcome::NotFound)
        }
    }
}
