//! Direct REST existence checks against one OpenMRS deployment.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use tracing::debug;

use omv_engine::{Lookup, LookupError, LookupOutcome};
use omv_model::{EntityKind, ExternalId};

/// Looks up one entity kind by UUID under a deployment's REST base URL
/// (e.g. `http://env1.example.org/openmrs/ws/rest/v1`).
///
/// Any 2xx means the entity exists; any other status is a confirmed
/// not-found. Transport failures surface as [`LookupError::Transport`] and
/// are folded into the missing count by the engine.
#[derive(Debug, Clone)]
pub struct OpenMrsLookup {
    client: Client,
    base_url: String,
    kind: EntityKind,
}

impl OpenMrsLookup {
    pub fn new(client: Client, base_url: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            kind,
        }
    }

    fn url_for(&self, id: &ExternalId) -> String {
        format!("{}/{}/{}", self.base_url, self.kind.rest_segment(), id)
    }
}

#[async_trait]
impl Lookup for OpenMrsLookup {
    async fn lookup(&self, id: &ExternalId) -> Result<LookupOutcome, LookupError> {
        let url = self.url_for(id);
        let response = self
            .client
            .get(&url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|error| LookupError::Transport(error.to_string()))?;

        let status = response.status();
        debug!(%url, status = %status, "openmrs lookup");
        if status.is_success() {
            Ok(LookupOutcome::Found)
        } else {
            Ok(LookupOutcome::NotFound)
        }
    }
}
