//! Best-effort progress pushes to the status dashboard.

use reqwest::Client;
use tracing::{debug, warn};

use omv_model::{DashboardNotification, EntityKind, Statistics};

/// Posts verification progress payloads to a dashboard endpoint.
///
/// Delivery is fire-and-forget: failures are logged and swallowed so they
/// can never affect verification state.
#[derive(Debug, Clone)]
pub struct DashboardSink {
    client: Client,
    url: String,
}

impl DashboardSink {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Push one notification payload.
    pub async fn push(&self, notification: &DashboardNotification) {
        let result = self.client.post(&self.url).json(notification).send().await;
        match result {
            Ok(response) if response.status().is_success() => {
                debug!(group = %notification.group, "dashboard update delivered");
            }
            Ok(response) => {
                warn!(
                    group = %notification.group,
                    status = %response.status(),
                    "dashboard rejected update"
                );
            }
            Err(error) => {
                warn!(group = %notification.group, error = %error, "dashboard push failed");
            }
        }
    }

    /// Push one payload per entity kind from a pass's statistics.
    pub async fn push_statistics(
        &self,
        system: &str,
        statistics: &Statistics,
        validation_url: &str,
    ) {
        for kind in EntityKind::ALL {
            let bucket = statistics.bucket(kind);
            if bucket.total == 0 {
                continue;
            }
            let notification =
                DashboardNotification::for_bucket(system, kind, bucket, validation_url);
            self.push(&notification).await;
        }
    }
}
