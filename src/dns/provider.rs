use async_trait::async_trait;
use thiserror::Error;

use super::types::{Change, ResourceRecordSetsListResponse};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Error body returned by a Google API.
    #[error("Error {code}: {message}{}", reason_suffix(.reason))]
    Google {
        code: u16,
        message: String,
        reason: Option<String>,
    },

    #[error("failed to obtain access token: {0:#}")]
    Auth(#[source] anyhow::Error),

    #[error("invalid API endpoint {endpoint}: {reason}")]
    Endpoint { endpoint: String, reason: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason.as_deref().map(|r| format!(", {r}")).unwrap_or_default()
}

/// The two Cloud DNS calls an update needs.
#[async_trait]
pub trait DnsApi: Send + Sync {
    /// Fetch one page of record sets; `page_token` is `None` for the first.
    async fn list_record_sets(
        &self,
        project: &str,
        managed_zone: &str,
        page_token: Option<&str>,
    ) -> Result<ResourceRecordSetsListResponse, ApiError>;

    /// Submit a change and return the change as accepted by the API.
    async fn create_change(
        &self,
        project: &str,
        managed_zone: &str,
        change: &Change,
    ) -> Result<Change, ApiError>;
}
