use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use super::provider::{ApiError, DnsApi};
use super::types::{Change, ResourceRecordSetsListResponse};
use crate::auth::TokenProvider;

/// Cloud DNS v1 REST client.
pub struct CloudDnsClient {
    client: Client,
    endpoint: Url,
    tokens: Arc<dyn TokenProvider>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    #[serde(default)]
    reason: Option<String>,
}

impl CloudDnsClient {
    pub fn new(
        client: Client,
        endpoint: &str,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, ApiError> {
        let invalid = |reason: String| ApiError::Endpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        let parsed = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(invalid("not a base URL".to_string()));
        }

        Ok(Self {
            client,
            endpoint: parsed,
            tokens,
        })
    }

    /// `{endpoint}/projects/{project}/managedZones/{zone}/{collection}`
    fn zone_url(
        &self,
        project: &str,
        managed_zone: &str,
        collection: &str,
    ) -> Result<Url, ApiError> {
        let mut url = self.endpoint.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| ApiError::Endpoint {
                endpoint: self.endpoint.to_string(),
                reason: "not a base URL".to_string(),
            })?;
            segments
                .pop_if_empty()
                .extend(["projects", project, "managedZones", managed_zone, collection]);
        }
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let token = self
            .tokens
            .access_token()
            .await
            .map_err(ApiError::Auth)?;

        let response = request.bearer_auth(token).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(google_error(status, &body));
        }

        Ok(response)
    }
}

fn google_error(status: StatusCode, body: &str) -> ApiError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => ApiError::Google {
            code: envelope.error.code.unwrap_or(status.as_u16()),
            message: envelope.error.message,
            reason: envelope
                .error
                .errors
                .into_iter()
                .find_map(|item| item.reason),
        },
        Err(_) => {
            let body = body.trim();
            let message = if body.is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body.to_string()
            };

            ApiError::Google {
                code: status.as_u16(),
                message,
                reason: None,
            }
        }
    }
}

#[async_trait]
impl DnsApi for CloudDnsClient {
    async fn list_record_sets(
        &self,
        project: &str,
        managed_zone: &str,
        page_token: Option<&str>,
    ) -> Result<ResourceRecordSetsListResponse, ApiError> {
        let url = self.zone_url(project, managed_zone, "rrsets")?;
        debug!(%url, page_token, "Listing resource record sets");

        let mut request = self.client.get(url);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let page: ResourceRecordSetsListResponse = self.send(request).await?.json().await?;
        debug!(
            rrsets = page.rrsets.len(),
            next_page = page.next_page().is_some(),
            "Received record set page"
        );

        Ok(page)
    }

    async fn create_change(
        &self,
        project: &str,
        managed_zone: &str,
        change: &Change,
    ) -> Result<Change, ApiError> {
        let url = self.zone_url(project, managed_zone, "changes")?;
        debug!(
            %url,
            additions = change.additions.len(),
            deletions = change.deletions.len(),
            "Creating change"
        );

        let request = self.client.post(url).json(change);
        Ok(self.send(request).await?.json().await?)
    }
}
