use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::token::{AccessToken, TokenCache, TokenResponse};
use super::TokenProvider;

pub const DEFAULT_METADATA_HOST: &str = "169.254.169.254";

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const FLAVOR_HEADER: &str = "Metadata-Flavor";
const FLAVOR: &str = "Google";

/// True when `host` answers like a GCE metadata server.
pub async fn on_gce(http: &Client, host: &str) -> bool {
    let response = http
        .get(format!("http://{}/", host))
        .timeout(PROBE_TIMEOUT)
        .send()
        .await;

    match response {
        Ok(response) => response
            .headers()
            .get(FLAVOR_HEADER)
            .is_some_and(|flavor| flavor == FLAVOR),
        Err(e) => {
            debug!(host, error = %e, "Metadata server probe failed");
            false
        }
    }
}

/// Tokens for the instance's default service account.
pub struct MetadataServer {
    http: Client,
    token_url: String,
    scope: String,
    cache: TokenCache,
}

impl MetadataServer {
    pub fn new(http: Client, host: &str, scope: &str) -> Self {
        Self {
            http,
            token_url: format!(
                "http://{}/computeMetadata/v1/instance/service-accounts/default/token",
                host
            ),
            scope: scope.to_string(),
            cache: TokenCache::default(),
        }
    }

    async fn fetch(&self) -> Result<AccessToken> {
        let response = self
            .http
            .get(&self.token_url)
            .query(&[("scopes", self.scope.as_str())])
            .header(FLAVOR_HEADER, FLAVOR)
            .send()
            .await
            .context("Failed to query metadata server")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Metadata server token request failed ({}): {}",
                status,
                body.trim()
            ));
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse metadata server token")?;

        Ok(token.into())
    }
}

#[async_trait]
impl TokenProvider for MetadataServer {
    async fn access_token(&self) -> Result<String> {
        self.cache.get_or_fetch(|| self.fetch()).await
    }

    fn credential_type(&self) -> &'static str {
        "compute_metadata"
    }
}
