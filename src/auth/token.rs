use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

/// Tokens this close to expiry are treated as already expired.
const EXPIRY_SKEW: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub secret: String,
    expires_at: Option<Instant>,
}

impl AccessToken {
    pub fn new(secret: &str, expires_in: Option<Duration>) -> Self {
        Self {
            secret: secret.to_string(),
            expires_at: expires_in.map(|lifetime| Instant::now() + lifetime),
        }
    }

    fn is_fresh(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Instant::now() + EXPIRY_SKEW < expires_at,
            None => true,
        }
    }
}

/// Body of a successful OAuth2 token response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl From<TokenResponse> for AccessToken {
    fn from(response: TokenResponse) -> Self {
        AccessToken::new(
            &response.access_token,
            response.expires_in.map(Duration::from_secs),
        )
    }
}

/// Holds the last token so one run performs a single exchange.
#[derive(Debug, Default)]
pub(crate) struct TokenCache {
    slot: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessToken>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(token) = slot.as_ref().filter(|token| token.is_fresh()) {
            return Ok(token.secret.clone());
        }

        let token = fetch().await?;
        let secret = token.secret.clone();
        *slot = Some(token);

        Ok(secret)
    }
}

/// POSTs a form-encoded grant to an OAuth2 token endpoint.
pub(crate) async fn exchange(
    http: &Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> Result<AccessToken> {
    debug!(token_uri, "Requesting access token");

    let response = http
        .post(token_uri)
        .form(form)
        .send()
        .await
        .with_context(|| format!("Failed to send token request to {}", token_uri))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!(
            "oauth2: cannot fetch token ({}): {}",
            status,
            body.trim()
        ));
    }

    let token: TokenResponse = response
        .json()
        .await
        .context("Failed to parse token response")?;

    Ok(token.into())
}
