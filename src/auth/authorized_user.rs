use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::token::{exchange, TokenCache};
use super::{TokenProvider, DEFAULT_TOKEN_URI};

/// The `authorized_user` file written by `gcloud auth application-default login`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizedUserSecret {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

pub struct AuthorizedUser {
    http: Client,
    secret: AuthorizedUserSecret,
    token_uri: String,
    cache: TokenCache,
}

impl AuthorizedUser {
    pub fn new(http: Client, secret: AuthorizedUserSecret) -> Self {
        let token_uri = secret
            .token_uri
            .clone()
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());

        Self {
            http,
            secret,
            token_uri,
            cache: TokenCache::default(),
        }
    }
}

#[async_trait]
impl TokenProvider for AuthorizedUser {
    async fn access_token(&self) -> Result<String> {
        self.cache
            .get_or_fetch(|| async {
                exchange(
                    &self.http,
                    &self.token_uri,
                    &[
                        ("grant_type", "refresh_token"),
                        ("client_id", self.secret.client_id.as_str()),
                        ("client_secret", self.secret.client_secret.as_str()),
                        ("refresh_token", self.secret.refresh_token.as_str()),
                    ],
                )
                .await
            })
            .await
    }

    fn credential_type(&self) -> &'static str {
        "authorized_user"
    }
}
