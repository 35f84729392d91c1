use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use reqwest::Client;
use ring::rand::SystemRandom;
use ring::signature::{RsaKeyPair, RSA_PKCS1_SHA256};
use serde::{Deserialize, Serialize};

use super::token::{exchange, TokenCache};
use super::{TokenProvider, DEFAULT_TOKEN_URI};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;

/// The `service_account` key file downloaded from the Cloud console.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

#[derive(Debug, Serialize)]
struct JwtHeader<'a> {
    alg: &'static str,
    typ: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kid: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

/// Exchanges a signed JWT assertion for an access token.
pub struct ServiceAccount {
    http: Client,
    client_email: String,
    key_id: Option<String>,
    token_uri: String,
    scope: String,
    key_pair: RsaKeyPair,
    cache: TokenCache,
}

impl ServiceAccount {
    pub fn new(http: Client, key: ServiceAccountKey, scope: &str) -> Result<Self> {
        let der = rustls_pemfile::pkcs8_private_keys(&mut key.private_key.as_bytes())
            .next()
            .ok_or_else(|| anyhow!("No PKCS#8 private key found in service account key"))?
            .context("Failed to decode service account private key")?;

        let key_pair = RsaKeyPair::from_pkcs8(der.secret_pkcs8_der())
            .map_err(|e| anyhow!("Invalid service account private key: {}", e))?;

        Ok(Self {
            http,
            client_email: key.client_email,
            key_id: key.private_key_id,
            token_uri: key
                .token_uri
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            scope: scope.to_string(),
            key_pair,
            cache: TokenCache::default(),
        })
    }

    fn signing_input(&self, issued_at: u64) -> Result<String> {
        let header = JwtHeader {
            alg: "RS256",
            typ: "JWT",
            kid: self.key_id.as_deref(),
        };
        let claims = JwtClaims {
            iss: &self.client_email,
            scope: &self.scope,
            aud: &self.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };

        Ok(format!(
            "{}.{}",
            encode_segment(&header)?,
            encode_segment(&claims)?
        ))
    }

    fn assertion(&self) -> Result<String> {
        let issued_at = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let signing_input = self.signing_input(issued_at)?;

        let mut signature = vec![0; self.key_pair.public().modulus_len()];
        self.key_pair
            .sign(
                &RSA_PKCS1_SHA256,
                &SystemRandom::new(),
                signing_input.as_bytes(),
                &mut signature,
            )
            .map_err(|_| anyhow!("Failed to sign JWT assertion"))?;

        Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value).context("Failed to serialize JWT segment")?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

#[async_trait]
impl TokenProvider for ServiceAccount {
    async fn access_token(&self) -> Result<String> {
        self.cache
            .get_or_fetch(|| async {
                let assertion = self.assertion()?;
                exchange(
                    &self.http,
                    &self.token_uri,
                    &[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())],
                )
                .await
            })
            .await
    }

    fn credential_type(&self) -> &'static str {
        "service_account"
    }
}
