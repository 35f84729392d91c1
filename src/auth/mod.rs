//! Application Default Credentials.
//!
//! Credentials are looked up in the same order the Google client libraries
//! use: the file named by `GOOGLE_APPLICATION_CREDENTIALS`, the gcloud
//! well-known file, then the GCE metadata server.

mod authorized_user;
mod metadata;
mod service_account;
mod token;

pub use authorized_user::{AuthorizedUser, AuthorizedUserSecret};
pub use metadata::{MetadataServer, DEFAULT_METADATA_HOST};
pub use service_account::{ServiceAccount, ServiceAccountKey};
pub use token::AccessToken;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

/// Read/write access to Cloud DNS.
pub const CLOUD_DNS_SCOPE: &str = "https://www.googleapis.com/auth/ndev.clouddns.readwrite";

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const WELL_KNOWN_FILE: &str = "application_default_credentials.json";
const ADC_HELP: &str = "https://cloud.google.com/docs/authentication/external/set-up-adc";

#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// A bearer token valid for at least the next few seconds.
    async fn access_token(&self) -> Result<String>;

    /// The credential type, as named in credential files.
    fn credential_type(&self) -> &'static str;
}

/// The parts of the process environment credential discovery looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialsEnv {
    /// `GOOGLE_APPLICATION_CREDENTIALS`
    pub credentials_file: Option<PathBuf>,
    /// Directory holding the gcloud well-known file.
    pub gcloud_config_dir: Option<PathBuf>,
    /// `GCE_METADATA_HOST`, or the link-local default.
    pub metadata_host: String,
}

impl CredentialsEnv {
    pub fn from_process() -> Self {
        Self {
            credentials_file: env::var_os("GOOGLE_APPLICATION_CREDENTIALS")
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            gcloud_config_dir: gcloud_config_dir(),
            metadata_host: env::var("GCE_METADATA_HOST")
                .ok()
                .filter(|host| !host.is_empty())
                .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string()),
        }
    }

    fn well_known_file(&self) -> Option<PathBuf> {
        self.gcloud_config_dir
            .as_ref()
            .map(|dir| dir.join(WELL_KNOWN_FILE))
    }
}

fn gcloud_config_dir() -> Option<PathBuf> {
    if let Some(dir) = env::var_os("CLOUDSDK_CONFIG").filter(|dir| !dir.is_empty()) {
        return Some(PathBuf::from(dir));
    }

    #[cfg(windows)]
    {
        env::var_os("APPDATA").map(|appdata| PathBuf::from(appdata).join("gcloud"))
    }
    #[cfg(not(windows))]
    {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config").join("gcloud"))
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CredentialsFile {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUserSecret),
}

/// Finds default credentials for `scope`, without fetching a token yet.
pub async fn find_default_credentials(
    http: &Client,
    env: &CredentialsEnv,
    scope: &str,
) -> Result<Arc<dyn TokenProvider>> {
    if let Some(path) = &env.credentials_file {
        return load_credentials_file(http, path, scope)
            .context("google: error getting credentials using GOOGLE_APPLICATION_CREDENTIALS");
    }

    if let Some(path) = env.well_known_file().filter(|path| path.exists()) {
        return load_credentials_file(http, &path, scope).with_context(|| {
            format!(
                "google: error getting credentials using well-known file ({})",
                path.display()
            )
        });
    }

    if metadata::on_gce(http, &env.metadata_host).await {
        info!(host = %env.metadata_host, "Using metadata server credentials");
        return Ok(Arc::new(MetadataServer::new(
            http.clone(),
            &env.metadata_host,
            scope,
        )));
    }

    Err(anyhow!(
        "google: could not find default credentials. See {} for more information",
        ADC_HELP
    ))
}

fn load_credentials_file(
    http: &Client,
    path: &Path,
    scope: &str,
) -> Result<Arc<dyn TokenProvider>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read credentials file: {}", path.display()))?;

    let file: CredentialsFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse credentials file: {}", path.display()))?;

    let provider: Arc<dyn TokenProvider> = match file {
        CredentialsFile::ServiceAccount(key) => {
            Arc::new(ServiceAccount::new(http.clone(), key, scope)?)
        }
        CredentialsFile::AuthorizedUser(secret) => {
            Arc::new(AuthorizedUser::new(http.clone(), secret))
        }
    };

    debug!(
        path = %path.display(),
        credential_type = provider.credential_type(),
        "Loaded credentials file"
    );

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const AUTHORIZED_USER: &str = r#"{
        "type": "authorized_user",
        "client_id": "client-id.apps.googleusercontent.com",
        "client_secret": "client-secret",
        "refresh_token": "1//refresh",
        "quota_project_id": "my-project"
    }"#;

    async fn not_gce() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        server
    }

    fn env_with(server: &MockServer) -> CredentialsEnv {
        CredentialsEnv {
            credentials_file: None,
            gcloud_config_dir: None,
            metadata_host: server.uri().trim_start_matches("http://").to_string(),
        }
    }

    #[tokio::test]
    async fn test_explicit_file_wins() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("creds.json");
        fs::write(&file, AUTHORIZED_USER).unwrap();

        let server = not_gce().await;
        let env = CredentialsEnv {
            credentials_file: Some(file),
            ..env_with(&server)
        };

        let provider = find_default_credentials(&Client::new(), &env, CLOUD_DNS_SCOPE)
            .await
            .unwrap();
        assert_eq!(provider.credential_type(), "authorized_user");
    }

    #[tokio::test]
    async fn test_missing_explicit_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(WELL_KNOWN_FILE), AUTHORIZED_USER).unwrap();

        let server = not_gce().await;
        let env = CredentialsEnv {
            credentials_file: Some(dir.path().join("missing.json")),
            gcloud_config_dir: Some(dir.path().to_path_buf()),
            ..env_with(&server)
        };

        let err = find_default_credentials(&Client::new(), &env, CLOUD_DNS_SCOPE)
            .await
            .err()
            .expect("missing file should fail");
        let message = format!("{:#}", err);
        assert!(message.contains("GOOGLE_APPLICATION_CREDENTIALS"), "{}", message);
        assert!(message.contains("missing.json"), "{}", message);
    }

    #[tokio::test]
    async fn test_well_known_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(WELL_KNOWN_FILE), AUTHORIZED_USER).unwrap();

        let server = not_gce().await;
        let env = CredentialsEnv {
            gcloud_config_dir: Some(dir.path().to_path_buf()),
            ..env_with(&server)
        };

        let provider = find_default_credentials(&Client::new(), &env, CLOUD_DNS_SCOPE)
            .await
            .unwrap();
        assert_eq!(provider.credential_type(), "authorized_user");
    }

    #[tokio::test]
    async fn test_unsupported_credential_type() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("creds.json");
        fs::write(&file, r#"{"type": "external_account", "audience": "x"}"#).unwrap();

        let server = not_gce().await;
        let env = CredentialsEnv {
            credentials_file: Some(file),
            ..env_with(&server)
        };

        let err = find_default_credentials(&Client::new(), &env, CLOUD_DNS_SCOPE)
            .await
            .err()
            .expect("external_account is not supported");
        assert!(format!("{:#}", err).contains("external_account"));
    }

    #[tokio::test]
    async fn test_falls_back_to_metadata_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).insert_header("Metadata-Flavor", "Google"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let env = CredentialsEnv {
            gcloud_config_dir: Some(dir.path().to_path_buf()),
            ..env_with(&server)
        };

        let provider = find_default_credentials(&Client::new(), &env, CLOUD_DNS_SCOPE)
            .await
            .unwrap();
        assert_eq!(provider.credential_type(), "compute_metadata");
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let server = not_gce().await;

        let err = find_default_credentials(&Client::new(), &env_with(&server), CLOUD_DNS_SCOPE)
            .await
            .err()
            .expect("no credentials available");
        assert!(err.to_string().contains("could not find default credentials"));
    }
}
