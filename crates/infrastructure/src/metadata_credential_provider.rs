use std::time::{Duration, Instant};

use async_trait::async_trait;
use grantwatch_application::CredentialProvider;
use grantwatch_core::{AppError, AppResult, BearerToken};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::google_api::{api_url, status_error, transport_error};

/// Default metadata server address.
pub const DEFAULT_METADATA_BASE_URL: &str = "http://metadata.google.internal";

const TOKEN_PATH: &str = "computeMetadata/v1/instance/service-accounts/default/token";
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Ambient credentials from the compute metadata server.
///
/// Tokens are reused until shortly before they expire.
pub struct MetadataCredentialProvider {
    http_client: reqwest::Client,
    base_url: String,
    cached: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    token: BearerToken,
    refresh_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

impl MetadataCredentialProvider {
    /// Creates a provider against the default metadata server.
    #[must_use]
    pub fn new(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url: DEFAULT_METADATA_BASE_URL.to_owned(),
            cached: Mutex::new(None),
        }
    }

    /// Overrides the metadata server address.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch(&self) -> AppResult<CachedToken> {
        let operation = "metadata token fetch";
        let response = self
            .http_client
            .get(api_url(&self.base_url, TOKEN_PATH)?)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|error| transport_error(&error, operation))?;
        if !response.status().is_success() {
            return Err(status_error(response, operation).await);
        }

        let body = response.json::<TokenResponse>().await.map_err(|error| {
            AppError::Upstream(format!("{operation} returned an unreadable body: {error}"))
        })?;
        let lifetime = Duration::from_secs(body.expires_in).saturating_sub(REFRESH_MARGIN);
        debug!(expires_in = body.expires_in, "fetched ambient access token");

        Ok(CachedToken {
            token: BearerToken::new(body.access_token).map_err(|_| {
                AppError::Upstream(format!("{operation} returned an empty access token"))
            })?,
            refresh_at: Instant::now() + lifetime,
        })
    }
}

#[async_trait]
impl CredentialProvider for MetadataCredentialProvider {
    async fn ambient_token(&self) -> AppResult<BearerToken> {
        let mut cached = self.cached.lock().await;
        if let Some(entry) = cached.as_ref()
            && Instant::now() < entry.refresh_at
        {
            return Ok(entry.token.clone());
        }

        let entry = self.fetch().await?;
        let token = entry.token.clone();
        *cached = Some(entry);
        Ok(token)
    }
}
