//! Access tokens for the Pub/Sub REST API.
//!
//! Tokens come from one of three places:
//! - nowhere, when talking to the local emulator
//! - a static `GCP_ACCESS_TOKEN`
//! - the GCE/Cloud Run metadata server, cached until shortly before expiry

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::Config;

/// Refresh metadata tokens this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Error fetching an access token.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("metadata server request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("metadata server returned {0}")]
    Status(reqwest::StatusCode),
}

/// Where bearer tokens for outbound calls come from.
pub enum TokenSource {
    /// No authentication (emulator)
    Anonymous,
    /// Fixed token supplied by configuration
    Static(String),
    /// Tokens minted by the metadata server
    Metadata {
        url: String,
        cached: RwLock<Option<CachedToken>>,
    },
}

pub struct CachedToken {
    token: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: u64,
}

impl TokenSource {
    /// Pick the token source implied by the configuration.
    pub fn from_config(config: &Config) -> Self {
        if config.emulator_host.is_some() {
            return TokenSource::Anonymous;
        }
        if let Some(token) = &config.access_token {
            return TokenSource::Static(token.clone());
        }
        TokenSource::metadata(&config.metadata_host)
    }

    /// Token source backed by the metadata server at `host`.
    pub fn metadata(host: &str) -> Self {
        TokenSource::Metadata {
            url: format!(
                "http://{}/computeMetadata/v1/instance/service-accounts/default/token",
                host
            ),
            cached: RwLock::new(None),
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenSource::Anonymous => "anonymous",
            TokenSource::Static(_) => "static",
            TokenSource::Metadata { .. } => "metadata",
        }
    }

    /// Current bearer token, if this source uses one.
    pub async fn token(&self, client: &Client) -> Result<Option<String>, TokenError> {
        match self {
            TokenSource::Anonymous => Ok(None),
            TokenSource::Static(token) => Ok(Some(token.clone())),
            TokenSource::Metadata { url, cached } => {
                {
                    let cached = cached.read().await;
                    if let Some(t) = cached.as_ref() {
                        if Instant::now() < t.expires_at {
                            return Ok(Some(t.token.clone()));
                        }
                    }
                }

                let mut cached = cached.write().await;

                // Double-check after acquiring write lock
                if let Some(t) = cached.as_ref() {
                    if Instant::now() < t.expires_at {
                        return Ok(Some(t.token.clone()));
                    }
                }

                let resp = client
                    .get(url.as_str())
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await?;

                if !resp.status().is_success() {
                    warn!(status_code = resp.status().as_u16(), "metadata_token_failed");
                    return Err(TokenError::Status(resp.status()));
                }

                let minted: MetadataToken = resp.json().await?;
                let lifetime = Duration::from_secs(minted.expires_in).saturating_sub(EXPIRY_MARGIN);

                info!(expires_in = minted.expires_in, "metadata_token_refreshed");

                *cached = Some(CachedToken {
                    token: minted.access_token.clone(),
                    expires_at: Instant::now() + lifetime,
                });

                Ok(Some(minted.access_token))
            }
        }
    }
}
