//! Configuration module for environment variable parsing.
//!
//! All configuration is read once at startup. Required values that are
//! missing fail fast with a [`ConfigError`]; optional values fall back to
//! their defaults with a warning when they cannot be parsed.

use std::env;

use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::event::EventKind;
use crate::queue::TopicConfig;

/// Default Pub/Sub REST endpoint.
pub const DEFAULT_PUBSUB_ENDPOINT: &str = "https://pubsub.googleapis.com";

/// Default request body limit, the Pub/Sub maximum message size.
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Default GCE/Cloud Run metadata server host.
pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("{0} lists no event types")]
    EmptyEventList(&'static str),

    #[error("{var} contains unknown GitHub event type {name:?}")]
    UnknownEvent { var: &'static str, name: String },

    #[error("invalid Pub/Sub endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared secret used to verify `X-Hub-Signature-256`
    pub github_secret: String,

    /// Event types this relay is willing to publish
    pub allowed_events: Vec<EventKind>,

    /// Target Pub/Sub topic
    pub topic: TopicConfig,

    /// Port for the web server to listen on
    pub port: u16,

    /// Map authentication and validation failures to 401/400 instead of 500
    pub strict_status_codes: bool,

    /// Largest webhook body accepted, in bytes
    pub max_body_bytes: usize,

    // =========================================================================
    // Pub/Sub Client Configuration
    // =========================================================================

    /// Base URL of the Pub/Sub REST API
    pub pubsub_endpoint: String,

    /// Set when talking to a local emulator (no authentication)
    pub emulator_host: Option<String>,

    /// Static bearer token, bypasses the metadata server
    pub access_token: Option<String>,

    /// Metadata server host used to mint access tokens
    pub metadata_host: String,

    /// Outbound HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let github_secret = required("GITHUB_SECRET")?;
        let allowed_events = parse_event_list("GITHUB_EVENTS", &required("GITHUB_EVENTS")?)?;

        let topic = TopicConfig {
            topic_name: required("GCP_TOPIC_NAME")?.trim().to_string(),
            project_id: required("GCP_PROJECT_ID")?.trim().to_string(),
            create_topic: parse_flag(lookup("GCP_CREATE_TOPIC")),
        };

        let emulator_host = lookup("PUBSUB_EMULATOR_HOST").filter(|v| !v.trim().is_empty());

        let pubsub_endpoint = match &emulator_host {
            Some(host) => format!("http://{}", host.trim()),
            None => lookup("PUBSUB_ENDPOINT")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PUBSUB_ENDPOINT.to_string()),
        };

        let pubsub_endpoint = pubsub_endpoint.trim().trim_end_matches('/').to_string();
        Url::parse(&pubsub_endpoint).map_err(|source| ConfigError::InvalidEndpoint {
            endpoint: pubsub_endpoint.clone(),
            source,
        })?;

        Ok(Config {
            github_secret,
            allowed_events,
            topic,

            port: parse_or("PORT", lookup("PORT"), 8080),

            strict_status_codes: parse_flag(lookup("STRICT_STATUS_CODES")),

            max_body_bytes: parse_or(
                "MAX_BODY_BYTES",
                lookup("MAX_BODY_BYTES"),
                DEFAULT_MAX_BODY_BYTES,
            ),

            pubsub_endpoint,

            emulator_host,

            access_token: lookup("GCP_ACCESS_TOKEN").filter(|v| !v.trim().is_empty()),

            metadata_host: lookup("GCP_METADATA_HOST")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string()),

            request_timeout_ms: parse_or("REQUEST_TIMEOUT_MS", lookup("REQUEST_TIMEOUT_MS"), 10_000),
        })
    }

    /// Whether `event` is on the configured allow-list.
    pub fn allows(&self, event: EventKind) -> bool {
        self.allowed_events.contains(&event)
    }
}

/// Parse a slash-separated list like "push/pull_request" into event kinds.
fn parse_event_list(name: &'static str, raw: &str) -> Result<Vec<EventKind>, ConfigError> {
    let mut events = Vec::new();

    for part in raw.split('/').map(str::trim).filter(|s| !s.is_empty()) {
        let kind = EventKind::from_name(part).ok_or_else(|| ConfigError::UnknownEvent {
            var: name,
            name: part.to_string(),
        })?;

        if !events.contains(&kind) {
            events.push(kind);
        }
    }

    if events.is_empty() {
        return Err(ConfigError::EmptyEventList(name));
    }

    Ok(events)
}

/// Boolean switches are enabled by "TRUE" in any case.
fn parse_flag(raw: Option<String>) -> bool {
    raw.map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn parse_or<T: std::str::FromStr>(name: &str, raw: Option<String>, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}
