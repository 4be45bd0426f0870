//! Webhook endpoint handlers.
//!
//! The relay handler runs one linear pipeline per request:
//! 1. Verify the HMAC signature over the raw body
//! 2. Check the event type against the allow-list
//! 3. Parse the body for that event
//! 4. Wrap it in a [`WebhookEnvelope`] and publish it
//!
//! Any failure short-circuits into an error response; nothing is published
//! unless every earlier step succeeded.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{error, info, warn};

use crate::event::{parse_payload, EventKind};
use crate::queue::{OutboundMessage, Publisher, WebhookEnvelope};
use crate::web::error::{RelayError, ValidationError};
use crate::web::signature::{verify_github_signature, SIGNATURE_HEADER};
use crate::Config;

/// Header naming the GitHub event type.
pub const EVENT_HEADER: &str = "x-github-event";

/// Header carrying the GitHub delivery GUID.
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub publisher: Arc<dyn Publisher>,
}

impl AppState {
    pub fn new(config: Config, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            config: Arc::new(config),
            publisher,
        }
    }
}

// =============================================================================
// GitHub Webhook
// =============================================================================

/// GitHub webhook endpoint.
///
/// Responds `200 {}` once the envelope has been accepted by the publisher.
/// On failure the body is the error description; the status is 500 unless
/// strict status codes are configured.
pub async fn github_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let delivery_id = header_value(&headers, DELIVERY_HEADER).unwrap_or("unknown");

    info!(
        delivery_id = %delivery_id,
        event_type = header_value(&headers, EVENT_HEADER).unwrap_or(""),
        body_length = body.len(),
        has_signature = headers.contains_key(SIGNATURE_HEADER),
        "github_webhook_received"
    );

    match relay(&state, &headers, &body).await {
        Ok(()) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            "{}",
        )
            .into_response(),
        Err(e) => {
            match &e {
                RelayError::Authentication(_) | RelayError::Validation(_) => {
                    warn!(delivery_id = %delivery_id, error = %e, "github_webhook_rejected")
                }
                RelayError::Serialization(_) | RelayError::Publish(_) => {
                    error!(delivery_id = %delivery_id, error = %e, "github_webhook_failed")
                }
            }
            e.into_response_with(state.config.strict_status_codes)
        }
    }
}

async fn relay(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<(), RelayError> {
    let config = &state.config;

    verify_github_signature(
        &config.github_secret,
        body,
        header_value(headers, SIGNATURE_HEADER),
    )?;

    let claimed = header_value(headers, EVENT_HEADER).ok_or(ValidationError::MissingEvent)?;
    let event = EventKind::from_name(claimed)
        .filter(|kind| config.allows(*kind))
        .ok_or_else(|| ValidationError::EventNotAllowed(claimed.to_string()))?;

    let parsed = parse_payload(event, body).map_err(ValidationError::from)?;
    let delivery_id = header_value(headers, DELIVERY_HEADER);

    info!(
        delivery_id = delivery_id.unwrap_or("unknown"),
        event_type = %event,
        summary = parsed.summary.as_deref().unwrap_or(""),
        "github_webhook_verified"
    );

    let data = WebhookEnvelope::new(event, parsed.body).to_bytes()?;
    let notification = String::from_utf8_lossy(&data).into_owned();

    let message_id = state
        .publisher
        .publish(&config.topic, OutboundMessage::new(event, data, delivery_id))
        .await?;

    info!(
        message_id = %message_id,
        notification = %notification,
        "github_webhook_published"
    );

    Ok(())
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
