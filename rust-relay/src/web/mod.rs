//! Web server module for relaying GitHub webhooks.
//!
//! This module provides a single-endpoint web server that:
//! - Receives GitHub webhook deliveries on `POST /`
//! - Verifies the HMAC signature and the event type
//! - Publishes the wrapped payload to Pub/Sub before responding

pub mod error;
pub mod handlers;
pub mod signature;

use axum::{extract::DefaultBodyLimit, routing::post, Router};
use tower_http::trace::TraceLayer;

pub use error::{RelayError, ValidationError};
pub use handlers::{github_webhook, AppState};
pub use signature::{verify_github_signature, SignatureError};

/// Build the application router.
///
/// GitHub deliveries can exceed axum's 2 MB default, so the body limit
/// comes from configuration.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/", post(github_webhook))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
