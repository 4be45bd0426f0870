//! github2pubsub - GitHub webhook to Google Cloud Pub/Sub relay.
//!
//! Every accepted delivery is wrapped in a [`WebhookEnvelope`] and published
//! to a single Pub/Sub topic before the webhook is answered.
//!
//! ## Architecture
//!
//! ```text
//! GitHub → POST / → signature + allow-list check → WebhookEnvelope → Pub/Sub topic
//! ```

pub mod config;
pub mod event;
pub mod queue;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use event::EventKind;
pub use queue::{PubSubPublisher, PublishError, Publisher, TopicConfig, WebhookEnvelope};
pub use web::{router, AppState};
