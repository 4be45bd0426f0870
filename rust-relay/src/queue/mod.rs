//! Queue module for Pub/Sub operations.
//!
//! This module provides:
//! - Message types for the relayed envelope and the Pub/Sub REST API
//! - The publisher capability and its Pub/Sub implementation
//! - Access-token sources for authenticating publishes
//!
//! ## Architecture
//!
//! ```text
//! Web Server → WebhookEnvelope → Publisher → Pub/Sub topic
//! ```

pub mod auth;
pub mod publisher;
pub mod types;

pub use auth::{TokenError, TokenSource};
pub use publisher::{PubSubPublisher, PublishError, Publisher};
pub use types::{OutboundMessage, TopicConfig, WebhookEnvelope, ATTR_DELIVERY_ID, ATTR_EVENT_TYPE};
