//! Message types for the Pub/Sub relay.
//!
//! This module defines:
//! - the envelope published for every accepted webhook
//! - the topic addressing passed to a [`Publisher`](super::Publisher)
//! - the Pub/Sub REST request and response bodies

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::EventKind;

/// Message attribute carrying the GitHub event type.
pub const ATTR_EVENT_TYPE: &str = "event_type";

/// Message attribute carrying the `X-GitHub-Delivery` GUID.
pub const ATTR_DELIVERY_ID: &str = "delivery_id";

// =============================================================================
// Relay Types
// =============================================================================

/// The message republished for every accepted webhook.
///
/// Serializes as `{"event_type":"push","payload":{...}}`.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookEnvelope {
    /// Verified `X-GitHub-Event` value
    pub event_type: EventKind,
    /// The webhook body as received
    pub payload: Value,
}

impl WebhookEnvelope {
    pub fn new(event_type: EventKind, payload: Value) -> Self {
        Self { event_type, payload }
    }

    /// Encode the envelope as JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Where a message should be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicConfig {
    /// Topic id within the project
    pub topic_name: String,
    /// Owning GCP project id
    pub project_id: String,
    /// Create the topic on first publish if it does not exist
    pub create_topic: bool,
}

impl TopicConfig {
    /// Full resource name, `projects/{project}/topics/{topic}`.
    pub fn topic_path(&self) -> String {
        format!("projects/{}/topics/{}", self.project_id, self.topic_name)
    }
}

/// Bytes and attributes handed to a publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub data: Vec<u8>,
    pub attributes: BTreeMap<String, String>,
}

impl OutboundMessage {
    /// Build the message for an encoded envelope.
    pub fn new(event_type: EventKind, data: Vec<u8>, delivery_id: Option<&str>) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(ATTR_EVENT_TYPE.to_string(), event_type.as_str().to_string());
        if let Some(id) = delivery_id {
            attributes.insert(ATTR_DELIVERY_ID.to_string(), id.to_string());
        }
        Self { data, attributes }
    }
}

// =============================================================================
// Pub/Sub REST Types
// =============================================================================

/// Body of `POST /v1/{topic}:publish`.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublishRequest {
    pub messages: Vec<PubsubMessage>,
}

/// A single Pub/Sub message; `data` is standard base64.
#[derive(Debug, Serialize, Deserialize)]
pub struct PubsubMessage {
    pub data: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// Response of `POST /v1/{topic}:publish`.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublishResponse {
    #[serde(rename = "messageIds", default)]
    pub message_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_serialization() {
        let envelope = WebhookEnvelope::new(EventKind::Push, json!({"ref": "refs/heads/main"}));

        let bytes = envelope.to_bytes().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"event_type":"push","payload":{"ref":"refs/heads/main"}}"#
        );
    }

    #[test]
    fn test_topic_path() {
        let topic = TopicConfig {
            topic_name: "github-events".to_string(),
            project_id: "my-project".to_string(),
            create_topic: false,
        };
        assert_eq!(topic.topic_path(), "projects/my-project/topics/github-events");
    }

    #[test]
    fn test_outbound_message_attributes() {
        let msg = OutboundMessage::new(EventKind::Issues, b"{}".to_vec(), Some("abc-123"));
        assert_eq!(msg.attributes.get(ATTR_EVENT_TYPE).map(String::as_str), Some("issues"));
        assert_eq!(msg.attributes.get(ATTR_DELIVERY_ID).map(String::as_str), Some("abc-123"));

        let msg = OutboundMessage::new(EventKind::Issues, b"{}".to_vec(), None);
        assert!(!msg.attributes.contains_key(ATTR_DELIVERY_ID));
    }

    #[test]
    fn test_publish_response_wire_format() {
        let resp: PublishResponse = serde_json::from_str(r#"{"messageIds":["42"]}"#).unwrap();
        assert_eq!(resp.message_ids, vec!["42".to_string()]);

        let empty: PublishResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.message_ids.is_empty());
    }
}
