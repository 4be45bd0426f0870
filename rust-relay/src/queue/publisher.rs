//! Pub/Sub publisher.
//!
//! [`Publisher`] is the capability the webhook handler publishes through;
//! [`PubSubPublisher`] implements it over the Pub/Sub REST API and can be
//! shared across concurrent requests.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::auth::{TokenError, TokenSource};
use super::types::{OutboundMessage, PublishRequest, PublishResponse, PubsubMessage, TopicConfig};
use crate::Config;

/// Errors from the messaging backend.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("pubsub request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("pubsub authentication failed: {0}")]
    Auth(#[from] TokenError),

    #[error("pubsub topic not found: {0}")]
    TopicNotFound(String),

    #[error("pubsub returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("pubsub returned no message id")]
    EmptyResponse,
}

/// Something that can deliver a message to a topic.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one message and return the id the backend assigned to it.
    async fn publish(
        &self,
        topic: &TopicConfig,
        message: OutboundMessage,
    ) -> Result<String, PublishError>;
}

/// Publisher backed by the Pub/Sub REST API.
pub struct PubSubPublisher {
    client: Client,
    endpoint: String,
    tokens: TokenSource,
    ensured_topics: RwLock<HashSet<String>>,
}

impl PubSubPublisher {
    /// Create a publisher for the given REST endpoint.
    pub fn new(client: Client, endpoint: impl Into<String>, tokens: TokenSource) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            tokens,
            ensured_topics: RwLock::new(HashSet::new()),
        }
    }

    /// Create a publisher from application configuration.
    pub fn from_config(config: &Config) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        let tokens = TokenSource::from_config(config);

        info!(
            endpoint = %config.pubsub_endpoint,
            token_source = tokens.kind(),
            "pubsub_publisher_created"
        );

        Ok(Self::new(client, config.pubsub_endpoint.clone(), tokens))
    }

    fn url(&self, topic_path: &str, suffix: &str) -> String {
        format!("{}/v1/{}{}", self.endpoint, topic_path, suffix)
    }

    async fn authorized(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, PublishError> {
        Ok(match self.tokens.token(&self.client).await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    /// Create the topic unless this process already has; an existing topic
    /// is fine. The PUT runs without the cache lock held.
    async fn ensure_topic(&self, topic: &TopicConfig) -> Result<(), PublishError> {
        let topic_path = topic.topic_path();

        if self.ensured_topics.read().await.contains(&topic_path) {
            return Ok(());
        }

        info!(topic = %topic_path, "pubsub_topic_creating");

        let request = self
            .client
            .put(self.url(&topic_path, ""))
            .json(&serde_json::json!({}));
        let resp = self.authorized(request).await?.send().await?;

        match resp.status() {
            s if s.is_success() => info!(topic = %topic_path, "pubsub_topic_created"),
            StatusCode::CONFLICT => info!(topic = %topic_path, "pubsub_topic_exists"),
            status => {
                let body = resp.text().await.unwrap_or_default();
                warn!(
                    topic = %topic_path,
                    status_code = status.as_u16(),
                    "pubsub_topic_create_failed"
                );
                return Err(PublishError::Status { status, body });
            }
        }

        self.ensured_topics.write().await.insert(topic_path);
        Ok(())
    }

    /// Forget that a topic was ensured, so the next publish creates it again.
    async fn forget_topic(&self, topic_path: &str) {
        self.ensured_topics.write().await.remove(topic_path);
    }

    async fn send_publish(
        &self,
        topic_path: &str,
        body: &PublishRequest,
    ) -> Result<String, PublishError> {
        let request = self.client.post(self.url(topic_path, ":publish")).json(body);
        let resp = self.authorized(request).await?.send().await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PublishError::TopicNotFound(topic_path.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PublishError::Status { status, body });
        }

        let published: PublishResponse = resp.json().await?;
        published
            .message_ids
            .into_iter()
            .next()
            .ok_or(PublishError::EmptyResponse)
    }
}

#[async_trait]
impl Publisher for PubSubPublisher {
    async fn publish(
        &self,
        topic: &TopicConfig,
        message: OutboundMessage,
    ) -> Result<String, PublishError> {
        if topic.create_topic {
            self.ensure_topic(topic).await?;
        }

        let topic_path = topic.topic_path();
        let body_length = message.data.len();
        let body = PublishRequest {
            messages: vec![PubsubMessage {
                data: STANDARD.encode(&message.data),
                attributes: message.attributes,
            }],
        };

        let message_id = match self.send_publish(&topic_path, &body).await {
            // The topic was deleted after we created it; create it again and retry once
            Err(PublishError::TopicNotFound(_)) if topic.create_topic => {
                warn!(topic = %topic_path, "pubsub_topic_vanished");
                self.forget_topic(&topic_path).await;
                self.ensure_topic(topic).await?;
                self.send_publish(&topic_path, &body).await?
            }
            result => result?,
        };

        info!(
            topic = %topic_path,
            message_id = %message_id,
            body_length = body_length,
            "pubsub_published"
        );

        Ok(message_id)
    }
}
