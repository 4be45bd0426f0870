//! Relay error taxonomy and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::event::PayloadError;
use crate::queue::PublishError;
use crate::web::signature::SignatureError;

/// Request rejected before anything was published.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("missing X-GitHub-Event header")]
    MissingEvent,

    #[error("event {0:?} is not allowed")]
    EventNotAllowed(String),

    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// Everything that can fail while relaying one webhook.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("authentication failed: {0}")]
    Authentication(#[from] SignatureError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("envelope serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
}

impl RelayError {
    /// HTTP status for this error.
    ///
    /// Every failure is a 500 unless `strict` is set, in which case
    /// authentication and validation failures become 401 and 400.
    pub fn status(&self, strict: bool) -> StatusCode {
        match self {
            RelayError::Authentication(_) if strict => StatusCode::UNAUTHORIZED,
            RelayError::Validation(_) if strict => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Plain-text response carrying the error description.
    pub fn into_response_with(self, strict: bool) -> Response {
        (self.status(strict), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compatible_status_is_always_500() {
        let errors = [
            RelayError::Authentication(SignatureError::Missing),
            RelayError::Validation(ValidationError::MissingEvent),
            RelayError::Publish(PublishError::EmptyResponse),
        ];

        for err in errors {
            assert_eq!(err.status(false), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_strict_status() {
        assert_eq!(
            RelayError::Authentication(SignatureError::Mismatch).status(true),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            RelayError::Validation(ValidationError::EventNotAllowed("issues".into())).status(true),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::Publish(PublishError::TopicNotFound("t".into())).status(true),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            RelayError::from(SignatureError::Mismatch).to_string(),
            "authentication failed: HMAC verification failed"
        );
        assert_eq!(
            RelayError::from(ValidationError::EventNotAllowed("issues".into())).to_string(),
            "validation failed: event \"issues\" is not allowed"
        );
        assert_eq!(
            RelayError::from(PublishError::EmptyResponse).to_string(),
            "publish failed: pubsub returned no message id"
        );
    }
}
