//! GitHub webhook signature verification.
//!
//! GitHub signs webhook requests using HMAC-SHA256 over the raw body and
//! sends the result in `X-Hub-Signature-256` as `sha256=<hex>`.
//! Reference: https://docs.github.com/en/webhooks/using-webhooks/validating-webhook-deliveries

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the HMAC-SHA256 signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Why a signature was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing X-Hub-Signature-256 header")]
    Missing,

    #[error("malformed X-Hub-Signature-256 header")]
    Malformed,

    #[error("HMAC verification failed")]
    Mismatch,
}

/// Verify a GitHub webhook signature.
///
/// # Arguments
///
/// * `secret` - The webhook secret configured on GitHub
/// * `body` - The raw request body, exactly as received
/// * `header` - The `X-Hub-Signature-256` value, if the request carried one
pub fn verify_github_signature(
    secret: &str,
    body: &[u8],
    header: Option<&str>,
) -> Result<(), SignatureError> {
    let header = match header {
        Some(h) if !h.trim().is_empty() => h.trim(),
        _ => return Err(SignatureError::Missing),
    };

    let expected = header
        .strip_prefix(SIGNATURE_PREFIX)
        .and_then(|hex_sig| hex::decode(hex_sig).ok())
        .filter(|sig| !sig.is_empty())
        .ok_or_else(|| {
            warn!(header_length = header.len(), "github_signature_malformed");
            SignatureError::Malformed
        })?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::Mismatch)?;
    mac.update(body);

    // Constant-time comparison via the HMAC library
    mac.verify_slice(&expected).map_err(|_| {
        warn!(
            body_length = body.len(),
            signature_length = expected.len(),
            "github_signature_mismatch"
        );
        SignatureError::Mismatch
    })
}

/// Compute the `X-Hub-Signature-256` value for a body.
#[cfg(test)]
pub(crate) fn sign_github_body(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(body);
    format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_verify_signature_valid() {
        let body = br#"{"ref":"refs/heads/main"}"#;
        let header = sign_github_body("s3cret", body);

        assert!(header.starts_with("sha256="));
        assert_eq!(header.len(), "sha256=".len() + 64);
        assert_eq!(verify_github_signature("s3cret", body, Some(&header)), Ok(()));
    }

    /// Example from GitHub's webhook documentation.
    #[test]
    fn test_github_documentation_vector() {
        let header = "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17";
        assert_eq!(
            verify_github_signature("It's a Secret to Everybody", b"Hello, World!", Some(header)),
            Ok(())
        );
    }

    #[test]
    fn test_verify_signature_missing() {
        assert_eq!(
            verify_github_signature("s3cret", b"{}", None),
            Err(SignatureError::Missing)
        );
        assert_eq!(
            verify_github_signature("s3cret", b"{}", Some("  ")),
            Err(SignatureError::Missing)
        );
    }

    #[test]
    fn test_verify_signature_malformed() {
        for header in ["abcd1234", "sha1=abcd1234", "sha256=xyz", "sha256=abc", "sha256="] {
            assert_eq!(
                verify_github_signature("s3cret", b"{}", Some(header)),
                Err(SignatureError::Malformed),
                "header {header:?}"
            );
        }
    }

    #[test]
    fn test_verify_signature_wrong_secret() {
        let header = sign_github_body("s3cret", b"{}");
        assert_eq!(
            verify_github_signature("other", b"{}", Some(&header)),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_verify_signature_uppercase_hex() {
        let header = sign_github_body("s3cret", b"{}").to_uppercase().replace("SHA256=", "sha256=");
        assert_eq!(verify_github_signature("s3cret", b"{}", Some(&header)), Ok(()));
    }

    proptest! {
        #[test]
        fn prop_modified_body_fails(
            original in any::<Vec<u8>>(),
            modified in any::<Vec<u8>>(),
            secret in "[a-z0-9]{1,32}"
        ) {
            prop_assume!(original != modified);

            let header = sign_github_body(&secret, &original);
            prop_assert_eq!(
                verify_github_signature(&secret, &modified, Some(&header)),
                Err(SignatureError::Mismatch)
            );
        }

        #[test]
        fn prop_arbitrary_header_never_panics(header: String, body: Vec<u8>) {
            let _ = verify_github_signature("s3cret", &body, Some(&header));
        }
    }
}
