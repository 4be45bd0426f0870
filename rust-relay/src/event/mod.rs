//! GitHub event types and payload parsing.
//!
//! ```text
//! X-GitHub-Event → EventKind
//! body           → parse_payload() → ParsedPayload
//! ```

pub mod kind;
pub mod payload;

pub use kind::EventKind;
pub use payload::{parse_payload, ParsedPayload, PayloadError};
