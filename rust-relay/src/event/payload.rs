//! Webhook body parsing.
//!
//! The body is kept as an opaque JSON value so nothing GitHub sent is lost
//! on the way to Pub/Sub. For the events we know the shape of, the fields
//! every delivery must carry are deserialized as a check, and those fields
//! double as a short summary for the request log.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::EventKind;

/// Error type for webhook body parsing failures.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("payload does not match {event} event: {source}")]
    Shape {
        event: EventKind,
        #[source]
        source: serde_json::Error,
    },
}

/// A webhook body that passed the shape check for its event.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPayload {
    /// The request body, unchanged
    pub body: Value,
    /// Key fields of the event, e.g. `ref=refs/heads/main`
    pub summary: Option<String>,
}

/// Parse a raw webhook body for the given event.
pub fn parse_payload(event: EventKind, raw: &[u8]) -> Result<ParsedPayload, PayloadError> {
    let body: Value = serde_json::from_slice(raw).map_err(PayloadError::InvalidJson)?;

    if !body.is_object() {
        return Err(PayloadError::NotAnObject);
    }

    let summary = summarize(event, &body).map_err(|source| PayloadError::Shape { event, source })?;

    Ok(ParsedPayload { body, summary })
}

fn summarize(event: EventKind, body: &Value) -> Result<Option<String>, serde_json::Error> {
    let summary = match event {
        EventKind::Push => {
            let p = PushShape::deserialize(body)?;
            let mut line = format!("ref={}", p.git_ref);
            if let Some(before) = p.before {
                line.push_str(&format!(" before={}", before));
            }
            if let Some(after) = p.after {
                line.push_str(&format!(" after={}", after));
            }
            line
        }
        EventKind::Ping => {
            let p = PingShape::deserialize(body)?;
            format!("hook_id={} zen={:?}", p.hook_id, p.zen)
        }
        EventKind::PullRequest => {
            let p = PullRequestShape::deserialize(body)?;
            format!(
                "action={} number={} head={} base={}",
                p.action, p.number, p.pull_request.head.git_ref, p.pull_request.base.git_ref
            )
        }
        EventKind::Issues => {
            let p = IssuesShape::deserialize(body)?;
            format!("action={} issue={}", p.action, p.issue.number)
        }
        EventKind::IssueComment => {
            let p = IssueCommentShape::deserialize(body)?;
            format!(
                "action={} issue={} comment={}",
                p.action, p.issue.number, p.comment.id
            )
        }
        EventKind::Create | EventKind::Delete => {
            let p = RefShape::deserialize(body)?;
            format!("ref={} ref_type={}", p.git_ref, p.ref_type)
        }
        EventKind::Release => {
            let p = ReleaseShape::deserialize(body)?;
            format!("action={} tag={}", p.action, p.release.tag_name)
        }
        EventKind::Status => {
            let p = StatusShape::deserialize(body)?;
            format!("sha={} state={}", p.sha, p.state)
        }
        _ => return Ok(None),
    };

    Ok(Some(summary))
}

// =============================================================================
// Event Shapes
// =============================================================================

#[derive(Deserialize)]
struct PushShape {
    #[serde(rename = "ref")]
    git_ref: String,
    #[serde(default)]
    before: Option<String>,
    #[serde(default)]
    after: Option<String>,
}

#[derive(Deserialize)]
struct PingShape {
    zen: String,
    hook_id: u64,
}

#[derive(Deserialize)]
struct PullRequestShape {
    action: String,
    number: u64,
    pull_request: PullRequestRef,
}

#[derive(Deserialize)]
struct PullRequestRef {
    head: BranchRef,
    base: BranchRef,
}

#[derive(Deserialize)]
struct BranchRef {
    #[serde(rename = "ref")]
    git_ref: String,
}

#[derive(Deserialize)]
struct IssuesShape {
    action: String,
    issue: IssueRef,
}

#[derive(Deserialize)]
struct IssueCommentShape {
    action: String,
    issue: IssueRef,
    comment: CommentRef,
}

#[derive(Deserialize)]
struct IssueRef {
    number: u64,
}

#[derive(Deserialize)]
struct CommentRef {
    id: u64,
}

#[derive(Deserialize)]
struct RefShape {
    #[serde(rename = "ref")]
    git_ref: String,
    ref_type: String,
}

#[derive(Deserialize)]
struct ReleaseShape {
    action: String,
    release: ReleaseRef,
}

#[derive(Deserialize)]
struct ReleaseRef {
    tag_name: String,
}

#[derive(Deserialize)]
struct StatusShape {
    sha: String,
    state: String,
}
