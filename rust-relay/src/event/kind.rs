//! Catalog of GitHub webhook event names.
//!
//! The value of the `X-GitHub-Event` header and every entry of the
//! `GITHUB_EVENTS` allow-list must resolve to one of these kinds.

use std::fmt;

use serde::{Serialize, Serializer};

macro_rules! event_kinds {
    ($($variant:ident => $name:literal,)+) => {
        /// A GitHub webhook event type, as named by the `X-GitHub-Event` header.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum EventKind {
            $($variant,)+
        }

        impl EventKind {
            /// Every known event kind, in catalog order.
            pub const ALL: &'static [EventKind] = &[$(EventKind::$variant,)+];

            /// The wire name GitHub uses for this event.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(EventKind::$variant => $name,)+
                }
            }

            /// Resolve a header or config value to an event kind.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(EventKind::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

event_kinds! {
    CheckRun => "check_run",
    CheckSuite => "check_suite",
    CommitComment => "commit_comment",
    Create => "create",
    Delete => "delete",
    Deployment => "deployment",
    DeploymentStatus => "deployment_status",
    Fork => "fork",
    Gollum => "gollum",
    Installation => "installation",
    InstallationRepositories => "installation_repositories",
    IntegrationInstallation => "integration_installation",
    IntegrationInstallationRepositories => "integration_installation_repositories",
    IssueComment => "issue_comment",
    Issues => "issues",
    Label => "label",
    Member => "member",
    Membership => "membership",
    Meta => "meta",
    Milestone => "milestone",
    Organization => "organization",
    OrgBlock => "org_block",
    PageBuild => "page_build",
    Ping => "ping",
    Project => "project",
    ProjectCard => "project_card",
    ProjectColumn => "project_column",
    Public => "public",
    PullRequest => "pull_request",
    PullRequestReview => "pull_request_review",
    PullRequestReviewComment => "pull_request_review_comment",
    Push => "push",
    Release => "release",
    Repository => "repository",
    RepositoryVulnerabilityAlert => "repository_vulnerability_alert",
    SecurityAdvisory => "security_advisory",
    Status => "status",
    Team => "team",
    TeamAdd => "team_add",
    Watch => "watch",
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_resolve_to_themselves() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_name(kind.as_str()), Some(*kind));
        }
    }

    #[test]
    fn test_unknown_and_case_sensitive() {
        assert_eq!(EventKind::from_name("push"), Some(EventKind::Push));
        assert_eq!(EventKind::from_name("Push"), None);
        assert_eq!(EventKind::from_name("pull-request"), None);
        assert_eq!(EventKind::from_name(""), None);
    }

    #[test]
    fn test_serializes_as_wire_name() {
        let json = serde_json::to_string(&EventKind::PullRequestReview).unwrap();
        assert_eq!(json, "\"pull_request_review\"");
        assert_eq!(EventKind::IssueComment.to_string(), "issue_comment");
    }
}
