//! Pipeline states and the reasons a pull request leaves the pipeline early.

use serde::Serialize;
use std::fmt;

/// States a pull request moves through, strictly in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Pull request data is available.
    Fetched,
    /// The author is a member of the organization.
    AuthorChecked,
    /// A JIRA key was found in the title or body.
    IdentifierExtracted,
    /// The JIRA issue was read.
    IssueLookedUp,
    /// The issue priority matched the target.
    PriorityGated,
    /// GitHub reported the pull request as mergeable.
    MergeabilityChecked,
    /// The merge request succeeded.
    Merged,
    /// The JIRA comment was attempted.
    Commented,
}

impl Stage {
    /// Returns the kebab-case name of the stage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetched => "fetched",
            Self::AuthorChecked => "author-checked",
            Self::IdentifierExtracted => "identifier-extracted",
            Self::IssueLookedUp => "issue-looked-up",
            Self::PriorityGated => "priority-gated",
            Self::MergeabilityChecked => "mergeability-checked",
            Self::Merged => "merged",
            Self::Commented => "commented",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a pull request was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The pull request is not open.
    NotOpen { state: String },
    /// GitHub reported no author.
    AuthorUnknown,
    /// The author is not an organization member.
    AuthorNotMember { login: String },
    /// Neither title nor body contains a JIRA key.
    NoIssueReference,
    /// JIRA answered 404.
    IssueNotFound { key: String },
    /// JIRA answered 403.
    IssueForbidden { key: String },
    /// JIRA could not be reached after every attempt.
    TrackerUnavailable { key: String, error: String },
    /// The issue priority is not the target priority.
    PriorityMismatch {
        key: String,
        found: Option<String>,
        required: String,
    },
    /// GitHub reports conflicts, or has not computed mergeability yet.
    NotMergeable { key: String },
}

impl SkipReason {
    /// The stage the pull request failed to reach.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::NotOpen { .. } | Self::AuthorUnknown | Self::AuthorNotMember { .. } => {
                Stage::AuthorChecked
            }
            Self::NoIssueReference => Stage::IdentifierExtracted,
            Self::IssueNotFound { .. }
            | Self::IssueForbidden { .. }
            | Self::TrackerUnavailable { .. } => Stage::IssueLookedUp,
            Self::PriorityMismatch { .. } => Stage::PriorityGated,
            Self::NotMergeable { .. } => Stage::MergeabilityChecked,
        }
    }

    /// Returns true if the linked issue had the target priority.
    #[must_use]
    pub fn qualified(&self) -> bool {
        matches!(self, Self::NotMergeable { .. })
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOpen { state } => write!(f, "pull request is {state}"),
            Self::AuthorUnknown => f.write_str("author is unknown"),
            Self::AuthorNotMember { login } => {
                write!(f, "author '{login}' is not an organization member")
            }
            Self::NoIssueReference => f.write_str("no JIRA key in title or body"),
            Self::IssueNotFound { key } => write!(f, "JIRA issue {key} not found"),
            Self::IssueForbidden { key } => write!(f, "access to JIRA issue {key} forbidden"),
            Self::TrackerUnavailable { key, error } => {
                write!(f, "JIRA issue {key} could not be retrieved: {error}")
            }
            Self::PriorityMismatch {
                key,
                found,
                required,
            } => write!(
                f,
                "JIRA issue {key} has priority '{}', not '{required}'",
                found.as_deref().unwrap_or("none")
            ),
            Self::NotMergeable { key } => {
                write!(f, "pull request for {key} is not mergeable")
            }
        }
    }
}
