//! Typed results of tracker calls.

use serde::Serialize;

/// The parts of a JIRA issue the pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueDetails {
    /// Issue key, e.g. `PROJ-42`.
    pub key: String,
    /// Priority name, if the issue has one.
    pub priority: Option<String>,
    /// Issue type name.
    pub issue_type: Option<String>,
    /// Summary line.
    pub summary: Option<String>,
}

/// Result of looking up an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The issue was read.
    Found(IssueDetails),
    /// HTTP 404; not retried.
    NotFound,
    /// HTTP 403; not retried.
    Forbidden,
    /// Every attempt failed.
    Unavailable {
        /// Attempts made.
        attempts: u32,
        /// Error of the last attempt.
        error: String,
    },
}

/// Result of posting a comment. Never an error: a comment is best effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommentOutcome {
    /// The comment was added.
    Posted,
    /// Every attempt failed and the comment was dropped.
    Abandoned {
        /// Attempts made.
        attempts: u32,
        /// Error of the last attempt.
        error: String,
    },
}

impl CommentOutcome {
    /// Returns true if the comment was added.
    #[must_use]
    pub fn is_posted(&self) -> bool {
        matches!(self, Self::Posted)
    }
}
