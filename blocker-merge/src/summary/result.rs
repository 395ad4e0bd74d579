//! Processing result types.

use crate::jira::CommentOutcome;
use crate::runner::SkipReason;
use serde::Serialize;

/// Where a pull request ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PrOutcome {
    /// Merged; the JIRA comment may or may not have been posted.
    Merged {
        /// Linked JIRA key.
        key: String,
        /// Web link to the pull request.
        link: String,
        /// Merge commit SHA, if GitHub reported it.
        sha: Option<String>,
        /// Result of the JIRA comment.
        comment: CommentOutcome,
    },

    /// Dry run: every gate passed and the merge was not sent.
    WouldMerge {
        /// Linked JIRA key.
        key: String,
        /// Web link to the pull request.
        link: String,
    },

    /// GitHub answered the merge request with something other than 200.
    MergeRejected {
        /// Linked JIRA key.
        key: String,
        /// HTTP status.
        status: u16,
        /// GitHub's explanation.
        message: String,
    },

    /// A gate stopped the pull request.
    Skipped(SkipReason),

    /// GitHub could not be reached, or a message could not be rendered.
    Failed {
        /// Error message.
        error: String,
    },
}

impl PrOutcome {
    /// Returns true if the linked issue had the target priority.
    #[must_use]
    pub fn qualified(&self) -> bool {
        match self {
            Self::Merged { .. } | Self::WouldMerge { .. } | Self::MergeRejected { .. } => true,
            Self::Skipped(reason) => reason.qualified(),
            Self::Failed { .. } => false,
        }
    }

    /// Returns true if the pull request was merged, or would have been.
    #[must_use]
    pub fn is_merge(&self) -> bool {
        matches!(self, Self::Merged { .. } | Self::WouldMerge { .. })
    }
}

/// Result of processing a single pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingResult {
    /// Repository name.
    pub repository: String,
    /// Pull request number.
    pub number: u64,
    /// What happened.
    pub outcome: PrOutcome,
}
