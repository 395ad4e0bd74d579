//! Runner error types.

use crate::github::GitHubError;
use crate::messages::MessageError;

/// Errors that stop a run before any pull request is processed.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Run configuration loading errors.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// Missing or unusable GitHub credentials.
    #[error(transparent)]
    Auth(#[from] crate::auth::AuthError),

    /// No JIRA token was supplied.
    #[error("JIRA API token is missing")]
    MissingJiraToken,

    /// JIRA client initialization errors.
    #[error(transparent)]
    Tracker(#[from] crate::jira::TrackerError),

    /// The requested base branch is not in `allowed_branches`.
    #[error("branch '{branch}' is not in the allowed branches: {allowed}")]
    BranchNotAllowed { branch: String, allowed: String },

    /// The requested repository is not in the run configuration.
    #[error("repository '{repo}' is not configured")]
    UnknownRepository { repo: String },
}

/// Errors that fail a single pull request.
#[derive(Debug, thiserror::Error)]
pub(crate) enum PullError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Message(#[from] MessageError),
}
