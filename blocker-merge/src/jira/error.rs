//! JIRA error types.

use thiserror::Error;

/// Errors that can occur during a single JIRA request.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// HTTP 403 for the issue.
    #[error("Access to {key} is forbidden")]
    Forbidden { key: String },

    /// HTTP 404 for the issue.
    #[error("Issue {key} not found")]
    NotFound { key: String },

    /// Any other non-success status.
    #[error("JIRA returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection, TLS or body decoding failure.
    #[error("JIRA request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
