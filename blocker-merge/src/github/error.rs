//! GitHub error types.

use crate::auth::AuthError;
use thiserror::Error;

/// Errors that can occur during a single GitHub request.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// GitHub API client error: transport, URI or an undecodable response.
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    /// No usable credentials.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The API answered with an unexpected status.
    #[error("GitHub returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}
