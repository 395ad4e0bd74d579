//! Authentication error types.

use thiserror::Error;

/// Errors that can occur while producing GitHub credentials.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Neither a token nor GitHub App credentials were supplied.
    #[error("No GitHub credentials: set GITHUB_TOKEN, or APP_ID and APP_KEY")]
    MissingCredentials,

    /// The GitHub App private key is not a valid RSA PEM key.
    #[error("Invalid GitHub App private key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),

    /// Signing the app assertion failed.
    #[error("Failed to sign GitHub App token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}
