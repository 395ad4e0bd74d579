//! Credentials for the GitHub API.
//!
//! The pipeline never signs anything itself; it asks a [`TokenProvider`] for
//! the token to use on each request.

mod app_token;
mod error;

pub use app_token::{AppClaims, AppToken, REFRESH_MARGIN_SECS, TOKEN_VALIDITY_SECS};
pub use error::AuthError;

use std::sync::Arc;
use tracing::info;

/// Supplies the bearer token for GitHub requests.
pub trait TokenProvider: Send + Sync {
    /// Returns a token that is valid right now.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if a fresh token cannot be produced.
    fn current_token(&self) -> Result<String, AuthError>;
}

/// A fixed personal access token.
#[derive(Clone)]
pub struct PersonalToken(String);

impl PersonalToken {
    /// Wraps a personal access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for PersonalToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PersonalToken(..)")
    }
}

impl TokenProvider for PersonalToken {
    fn current_token(&self) -> Result<String, AuthError> {
        Ok(self.0.clone())
    }
}

/// Picks the token provider for the supplied credentials.
///
/// GitHub App credentials win over a personal token when both are present.
///
/// # Errors
///
/// Returns [`AuthError::MissingCredentials`] if nothing usable was supplied, or
/// [`AuthError::InvalidKey`] for a malformed app key.
pub fn token_provider(
    personal_token: Option<&str>,
    app_id: Option<&str>,
    app_key: Option<&str>,
) -> Result<Arc<dyn TokenProvider>, AuthError> {
    match (app_id, app_key, personal_token) {
        (Some(id), Some(key), _) if !id.is_empty() && !key.is_empty() => {
            info!(app_id = id, "Authenticating as GitHub App");
            Ok(Arc::new(AppToken::new(id, key)?))
        }
        (_, _, Some(token)) if !token.is_empty() => Ok(Arc::new(PersonalToken::new(token))),
        _ => Err(AuthError::MissingCredentials),
    }
}
