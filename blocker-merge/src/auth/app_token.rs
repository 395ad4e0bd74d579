//! Short-lived GitHub App tokens.

use super::{AuthError, TokenProvider};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Validity window of a signed app token (10 minutes).
pub const TOKEN_VALIDITY_SECS: u64 = 600;

/// A cached token is replaced once fewer than this many seconds remain.
pub const REFRESH_MARGIN_SECS: u64 = 60;

/// Claims of a GitHub App assertion.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppClaims {
    /// Issued-at, seconds since the epoch.
    pub iat: u64,
    /// Expiry, seconds since the epoch.
    pub exp: u64,
    /// GitHub App identifier.
    pub iss: String,
}

#[derive(Debug)]
struct CachedToken {
    token: String,
    expires_at: u64,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Mints RS256-signed GitHub App tokens and reuses them until near expiry.
pub struct AppToken {
    app_id: String,
    key: EncodingKey,
    clock: fn() -> u64,
    cached: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for AppToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppToken")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

impl AppToken {
    /// Creates a provider from an app id and an RSA private key in PEM form.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidKey`] if the key cannot be parsed.
    pub fn new(app_id: impl Into<String>, private_key_pem: &str) -> Result<Self, AuthError> {
        let key =
            EncodingKey::from_rsa_pem(private_key_pem.as_bytes()).map_err(AuthError::InvalidKey)?;
        Ok(Self {
            app_id: app_id.into(),
            key,
            clock: unix_now,
            cached: Mutex::new(None),
        })
    }

    /// Replaces the wall clock, returning seconds since the epoch.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    fn mint(&self, now: u64) -> Result<CachedToken, AuthError> {
        let claims = AppClaims {
            iat: now,
            exp: now + TOKEN_VALIDITY_SECS,
            iss: self.app_id.clone(),
        };
        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(AuthError::Signing)?;
        debug!(app_id = %self.app_id, expires_at = claims.exp, "Minted GitHub App token");
        Ok(CachedToken {
            token,
            expires_at: claims.exp,
        })
    }
}

impl TokenProvider for AppToken {
    fn current_token(&self) -> Result<String, AuthError> {
        let now = (self.clock)();
        let mut cached = self
            .cached
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        match cached.as_ref() {
            Some(entry) if now + REFRESH_MARGIN_SECS < entry.expires_at => Ok(entry.token.clone()),
            _ => {
                let entry = self.mint(now)?;
                let token = entry.token.clone();
                *cached = Some(entry);
                Ok(token)
            }
        }
    }
}
