//! Authentication State
//!
//! Holds the signed-in user's bearer token. Tokens are decoded locally to
//! read the user id and expiry; the signature is the server's business and
//! is not verified here.

use chrono::{DateTime, Utc};
use jsonwebtoken::dangerous::insecure_decode;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::domain::{AuthProvider, Credential};

/// Claims read from the access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id; numeric or string depending on the issuer
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
    /// Expiration time (Unix timestamp)
    #[serde(default)]
    pub exp: Option<i64>,
    /// Issued at time (Unix timestamp)
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token is missing the {0} claim")]
    MissingClaim(&'static str),
}

/// Decode the token payload without verifying its signature.
pub fn decode_claims(token: &str) -> Result<TokenClaims, AuthError> {
    // Any header algorithm is accepted, HMAC or not.
    insecure_decode::<TokenClaims>(token)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Failed to decode token");
            AuthError::InvalidToken
        })
}

/// Build a credential from a token, rejecting tokens expired at `now`.
pub fn credential_from_token(
    token: &str,
    username: &str,
    now: DateTime<Utc>,
) -> Result<Credential, AuthError> {
    let claims = decode_claims(token)?;

    let user_id = match claims.user_id {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => return Err(AuthError::MissingClaim("user_id")),
    };
    let exp = claims.exp.ok_or(AuthError::MissingClaim("exp"))?;
    let expires_at = DateTime::<Utc>::from_timestamp(exp, 0).ok_or(AuthError::InvalidToken)?;

    let credential = Credential {
        token: token.to_string(),
        username: username.to_string(),
        user_id,
        expires_at,
    };
    if credential.is_expired_at(now) {
        return Err(AuthError::TokenExpired);
    }
    Ok(credential)
}

/// In-memory authentication state shared by the whole client.
pub struct AuthState {
    credential: RwLock<Option<Credential>>,
    authenticated: watch::Sender<bool>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthState {
    pub fn new() -> Self {
        let (authenticated, _) = watch::channel(false);
        Self {
            credential: RwLock::new(None),
            authenticated,
        }
    }

    /// Sign in with a freshly issued token.
    ///
    /// An invalid or expired token signs the current user out.
    pub fn login(&self, token: &str, username: &str) -> Result<Credential, AuthError> {
        match credential_from_token(token, username, Utc::now()) {
            Ok(credential) => {
                tracing::info!(
                    user_id = %credential.user_id,
                    username = %credential.username,
                    expires_at = %credential.expires_at,
                    "Signed in"
                );
                *self.credential.write() = Some(credential.clone());
                self.publish(true);
                Ok(credential)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Rejected token");
                self.clear();
                Err(e)
            }
        }
    }

    /// Restore a stored token at start-up. Same checks as [`login`](Self::login).
    pub fn restore(&self, token: &str, username: Option<&str>) -> Result<Credential, AuthError> {
        self.login(token, username.unwrap_or_default())
    }

    /// Sign out.
    pub fn logout(&self) {
        if self.credential.read().is_some() {
            tracing::info!("Signed out");
        }
        self.clear();
    }

    fn clear(&self) {
        *self.credential.write() = None;
        self.publish(false);
    }

    fn publish(&self, value: bool) {
        self.authenticated.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}

impl AuthProvider for AuthState {
    fn is_authenticated(&self) -> bool {
        *self.authenticated.borrow()
    }

    fn credential(&self) -> Option<Credential> {
        self.credential.read().clone()
    }

    fn watch(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }
}
