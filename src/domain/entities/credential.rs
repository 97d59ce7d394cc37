//! Credential entity and the authentication seam.
//!
//! The connection manager never owns authentication. It reads the current
//! credential at connect time and follows the authenticated flag published
//! by whatever implements [`AuthProvider`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Bearer credential for the live feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Raw bearer token (JWT)
    pub token: String,

    /// Display name of the signed-in user
    pub username: String,

    /// User id claim carried by the token
    pub user_id: String,

    /// Token expiry
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Whether the token has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Source of authentication state.
#[cfg_attr(test, mockall::automock)]
pub trait AuthProvider: Send + Sync {
    /// Whether a user is currently signed in.
    fn is_authenticated(&self) -> bool;

    /// The current credential, if any.
    fn credential(&self) -> Option<Credential>;

    /// Observe authenticated/unauthenticated transitions.
    fn watch(&self) -> watch::Receiver<bool>;
}
