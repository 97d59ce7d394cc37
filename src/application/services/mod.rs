//! Application Services
//!
//! Stateful services that coordinate the domain types.
//!
//! ## Available Services
//!
//! - **ConnectionManager**: live connection lifecycle, backoff and dispatch
//! - **SubscriptionRegistry**: quiz topics requested from the server
//! - **NotificationQueue**: single-slot, self-expiring notifications
//! - **AuthState**: signed-in credential and its authenticated flag
//! - **LeaderboardCache**: which displayed leaderboards need a re-fetch

pub mod auth_service;
pub mod connection_manager;
pub mod leaderboard_cache;
pub mod notification_queue;
pub mod subscription_registry;

pub use auth_service::{credential_from_token, decode_claims, AuthError, AuthState, TokenClaims};
pub use connection_manager::{ConnectionManager, ConnectionOptions};
pub use leaderboard_cache::{LeaderboardCache, LeaderboardKey};
pub use notification_queue::{NotificationQueue, DEFAULT_NOTIFICATION_TTL};
pub use subscription_registry::SubscriptionRegistry;
