//! # Domain Layer
//!
//! The domain layer holds the vocabulary of the live leaderboard client:
//! connection states, wire messages, notifications, credentials and the
//! policies that govern reconnection.
//!
//! ## Structure
//!
//! - **entities**: Connection state machine, live messages, notifications, credentials
//! - **value_objects**: Quiz ids and close codes
//! - **services**: Backoff policy and scheduling contracts
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Seams (`Transport`, `Scheduler`, `AuthProvider`) are traits defined here
//!   and implemented further out

pub mod entities;
pub mod services;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use services::*;
pub use value_objects::*;
