//! # Quiz Live Client Library
//!
//! Client side of the quiz leaderboard push feed:
//! - One authenticated WebSocket connection per client
//! - Capped exponential backoff reconnects after abnormal closes
//! - Per-quiz topic subscriptions
//! - Single-slot, self-expiring notifications for live events
//! - Leaderboard cache invalidation driven by push messages
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Connection state machine, wire messages, backoff policy and seams
//! - **Application Layer**: Connection manager, registry, notifications, auth state
//! - **Infrastructure Layer**: tokio-tungstenite transport, schedulers, metrics
//! - **Presentation Layer**: Status indicator
//!
//! ## Module Structure
//!
//! ```text
//! quiz_live_client/
//! +-- config/         Configuration management
//! +-- domain/         Entities, value objects, policies and traits
//! +-- application/    Stateful services
//! +-- infrastructure/ Transport, scheduler and metrics implementations
//! +-- presentation/   Status line rendering
//! +-- shared/         Common utilities (errors)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core types and policies
pub mod domain;

// Application layer - Stateful services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - Status rendering
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and wiring
pub mod startup;

// Telemetry and observability
pub mod telemetry;
