//! # Infrastructure Layer
//!
//! Implementations of the domain seams against real runtimes and sockets.
//!
//! - **websocket**: tokio-tungstenite transport
//! - **scheduler**: tokio-backed and virtual-clock timers
//! - **metrics**: Prometheus counters and gauges

pub mod metrics;
pub mod scheduler;
pub mod websocket;

pub use scheduler::{ManualScheduler, TokioScheduler};
pub use websocket::WebSocketTransport;
