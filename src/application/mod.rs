//! Application Layer
//!
//! Services that own client state and react to transport and auth events.
//! This layer sits between the transport/scheduler infrastructure and the
//! status presentation.

pub mod services;

pub use services::*;
