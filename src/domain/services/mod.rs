//! # Domain Services
//!
//! Pure policies and scheduling contracts used by the application services.
//!
//! - **ReconnectPolicy**: capped exponential backoff with an attempt limit
//! - **Scheduler**: cancelable one-shot timers

mod backoff;
mod scheduler;

pub use backoff::*;
pub use scheduler::*;
