//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! ## Value Objects
//!
//! - **QuizId**: Quiz topic identifier, tolerant of string or numeric wire forms
//! - **CloseCode**: WebSocket close status with normal/abnormal classification

mod close_code;
mod quiz_id;

pub use close_code::*;
pub use quiz_id::*;
