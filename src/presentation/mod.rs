//! Presentation Layer
//!
//! User-facing rendering of the live connection status.

pub mod status;

pub use status::StatusLine;
