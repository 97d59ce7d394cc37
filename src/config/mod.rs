//! # Configuration Module
//!
//! This module handles client configuration loading and management.
//! Configuration can be loaded from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{environment}.toml)
//! - .env files (via dotenvy)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quiz_live_client::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Live feed at {}{}", settings.websocket.url, settings.websocket.path);
//! ```

mod settings;

pub use settings::*;
