//! Client Error Types
//!
//! Centralized error handling for the live leaderboard client.

/// Client error type
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not connected")]
    NotConnected,
}

impl ClientError {
    /// Short, stable label used for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Config(_) => "config",
            ClientError::InvalidUrl(_) => "invalid_url",
            ClientError::Transport(_) => "transport",
            ClientError::Serialization(_) => "serialization",
            ClientError::NotConnected => "not_connected",
        }
    }
}

/// Convenience result alias
pub type Result<T, E = ClientError> = std::result::Result<T, E>;
