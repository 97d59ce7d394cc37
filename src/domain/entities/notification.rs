//! Notification entity.
//!
//! A short-lived toast shown to the user when the live feed reports
//! something worth surfacing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    /// Convert to wire/string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single visible notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Monotonic sequence number, unique per queue
    pub id: u64,

    /// Text shown to the user
    pub message: String,

    /// Display severity
    pub severity: Severity,

    /// When the notification was shown
    pub shown_at: DateTime<Utc>,
}

impl Notification {
    /// Create a new notification stamped with the current time.
    pub fn new(id: u64, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            id,
            message: message.into(),
            severity,
            shown_at: Utc::now(),
        }
    }
}
