//! Connection Status Line
//!
//! Passive indicator shown to the user: connection state, the latest live
//! message and the visible notification.

use std::fmt;

use crate::application::ConnectionManager;
use crate::domain::{ConnectionState, InboundMessage, Notification};

/// Snapshot of everything the status indicator displays.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub state: ConnectionState,
    pub reconnect_attempt: Option<u32>,
    pub retries_exhausted: bool,
    pub last_message_type: Option<String>,
    pub last_message_text: Option<String>,
    pub notification: Option<Notification>,
}

impl StatusLine {
    pub fn capture(manager: &ConnectionManager) -> Self {
        let attempts = manager.reconnect_attempts();
        let reconnecting = manager.pending_reconnect().is_some()
            || (attempts > 0 && manager.state() == ConnectionState::Connecting);

        Self::new(
            manager.state(),
            reconnecting.then_some(attempts),
            manager.retries_exhausted(),
            manager.last_message().as_ref(),
            manager.notifications().current(),
        )
    }

    pub fn new(
        state: ConnectionState,
        reconnect_attempt: Option<u32>,
        retries_exhausted: bool,
        last_message: Option<&InboundMessage>,
        notification: Option<Notification>,
    ) -> Self {
        Self {
            state,
            reconnect_attempt,
            retries_exhausted,
            last_message_type: last_message.map(|m| m.message_type.clone()),
            last_message_text: last_message
                .and_then(|m| m.message.clone())
                .filter(|m| !m.is_empty()),
            notification,
        }
    }

    /// "Connected" or "Disconnected", as the indicator badge shows it.
    pub fn label(&self) -> &'static str {
        if self.state.is_open() {
            "Connected"
        } else {
            "Disconnected"
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.label())?;

        if let Some(attempt) = self.reconnect_attempt {
            write!(f, " reconnecting (attempt {})", attempt)?;
        } else if self.retries_exhausted {
            write!(f, " gave up reconnecting")?;
        }

        if let Some(message_type) = &self.last_message_type {
            write!(f, " last: {}", message_type)?;
            if let Some(text) = &self.last_message_text {
                write!(f, " ({})", text)?;
            }
        }

        if let Some(notification) = &self.notification {
            write!(f, " | {}: {}", notification.severity, notification.message)?;
        }
        Ok(())
    }
}
