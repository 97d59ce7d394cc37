//! WebSocket close codes as seen by the client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A WebSocket close status code.
///
/// Only [`CloseCode::NORMAL`] is treated as an intentional shutdown; every
/// other code counts as an abnormal closure eligible for reconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CloseCode(pub u16);

impl CloseCode {
    /// Normal closure (1000).
    pub const NORMAL: CloseCode = CloseCode(1000);
    /// No status code was present in the close frame (1005).
    pub const NO_STATUS: CloseCode = CloseCode(1005);
    /// Connection dropped without a close frame (1006).
    pub const ABNORMAL: CloseCode = CloseCode(1006);

    /// Whether this code signals an expected, intentional closure.
    pub const fn is_normal(&self) -> bool {
        self.0 == Self::NORMAL.0
    }

    /// Get the raw code.
    pub const fn as_u16(&self) -> u16 {
        self.0
    }
}

impl From<u16> for CloseCode {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
