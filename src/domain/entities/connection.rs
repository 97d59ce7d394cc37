//! Connection state machine and the transport seam.
//!
//! ```text
//!   Disconnected --connect()--> Connecting --Opened--> Open
//!        ^                          |                   |
//!        |                        Closed             Closed
//!        +--------------------------+-------------------+
//!        |                                              |
//!        +-------- Closing <------ disconnect() --------+
//! ```

use std::fmt;
use std::sync::Weak;

use url::Url;
use uuid::Uuid;

use crate::domain::CloseCode;
use crate::shared::error::ClientError;

/// Lifecycle state of the live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Closing,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// A transport exists or is being torn down; `connect()` must not start another.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Disconnected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Events reported by a transport, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake completed
    Opened,
    /// A text frame arrived
    Message(String),
    /// The connection ended, cleanly or not
    Closed { code: CloseCode, reason: String },
}

/// Receives transport events for a specific connection.
pub trait TransportListener: Send + Sync {
    fn on_transport_event(&self, connection_id: Uuid, event: TransportEvent);
}

/// Handle given to a transport so it can report events for one connection.
///
/// Holds only a weak reference to the listener; once the listener is gone
/// events are silently discarded.
#[derive(Clone)]
pub struct TransportSink {
    connection_id: Uuid,
    listener: Weak<dyn TransportListener>,
}

impl TransportSink {
    pub fn new(connection_id: Uuid, listener: Weak<dyn TransportListener>) -> Self {
        Self {
            connection_id,
            listener,
        }
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    /// Deliver an event. Returns `false` if the listener no longer exists.
    pub fn emit(&self, event: TransportEvent) -> bool {
        match self.listener.upgrade() {
            Some(listener) => {
                listener.on_transport_event(self.connection_id, event);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for TransportSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSink")
            .field("connection_id", &self.connection_id)
            .finish()
    }
}

/// Live side of an opened transport, exclusively owned by the connection manager.
pub trait TransportHandle: Send {
    /// Queue a text frame for sending.
    fn send(&self, text: String) -> Result<(), ClientError>;

    /// Close the connection with the given code. Idempotent.
    fn close(&mut self, code: CloseCode, reason: &str);
}

/// Factory for push connections.
///
/// `open` must return immediately; progress is reported through the sink and
/// must never be delivered synchronously from inside `open`.
pub trait Transport: Send + Sync {
    fn open(&self, url: Url, sink: TransportSink) -> Box<dyn TransportHandle>;
}
