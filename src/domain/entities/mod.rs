//! # Domain Entities
//!
//! Core objects of the live leaderboard client.
//!
//! - **Connection**: lifecycle state machine plus the transport seam
//! - **LiveMessage**: inbound push frames and outbound request frames
//! - **Notification**: single-slot user-facing toast
//! - **Credential**: bearer token and the authentication seam

mod connection;
mod credential;
mod live_message;
mod notification;

pub use connection::{
    ConnectionState, Transport, TransportEvent, TransportHandle, TransportListener, TransportSink,
};
#[cfg(test)]
pub use credential::MockAuthProvider;
pub use credential::{AuthProvider, Credential};
pub use live_message::{InboundMessage, MessageKind, MessageObserver, OutboundRequest};
pub use notification::{Notification, Severity};
