//! WebSocket Transport
//!
//! Live feed connections over tokio-tungstenite.

mod transport;

pub use transport::{WebSocketHandle, WebSocketTransport};
