//! WebSocket transport backed by tokio-tungstenite.
//!
//! Each `open` spawns one task that owns the socket. The task reports
//! `Opened`, every text frame, and exactly one `Closed` to the sink, in that
//! order. Outbound frames arrive over an unbounded channel held by the
//! returned handle.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async_with_config,
    tungstenite::{
        protocol::{frame::coding::CloseCode as WsCloseCode, CloseFrame, WebSocketConfig},
        Message,
    },
};
use url::Url;

use crate::config::WebSocketSettings;
use crate::domain::{CloseCode, Transport, TransportEvent, TransportHandle, TransportSink};
use crate::shared::error::ClientError;

/// Commands from the handle to the socket task.
#[derive(Debug)]
enum Outgoing {
    Text(String),
    Close { code: CloseCode, reason: String },
}

/// tokio-tungstenite implementation of [`Transport`].
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    max_message_size: usize,
    max_frame_size: usize,
}

impl WebSocketTransport {
    pub fn new(settings: &WebSocketSettings) -> Self {
        Self {
            max_message_size: settings.max_message_size,
            max_frame_size: settings.max_frame_size,
        }
    }

    fn socket_config(&self) -> WebSocketConfig {
        WebSocketConfig::default()
            .max_message_size(Some(self.max_message_size))
            .max_frame_size(Some(self.max_frame_size))
    }
}

impl Transport for WebSocketTransport {
    fn open(&self, url: Url, sink: TransportSink) -> Box<dyn TransportHandle> {
        let (tx, rx) = mpsc::unbounded_channel::<Outgoing>();
        tokio::spawn(run_socket(url, self.socket_config(), sink, rx));
        Box::new(WebSocketHandle {
            tx,
            closed: false,
        })
    }
}

/// Handle to a socket task.
#[derive(Debug)]
pub struct WebSocketHandle {
    tx: mpsc::UnboundedSender<Outgoing>,
    closed: bool,
}

impl TransportHandle for WebSocketHandle {
    fn send(&self, text: String) -> Result<(), ClientError> {
        if self.closed {
            return Err(ClientError::NotConnected);
        }
        self.tx
            .send(Outgoing::Text(text))
            .map_err(|_| ClientError::Transport("socket task has stopped".into()))
    }

    fn close(&mut self, code: CloseCode, reason: &str) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self.tx.send(Outgoing::Close {
            code,
            reason: reason.to_string(),
        });
    }
}

impl Drop for WebSocketHandle {
    fn drop(&mut self) {
        self.close(CloseCode::NORMAL, "Client dropped connection");
    }
}

/// Socket task: connect, then pump frames both ways until either side closes.
async fn run_socket(
    url: Url,
    config: WebSocketConfig,
    sink: TransportSink,
    mut rx: mpsc::UnboundedReceiver<Outgoing>,
) {
    let connection_id = sink.connection_id();
    tracing::debug!(connection_id = %connection_id, host = ?url.host_str(), "Opening WebSocket");

    let stream = match connect_async_with_config(url.as_str(), Some(config), false).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket handshake failed");
            sink.emit(TransportEvent::Closed {
                code: CloseCode::ABNORMAL,
                reason: e.to_string(),
            });
            return;
        }
    };

    if !sink.emit(TransportEvent::Opened) {
        return;
    }

    let (mut write, mut read) = stream.split();

    let closed = loop {
        tokio::select! {
            outgoing = rx.recv() => {
                match outgoing {
                    Some(Outgoing::Text(text)) => {
                        if let Err(e) = write.send(Message::Text(text.into())).await {
                            break (CloseCode::ABNORMAL, e.to_string());
                        }
                    }
                    Some(Outgoing::Close { code, reason }) => {
                        let frame = CloseFrame {
                            code: WsCloseCode::from(code.as_u16()),
                            reason: reason.clone().into(),
                        };
                        let _ = write.send(Message::Close(Some(frame))).await;
                        break (code, reason);
                    }
                    None => {
                        let _ = write.send(Message::Close(None)).await;
                        break (CloseCode::NORMAL, "Handle dropped".to_string());
                    }
                }
            }

            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if !sink.emit(TransportEvent::Message(text.as_str().to_owned())) {
                            let _ = write.send(Message::Close(None)).await;
                            return;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        break match frame {
                            Some(f) => (CloseCode::from(u16::from(f.code)), f.reason.as_str().to_owned()),
                            None => (CloseCode::NO_STATUS, String::new()),
                        };
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = write.send(Message::Pong(payload)).await;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        tracing::debug!(connection_id = %connection_id, "Ignoring binary frame");
                    }
                    Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => {
                        break (CloseCode::ABNORMAL, e.to_string());
                    }
                    None => {
                        break (CloseCode::ABNORMAL, "Stream ended without close frame".to_string());
                    }
                }
            }
        }
    };

    let (code, reason) = closed;
    tracing::debug!(connection_id = %connection_id, code = %code, reason = %reason, "WebSocket closed");
    sink.emit(TransportEvent::Closed { code, reason });
}
