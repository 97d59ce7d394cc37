//! Common Test Utilities
//!
//! Shared fakes, fixtures, and test infrastructure.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use parking_lot::Mutex;
use serde_json::json;
use url::Url;

use quiz_live_client::application::{
    AuthState, ConnectionManager, ConnectionOptions, NotificationQueue,
};
use quiz_live_client::config::Settings;
use quiz_live_client::domain::{
    CloseCode, Transport, TransportEvent, TransportHandle, TransportSink,
};
use quiz_live_client::infrastructure::ManualScheduler;
use quiz_live_client::shared::ClientError;

/// Frames and close call seen by one fake connection
#[derive(Debug, Default)]
pub struct ConnectionLog {
    pub sent: Vec<String>,
    pub closed: Option<(CloseCode, String)>,
}

struct RecordingHandle {
    log: Arc<Mutex<ConnectionLog>>,
}

impl TransportHandle for RecordingHandle {
    fn send(&self, text: String) -> Result<(), ClientError> {
        let mut log = self.log.lock();
        if log.closed.is_some() {
            return Err(ClientError::NotConnected);
        }
        log.sent.push(text);
        Ok(())
    }

    fn close(&mut self, code: CloseCode, reason: &str) {
        self.log
            .lock()
            .closed
            .get_or_insert((code, reason.to_string()));
    }
}

/// One `open` call recorded by [`RecordingTransport`]
pub struct OpenedConnection {
    pub url: Url,
    pub sink: TransportSink,
    pub log: Arc<Mutex<ConnectionLog>>,
}

/// Transport that records every connection and lets the test drive its events
#[derive(Default)]
pub struct RecordingTransport {
    opened: Mutex<Vec<OpenedConnection>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of `open` calls so far
    pub fn open_count(&self) -> usize {
        self.opened.lock().len()
    }

    pub fn url(&self, index: usize) -> Url {
        self.opened.lock()[index].url.clone()
    }

    pub fn sent(&self, index: usize) -> Vec<String> {
        self.opened.lock()[index].log.lock().sent.clone()
    }

    pub fn closed(&self, index: usize) -> Option<(CloseCode, String)> {
        self.opened.lock()[index].log.lock().closed.clone()
    }

    /// Deliver an event on the most recent connection
    pub fn emit(&self, event: TransportEvent) -> bool {
        let sink = {
            let opened = self.opened.lock();
            match opened.last() {
                Some(connection) => connection.sink.clone(),
                None => return false,
            }
        };
        sink.emit(event)
    }

    /// Deliver an event on a specific connection
    pub fn emit_on(&self, index: usize, event: TransportEvent) -> bool {
        let sink = self.opened.lock()[index].sink.clone();
        sink.emit(event)
    }

    pub fn open_latest(&self) {
        self.emit(TransportEvent::Opened);
    }

    pub fn close_latest(&self, code: u16) {
        self.emit(TransportEvent::Closed {
            code: CloseCode(code),
            reason: String::new(),
        });
    }

    pub fn message(&self, raw: &str) {
        self.emit(TransportEvent::Message(raw.to_string()));
    }
}

impl Transport for RecordingTransport {
    fn open(&self, url: Url, sink: TransportSink) -> Box<dyn TransportHandle> {
        let log = Arc::new(Mutex::new(ConnectionLog::default()));
        self.opened.lock().push(OpenedConnection {
            url,
            sink,
            log: log.clone(),
        });
        Box::new(RecordingHandle { log })
    }
}

/// An access token the client accepts, valid for an hour
pub fn access_token(user_id: u64) -> String {
    let exp = Utc::now().timestamp() + 3600;
    let claims = json!({ "user_id": user_id, "exp": exp, "iat": exp - 3600 });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"integration-secret"),
    )
    .unwrap()
}

/// Client wired to fakes: recording transport and a virtual clock
pub struct TestClient {
    pub auth: Arc<AuthState>,
    pub transport: Arc<RecordingTransport>,
    pub scheduler: Arc<ManualScheduler>,
    pub notifications: NotificationQueue,
    pub manager: Arc<ConnectionManager>,
}

impl TestClient {
    pub fn new() -> Self {
        Self::with_settings(|_| {})
    }

    pub fn with_settings(configure: impl FnOnce(&mut Settings)) -> Self {
        let mut settings = Settings::from_defaults().unwrap();
        configure(&mut settings);

        let auth = Arc::new(AuthState::new());
        let transport = RecordingTransport::new();
        let scheduler = Arc::new(ManualScheduler::new());
        let notifications =
            NotificationQueue::with_ttl(scheduler.clone(), settings.notifications.ttl());
        let manager = ConnectionManager::new(
            ConnectionOptions::from_settings(&settings),
            auth.clone(),
            transport.clone(),
            scheduler.clone(),
            notifications.clone(),
        );

        Self {
            auth,
            transport,
            scheduler,
            notifications,
            manager,
        }
    }

    /// Sign in and return the client for chaining
    pub fn signed_in(self) -> Self {
        self.auth.login(&access_token(7), "ana").unwrap();
        self
    }

    /// Connect and complete the handshake
    pub fn open(&self) {
        self.manager.connect();
        self.transport.open_latest();
    }

    /// Fire the pending reconnect timer and return its delay
    pub fn fire_reconnect(&self) -> Option<Duration> {
        self.scheduler.fire_next()
    }
}

/// Let spawned tasks on the current-thread runtime catch up
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Poll `condition` on the real clock for up to five seconds
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..250 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
