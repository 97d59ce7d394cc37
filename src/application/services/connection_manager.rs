//! Connection Manager
//!
//! Owns the single live push connection: opens it with the current
//! credential, reconnects with capped exponential backoff after abnormal
//! closes, dispatches inbound frames to observers and sends quiz
//! subscription requests.
//!
//! ## Lifecycle
//!
//! ```text
//! connect() ──> Connecting ──Opened──> Open ──Closed(1000)──> Disconnected
//!                   │                   │
//!                   └──Closed(other)────┴──> Disconnected + reconnect timer
//! ```
//!
//! Reconnects only happen while the auth provider reports a signed-in user.
//! After `max_attempts` consecutive abnormal closes the manager stays
//! disconnected until [`ConnectionManager::disconnect`] or an auth toggle
//! re-arms it.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::notification_queue::NotificationQueue;
use super::subscription_registry::SubscriptionRegistry;
use crate::config::{Settings, WebSocketSettings};
use crate::domain::{
    AuthProvider, CloseCode, ConnectionState, InboundMessage, MessageKind, MessageObserver,
    OutboundRequest,
    QuizId, ReconnectPolicy, Scheduler, TimerHandle, Transport, TransportEvent, TransportHandle,
    TransportListener, TransportSink,
};
use crate::infrastructure::metrics;
use crate::shared::{ClientError, Result};

/// Connection parameters taken from [`Settings`].
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub websocket: WebSocketSettings,
    pub policy: ReconnectPolicy,
    pub resubscribe_on_reconnect: bool,
}

impl ConnectionOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            websocket: settings.websocket.clone(),
            policy: settings.reconnect.policy(),
            resubscribe_on_reconnect: settings.reconnect.resubscribe_on_reconnect,
        }
    }
}

struct PendingReconnect {
    seq: u64,
    timer: TimerHandle,
}

#[derive(Default)]
struct Inner {
    state: ConnectionState,
    attempts: u32,
    exhausted: bool,
    connection_id: Option<Uuid>,
    transport: Option<Box<dyn TransportHandle>>,
    reconnect: Option<PendingReconnect>,
    next_timer_seq: u64,
    registry: SubscriptionRegistry,
}

impl Inner {
    fn cancel_reconnect(&mut self) {
        if let Some(pending) = self.reconnect.take() {
            pending.timer.cancel();
        }
    }
}

/// Long-lived service that maintains the live leaderboard connection.
///
/// Construct once with [`ConnectionManager::new`] and share the `Arc`.
pub struct ConnectionManager {
    me: Weak<ConnectionManager>,
    options: ConnectionOptions,
    auth: Arc<dyn AuthProvider>,
    transport: Arc<dyn Transport>,
    scheduler: Arc<dyn Scheduler>,
    notifications: NotificationQueue,
    inner: Mutex<Inner>,
    observers: RwLock<Vec<Arc<dyn MessageObserver>>>,
    state_tx: watch::Sender<ConnectionState>,
    connected_tx: watch::Sender<bool>,
    last_message_tx: watch::Sender<Option<InboundMessage>>,
}

impl ConnectionManager {
    pub fn new(
        options: ConnectionOptions,
        auth: Arc<dyn AuthProvider>,
        transport: Arc<dyn Transport>,
        scheduler: Arc<dyn Scheduler>,
        notifications: NotificationQueue,
    ) -> Arc<Self> {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (connected_tx, _) = watch::channel(false);
        let (last_message_tx, _) = watch::channel(None);

        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            options,
            auth,
            transport,
            scheduler,
            notifications,
            inner: Mutex::new(Inner::default()),
            observers: RwLock::new(Vec::new()),
            state_tx,
            connected_tx,
            last_message_tx,
        })
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Open the connection if none is active.
    ///
    /// Silently does nothing when a connection already exists or no signed-in
    /// credential is available.
    pub fn connect(&self) {
        let mut inner = self.inner.lock();
        self.open_locked(&mut inner);
    }

    fn open_locked(&self, inner: &mut Inner) {
        if inner.state.is_active() {
            tracing::trace!(state = %inner.state, "Connect ignored, connection already active");
            return;
        }
        if !self.auth.is_authenticated() {
            tracing::debug!("Connect skipped, not authenticated");
            return;
        }
        let Some(credential) = self.auth.credential() else {
            tracing::debug!("Connect skipped, no credential");
            return;
        };

        let url = match self.options.websocket.endpoint(&credential.token) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot build live feed URL");
                return;
            }
        };

        inner.cancel_reconnect();

        let connection_id = Uuid::new_v4();
        let listener: Weak<dyn TransportListener> = self.me.clone();
        tracing::info!(
            connection_id = %connection_id,
            host = url.host_str().unwrap_or_default(),
            path = url.path(),
            user_id = %credential.user_id,
            attempt = inner.attempts,
            "Opening live connection"
        );

        let handle = self
            .transport
            .open(url, TransportSink::new(connection_id, listener));
        inner.connection_id = Some(connection_id);
        inner.transport = Some(handle);
        self.transition(inner, ConnectionState::Connecting);
    }

    /// Close the connection with a normal closure and forget all state.
    ///
    /// Cancels any pending reconnect, resets the attempt counter and clears
    /// the subscription registry. Idempotent.
    pub fn disconnect(&self, reason: &str) {
        let mut inner = self.inner.lock();

        let had_timer = inner.reconnect.is_some();
        inner.cancel_reconnect();
        inner.attempts = 0;
        inner.exhausted = false;
        inner.registry.clear();
        inner.connection_id = None;

        if let Some(mut handle) = inner.transport.take() {
            self.transition(&mut inner, ConnectionState::Closing);
            handle.close(CloseCode::NORMAL, reason);
            tracing::info!(reason, "Live connection closed");
        } else if had_timer {
            tracing::info!(reason, "Pending reconnect cancelled");
        }

        self.transition(&mut inner, ConnectionState::Disconnected);
    }

    /// Follow authentication transitions: connect when signed in, disconnect
    /// when signed out. Runs until the auth sender is dropped.
    pub fn follow_auth(self: Arc<Self>, mut auth_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut previous: Option<bool> = None;
            loop {
                let authenticated = *auth_rx.borrow_and_update();

                // A change notification carrying the same value means the
                // flag toggled and came back before we looked.
                if previous == Some(authenticated) && authenticated {
                    self.disconnect("signed out");
                }
                if authenticated {
                    self.connect();
                } else {
                    self.disconnect("signed out");
                }
                previous = Some(authenticated);

                if auth_rx.changed().await.is_err() {
                    break;
                }
            }
            self.disconnect("shutting down");
        })
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Ask the server to push updates for a quiz. Returns `true` if the
    /// request was sent; nothing happens unless the connection is open.
    pub fn subscribe_to_quiz(&self, quiz_id: impl Into<QuizId>) -> bool {
        self.send_request(OutboundRequest::SubscribeQuiz {
            quiz_id: quiz_id.into(),
        })
    }

    /// Ask the server to stop pushing updates for a quiz. Returns `true` if
    /// the request was sent; nothing happens unless the connection is open.
    pub fn unsubscribe_from_quiz(&self, quiz_id: impl Into<QuizId>) -> bool {
        self.send_request(OutboundRequest::UnsubscribeQuiz {
            quiz_id: quiz_id.into(),
        })
    }

    fn send_request(&self, request: OutboundRequest) -> bool {
        let mut inner = self.inner.lock();
        if !inner.state.is_open() {
            tracing::debug!(
                request = request.request_type(),
                quiz_id = %request.quiz_id(),
                state = %inner.state,
                "Request dropped, connection not open"
            );
            return false;
        }
        if let Err(e) = Self::send_locked(&inner, &request) {
            tracing::warn!(
                error = %e,
                kind = e.kind(),
                request = request.request_type(),
                "Failed to send request"
            );
            return false;
        }

        match request {
            OutboundRequest::SubscribeQuiz { quiz_id } => {
                inner.registry.add(quiz_id);
            }
            OutboundRequest::UnsubscribeQuiz { quiz_id } => {
                inner.registry.remove(&quiz_id);
            }
        }
        true
    }

    fn send_locked(inner: &Inner, request: &OutboundRequest) -> Result<()> {
        let handle = inner.transport.as_ref().ok_or(ClientError::NotConnected)?;
        handle.send(request.to_frame()?)?;

        metrics::record_frame_sent(request.request_type());
        tracing::debug!(
            request = request.request_type(),
            quiz_id = %request.quiz_id(),
            "Request sent"
        );
        Ok(())
    }

    // ========================================================================
    // Transport events
    // ========================================================================

    fn handle_opened(&self, inner: &mut Inner) {
        let previous_attempts = inner.attempts;
        inner.attempts = 0;
        inner.exhausted = false;
        inner.cancel_reconnect();
        self.transition(inner, ConnectionState::Open);

        tracing::info!(previous_attempts, "Live connection open");

        if self.options.resubscribe_on_reconnect && !inner.registry.is_empty() {
            let quiz_ids = inner.registry.quiz_ids();
            tracing::info!(count = quiz_ids.len(), "Re-sending quiz subscriptions");
            for quiz_id in quiz_ids {
                let request = OutboundRequest::SubscribeQuiz { quiz_id };
                if let Err(e) = Self::send_locked(inner, &request) {
                    tracing::warn!(error = %e, quiz_id = %request.quiz_id(), "Resubscribe failed");
                }
            }
        }
    }

    fn handle_message(&self, raw: &str) {
        let message = match InboundMessage::parse(raw) {
            Ok(message) => message,
            Err(e) => {
                metrics::record_malformed_frame();
                tracing::warn!(error = %e, len = raw.len(), "Dropping malformed frame");
                return;
            }
        };

        let kind = message.kind();
        metrics::record_message_received(match &kind {
            MessageKind::Other(_) => "other",
            known => known.as_str(),
        });
        tracing::debug!(message_type = %message.message_type, "Live message received");

        for observer in self.observers.read().iter() {
            observer.on_message(&message);
        }

        let notification = message.notification();
        self.last_message_tx.send_replace(Some(message));

        if let Some((text, severity)) = notification {
            self.notifications.show(text, severity);
        }
    }

    fn handle_closed(&self, inner: &mut Inner, code: CloseCode, reason: &str) {
        inner.transport = None;
        inner.connection_id = None;
        self.transition(inner, ConnectionState::Disconnected);

        if code.is_normal() {
            tracing::info!(code = %code, reason, "Live connection closed by peer");
            return;
        }
        if !self.auth.is_authenticated() {
            tracing::info!(code = %code, reason, "Live connection lost while signed out");
            return;
        }
        if !self.options.policy.allows_retry(inner.attempts) {
            inner.exhausted = true;
            tracing::warn!(
                code = %code,
                reason,
                attempts = inner.attempts,
                "Live connection lost, reconnect attempts exhausted"
            );
            return;
        }

        inner.attempts += 1;
        let attempt = inner.attempts;
        let delay = self.options.policy.delay_for(attempt);

        inner.next_timer_seq += 1;
        let seq = inner.next_timer_seq;
        let me = self.me.clone();
        let timer = self.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(manager) = me.upgrade() {
                    manager.reconnect_due(seq);
                }
            }),
        );
        inner.reconnect = Some(PendingReconnect { seq, timer });
        metrics::record_reconnect_attempt();

        tracing::warn!(
            code = %code,
            reason,
            attempt,
            max_attempts = self.options.policy.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Live connection lost, reconnect scheduled"
        );
    }

    fn reconnect_due(&self, seq: u64) {
        let mut inner = self.inner.lock();
        let current = matches!(&inner.reconnect, Some(pending) if pending.seq == seq);
        if !current {
            return;
        }
        inner.reconnect = None;
        tracing::debug!(attempt = inner.attempts, "Reconnect timer fired");
        self.open_locked(&mut inner);
    }

    fn transition(&self, inner: &mut Inner, next: ConnectionState) {
        if inner.state == next {
            return;
        }
        tracing::debug!(from = %inner.state, to = %next, "Connection state changed");
        inner.state = next;
        self.state_tx.send_replace(next);
        self.connected_tx.send_if_modified(|connected| {
            let open = next.is_open();
            let changed = *connected != open;
            *connected = open;
            changed
        });
        metrics::set_connection_open(next.is_open());
    }

    // ========================================================================
    // Observers
    // ========================================================================

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_open()
    }

    /// Consecutive abnormal closes since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.lock().attempts
    }

    /// Whether the manager gave up reconnecting.
    pub fn retries_exhausted(&self) -> bool {
        self.inner.lock().exhausted
    }

    /// Delay of the pending reconnect timer, if one is armed.
    pub fn pending_reconnect(&self) -> Option<Duration> {
        self.inner.lock().reconnect.as_ref().map(|p| p.timer.delay())
    }

    /// Quiz ids with a subscribe request sent and not since withdrawn.
    pub fn subscriptions(&self) -> Vec<QuizId> {
        self.inner.lock().registry.quiz_ids()
    }

    pub fn last_message(&self) -> Option<InboundMessage> {
        self.last_message_tx.borrow().clone()
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub fn watch_connected(&self) -> watch::Receiver<bool> {
        self.connected_tx.subscribe()
    }

    /// Latest message only; use [`add_observer`](Self::add_observer) to see every message.
    pub fn watch_last_message(&self) -> watch::Receiver<Option<InboundMessage>> {
        self.last_message_tx.subscribe()
    }

    /// Register an observer that receives every parsed inbound message.
    pub fn add_observer(&self, observer: Arc<dyn MessageObserver>) {
        self.observers.write().push(observer);
    }
}

impl TransportListener for ConnectionManager {
    fn on_transport_event(&self, connection_id: Uuid, event: TransportEvent) {
        let mut inner = self.inner.lock();
        if inner.connection_id != Some(connection_id) {
            tracing::trace!(
                connection_id = %connection_id,
                "Ignoring event from a stale connection"
            );
            return;
        }

        match event {
            TransportEvent::Opened => self.handle_opened(&mut inner),
            TransportEvent::Message(raw) => {
                drop(inner);
                self.handle_message(&raw);
            }
            TransportEvent::Closed { code, reason } => {
                self.handle_closed(&mut inner, code, &reason)
            }
        }
    }
}
