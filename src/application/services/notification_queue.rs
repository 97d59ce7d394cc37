//! Notification Queue
//!
//! Single-slot notification display. A new notification replaces the current
//! one (no queueing, no dedup) and each notification clears itself after a
//! fixed time-to-live measured from its own `show` call.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::domain::{Notification, Scheduler, Severity, TimerHandle};

/// Default lifetime of a notification.
pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_millis(5000);

#[derive(Default)]
struct Slot {
    next_id: u64,
    expiry: Option<TimerHandle>,
}

struct Shared {
    slot: Mutex<Slot>,
    current: watch::Sender<Option<Notification>>,
}

impl Shared {
    fn expire(&self, id: u64) {
        let mut slot = self.slot.lock();
        let is_current = self
            .current
            .borrow()
            .as_ref()
            .map_or(false, |n| n.id == id);
        if is_current {
            slot.expiry = None;
            self.current.send_replace(None);
            tracing::trace!(notification_id = id, "Notification expired");
        }
    }
}

/// Shared handle to the notification slot.
#[derive(Clone)]
pub struct NotificationQueue {
    shared: Arc<Shared>,
    scheduler: Arc<dyn Scheduler>,
    ttl: Duration,
}

impl NotificationQueue {
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self::with_ttl(scheduler, DEFAULT_NOTIFICATION_TTL)
    }

    pub fn with_ttl(scheduler: Arc<dyn Scheduler>, ttl: Duration) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot::default()),
                current,
            }),
            scheduler,
            ttl,
        }
    }

    /// Show a notification, replacing whatever is visible.
    pub fn show(&self, message: impl Into<String>, severity: Severity) -> Notification {
        let mut slot = self.shared.slot.lock();
        if let Some(previous) = slot.expiry.take() {
            previous.cancel();
        }

        slot.next_id += 1;
        let notification = Notification::new(slot.next_id, message, severity);
        let id = notification.id;

        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        slot.expiry = Some(self.scheduler.schedule(
            self.ttl,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.expire(id);
                }
            }),
        ));

        tracing::debug!(
            notification_id = id,
            severity = %notification.severity,
            message = %notification.message,
            "Notification shown"
        );
        self.shared.current.send_replace(Some(notification.clone()));
        notification
    }

    /// Clear the current notification immediately.
    pub fn dismiss(&self) {
        let mut slot = self.shared.slot.lock();
        if let Some(expiry) = slot.expiry.take() {
            expiry.cancel();
        }
        self.shared.current.send_replace(None);
    }

    /// The visible notification, if any.
    pub fn current(&self) -> Option<Notification> {
        self.shared.current.borrow().clone()
    }

    /// Observe the notification slot.
    pub fn watch(&self) -> watch::Receiver<Option<Notification>> {
        self.shared.current.subscribe()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
