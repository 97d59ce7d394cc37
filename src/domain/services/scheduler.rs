//! Cancelable timers.
//!
//! Delayed work (reconnect attempts, notification expiry) goes through a
//! [`Scheduler`] so it can run on the tokio clock in production and on a
//! virtual clock in tests.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::AbortHandle;

/// Work to run when a timer fires.
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Schedules one-shot delayed tasks.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle;
}

/// Handle to a scheduled task.
///
/// Dropping the handle does not cancel the task; call [`TimerHandle::cancel`].
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
    delay: Duration,
}

impl TimerHandle {
    pub fn new(cancelled: Arc<AtomicBool>, delay: Duration) -> Self {
        Self {
            cancelled,
            abort: None,
            delay,
        }
    }

    /// Attach the task abort handle of a spawned timer.
    pub fn with_abort(mut self, abort: AbortHandle) -> Self {
        self.abort = Some(abort);
        self
    }

    /// Cancel the task. Idempotent; a no-op once the task has run.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Delay the task was scheduled with.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("delay", &self.delay)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
