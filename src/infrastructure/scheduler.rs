//! Scheduler implementations.
//!
//! [`TokioScheduler`] runs timers on the tokio clock. [`ManualScheduler`] is
//! a virtual clock: nothing fires until the caller advances it, which makes
//! backoff and expiry behaviour observable without sleeping.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::domain::{Scheduler, TimerHandle, TimerTask};

/// Timers backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl TokioScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();

        let join = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !flag.load(Ordering::SeqCst) {
                task();
            }
        });

        TimerHandle::new(cancelled, delay).with_abort(join.abort_handle())
    }
}

struct PendingTimer {
    due: Duration,
    seq: u64,
    delay: Duration,
    cancelled: Arc<AtomicBool>,
    task: TimerTask,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_seq: u64,
    pending: Vec<PendingTimer>,
    fired: Vec<Duration>,
}

impl ManualState {
    /// Remove and return the earliest live timer due at or before `limit`.
    fn pop_due(&mut self, limit: Option<Duration>) -> Option<PendingTimer> {
        self.pending.retain(|t| !t.cancelled.load(Ordering::SeqCst));

        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| limit.map_or(true, |l| t.due <= l))
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(i, _)| i)?;

        Some(self.pending.swap_remove(index))
    }
}

/// Virtual-clock scheduler.
///
/// Tasks run on the caller's thread from [`advance`](Self::advance) or
/// [`fire_next`](Self::fire_next), never while the scheduler's own lock is
/// held, so a task may schedule further timers.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Delays of timers still waiting to fire, earliest first.
    pub fn pending(&self) -> Vec<Duration> {
        let mut state = self.state.lock();
        state.pending.retain(|t| !t.cancelled.load(Ordering::SeqCst));
        let mut live: Vec<(Duration, u64, Duration)> = state
            .pending
            .iter()
            .map(|t| (t.due, t.seq, t.delay))
            .collect();
        live.sort();
        live.into_iter().map(|(_, _, delay)| delay).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    /// Delays of every timer that has fired so far, in firing order.
    pub fn fired(&self) -> Vec<Duration> {
        self.state.lock().fired.clone()
    }

    /// Move the clock forward, firing every timer that comes due.
    ///
    /// Returns the number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut count = 0;

        loop {
            let next = {
                let mut state = self.state.lock();
                match state.pop_due(Some(target)) {
                    Some(timer) => {
                        state.now = timer.due;
                        state.fired.push(timer.delay);
                        timer
                    }
                    None => {
                        state.now = target;
                        break;
                    }
                }
            };
            (next.task)();
            count += 1;
        }

        count
    }

    /// Jump straight to the next live timer and run it.
    ///
    /// Returns the delay it was scheduled with, or `None` if nothing is pending.
    pub fn fire_next(&self) -> Option<Duration> {
        let next = {
            let mut state = self.state.lock();
            let timer = state.pop_due(None)?;
            state.now = timer.due;
            state.fired.push(timer.delay);
            timer
        };
        let delay = next.delay;
        (next.task)();
        Some(delay)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut state = self.state.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        let due = state.now + delay;
        state.pending.push(PendingTimer {
            due,
            seq,
            delay,
            cancelled: cancelled.clone(),
            task,
        });
        TimerHandle::new(cancelled, delay)
    }
}
