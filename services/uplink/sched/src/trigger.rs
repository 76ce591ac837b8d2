//! Bridge between external triggers and the scheduler queue.
//!
//! External inputs (a signal handler, a hardware line, a test harness)
//! fire from contexts that must never block or touch shared task state.
//! The bridge captures a handle and a fixed event, and [`TriggerBridge::fire`]
//! does nothing but enqueue a clone of that event. Heavy work stays on
//! the scheduler thread.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{trace, warn};

use crate::scheduler::SchedulerHandle;

/// Enqueues a fixed event each time an external trigger fires.
///
/// `fire` is constant-time and never blocks. When the scheduler queue is
/// full the trigger is dropped and counted; a lost trigger is preferable
/// to a stalled trigger source.
pub struct TriggerBridge<E> {
    handle: SchedulerHandle<E>,
    event: E,
    label: &'static str,
    dropped: AtomicU64,
}

impl<E: Clone + std::fmt::Debug> TriggerBridge<E> {
    /// Create a bridge that enqueues `event` on the given handle.
    pub fn new(handle: SchedulerHandle<E>, event: E, label: &'static str) -> Self {
        Self {
            handle,
            event,
            label,
            dropped: AtomicU64::new(0),
        }
    }

    /// Enqueue the configured event. Safe to call from any thread.
    pub fn fire(&self) {
        match self.handle.call(self.event.clone()) {
            Ok(()) => {
                trace!(trigger = self.label, "trigger enqueued");
            }
            Err(err) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(trigger = self.label, %err, dropped, "trigger dropped");
            }
        }
    }

    /// Number of triggers dropped because the queue was unavailable.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
