#![forbid(unsafe_code)]

//! Settle-delay scheduling.
//!
//! After every step change the tour waits briefly before measuring the DOM so
//! that prerequisite UI (typically the compact menu animating open) has
//! mounted. At most one settle timer is pending at a time:
//!
//! - scheduling a new timer cancels the previous one,
//! - [`SettleScheduler::cancel`] drops the pending timer (step change,
//!   tour end, teardown),
//! - every timer carries a generation number, so a handle captured before a
//!   cancellation can never fire.
//!
//! Time is host-driven: [`SettleScheduler::poll`] is called with the current
//! monotonic time.

use core::time::Duration;

/// Identifies one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SettleHandle {
    generation: u64,
    step_index: usize,
}

impl SettleHandle {
    #[must_use]
    pub const fn step_index(&self) -> usize {
        self.step_index
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingSettle {
    handle: SettleHandle,
    due: Duration,
}

/// Single-slot, cancellable timer keyed by step index.
#[derive(Debug, Clone, Default)]
pub struct SettleScheduler {
    generation: u64,
    pending: Option<PendingSettle>,
}

impl SettleScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule resolution of `step_index` at `now + delay`, replacing any
    /// pending timer.
    pub fn schedule(&mut self, step_index: usize, now: Duration, delay: Duration) -> SettleHandle {
        self.generation = self.generation.wrapping_add(1);
        let handle = SettleHandle {
            generation: self.generation,
            step_index,
        };
        if let Some(previous) = self.pending.replace(PendingSettle {
            handle,
            due: now.saturating_add(delay),
        }) {
            tracing::trace!(
                cancelled_step = previous.handle.step_index,
                step_index,
                "settle timer superseded"
            );
        }
        handle
    }

    /// Drop the pending timer, if any. Returns the cancelled handle.
    pub fn cancel(&mut self) -> Option<SettleHandle> {
        self.generation = self.generation.wrapping_add(1);
        self.pending.take().map(|pending| pending.handle)
    }

    #[must_use]
    pub fn pending(&self) -> Option<SettleHandle> {
        self.pending.map(|pending| pending.handle)
    }

    /// Time at which the pending timer fires.
    #[must_use]
    pub fn due_at(&self) -> Option<Duration> {
        self.pending.map(|pending| pending.due)
    }

    /// Fire the pending timer if it is due. A fired timer is consumed.
    pub fn poll(&mut self, now: Duration) -> Option<SettleHandle> {
        let pending = self.pending?;
        if now < pending.due {
            return None;
        }
        self.pending = None;
        Some(pending.handle)
    }
}
