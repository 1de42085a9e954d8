use alloc::vec::Vec;
use core::time::Duration;
use serde::{Deserialize, Serialize};

/// Identifies one scheduled transition. Handles from an earlier epoch never match
/// anything once the scheduler has been cleared.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle {
    epoch: u32,
    id: u32,
}

impl TimerHandle {
    pub const fn epoch(self) -> u32 {
        self.epoch
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Fired<E> {
    pub handle: TimerHandle,
    /// Virtual time the event was due at, not the time `advance` was called with.
    pub at: Duration,
    pub event: E,
}

#[derive(Clone, Debug, PartialEq)]
struct Pending<E> {
    handle: TimerHandle,
    due: Duration,
    event: E,
}

/// One-shot delayed transitions on a virtual clock owned by a single game instance.
///
/// Events are popped one at a time with [`Scheduler::pop_due`] so a transition that
/// cancels another one, or clears the whole scheduler, takes effect before the next
/// event is looked at:
///
/// ```ignore
/// let deadline = timers.deadline_after(dt);
/// while let Some(fired) = timers.pop_due(deadline) {
///     on_timer(fired);
/// }
/// timers.catch_up(deadline);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Scheduler<E> {
    now: Duration,
    epoch: u32,
    next_id: u32,
    pending: Vec<Pending<E>>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
            epoch: 0,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|p| p.handle == handle)
    }

    pub fn schedule(&mut self, delay: Duration, event: E) -> TimerHandle {
        let handle = TimerHandle {
            epoch: self.epoch,
            id: self.next_id,
        };
        self.next_id = self.next_id.wrapping_add(1);
        self.pending.push(Pending {
            handle,
            due: self.now.saturating_add(delay),
            event,
        });
        handle
    }

    /// Returns whether the handle was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        before != self.pending.len()
    }

    /// Drops every pending transition and starts a new epoch.
    pub fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            log::debug!(
                "cancelling {} pending transition(s) of epoch {}",
                self.pending.len(),
                self.epoch
            );
        }
        self.pending.clear();
        self.epoch = self.epoch.wrapping_add(1);
    }

    pub fn deadline_after(&self, dt: Duration) -> Duration {
        self.now.saturating_add(dt)
    }

    /// Removes the earliest transition due at or before `deadline`, moving the clock to
    /// its due time. Ties fire in scheduling order.
    pub fn pop_due(&mut self, deadline: Duration) -> Option<Fired<E>> {
        let (index, _) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= deadline)
            .min_by_key(|(_, p)| (p.due, p.handle.id))?;

        let Pending { handle, due, event } = self.pending.remove(index);
        self.now = self.now.max(due);
        log::trace!("timer {:?} fired at {:?}", handle, due);
        Some(Fired {
            handle,
            at: due,
            event,
        })
    }

    pub fn catch_up(&mut self, deadline: Duration) {
        self.now = self.now.max(deadline);
    }
}
