//! Frame-driven time system.
//!
//! Every component that needs to wait ("show this page for three seconds",
//! "load the scene 70% into the effect") registers a deadline with a
//! [`Scheduler`] instead of suspending. Ticking the scheduler advances its
//! clock and hands back every entry that came due.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

// =============================================================================
// GAME CLOCK
// =============================================================================

/// Game time clock (in seconds)
#[derive(Debug, Clone)]
pub struct GameClock {
    /// Current game time in seconds (simulation time, not real time)
    pub time: f32,
}

impl GameClock {
    pub fn new() -> Self {
        Self { time: 0.0 }
    }

    /// Advance time by a frame delta. Negative deltas are ignored.
    pub fn advance_by(&mut self, dt: f32) {
        debug_assert!(dt >= 0.0, "Cannot go backwards in time: dt = {}", dt);
        self.time += dt.max(0.0);
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SCHEDULER
// =============================================================================

/// Handle to a scheduled entry, used for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// A scheduled deadline carrying its payload
#[derive(Debug)]
struct ScheduledTimer<T> {
    handle: TimerHandle,
    deadline: f32,
    payload: T,
}

impl<T> PartialEq for ScheduledTimer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<T> Eq for ScheduledTimer<T> {}

impl<T> PartialOrd for ScheduledTimer<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for ScheduledTimer<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior (earliest deadline first,
        // then earliest scheduled)
        other
            .deadline
            .partial_cmp(&self.deadline)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.handle.0.cmp(&self.handle.0))
    }
}

/// Timer wheel with its own clock.
///
/// Entries are `(deadline, payload)` pairs; [`Scheduler::advance`] moves the
/// clock forward and returns the payloads whose deadline has passed.
#[derive(Debug)]
pub struct Scheduler<T> {
    clock: GameClock,
    pending: BinaryHeap<ScheduledTimer<T>>,
    next_handle: u64,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            clock: GameClock::new(),
            pending: BinaryHeap::new(),
            next_handle: 0,
        }
    }

    /// Current time of this scheduler's clock
    pub fn now(&self) -> f32 {
        self.clock.time
    }

    /// Seconds elapsed on this clock since `start`
    pub fn elapsed_since(&self, start: f32) -> f32 {
        (self.clock.time - start).max(0.0)
    }

    /// Schedule a payload to fire `delay` seconds from now
    pub fn schedule_after(&mut self, delay: f32, payload: T) -> TimerHandle {
        let deadline = self.clock.time + delay.max(0.0);
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.push(ScheduledTimer {
            handle,
            deadline,
            payload,
        });
        handle
    }

    /// Remove a pending entry. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        // Rebuild the heap without the cancelled entry
        let remaining: Vec<_> = self
            .pending
            .drain()
            .filter(|timer| timer.handle != handle)
            .collect();
        self.pending = remaining.into_iter().collect();
        self.pending.len() != before
    }

    /// Advance the clock and pop every entry that came due, earliest first.
    ///
    /// Entries scheduled by the caller while handling the result are not
    /// fired until the next call.
    pub fn advance(&mut self, dt: f32) -> Vec<(TimerHandle, T)> {
        self.clock.advance_by(dt);

        let mut fired = Vec::new();
        while self
            .pending
            .peek()
            .is_some_and(|next| next.deadline <= self.clock.time)
        {
            if let Some(timer) = self.pending.pop() {
                fired.push((timer.handle, timer.payload));
            }
        }
        fired
    }

    /// Number of pending entries
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if there are any pending entries
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every pending entry
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_only_when_due() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_after(1.0, "page");

        assert!(scheduler.advance(0.5).is_empty());
        let fired = scheduler.advance(0.5);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].1, "page");
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_after(2.0, 'c');
        scheduler.schedule_after(1.0, 'a');
        scheduler.schedule_after(1.0, 'b');

        let fired: Vec<char> = scheduler.advance(5.0).into_iter().map(|(_, p)| p).collect();
        assert_eq!(fired, vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_cancel_removes_entry() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_after(1.0, 1);
        let drop = scheduler.schedule_after(1.0, 2);

        assert!(scheduler.cancel(drop));
        assert!(!scheduler.cancel(drop));
        assert_eq!(scheduler.len(), 1);

        let fired: Vec<i32> = scheduler.advance(1.0).into_iter().map(|(_, p)| p).collect();
        assert_eq!(fired, vec![1]);
    }

    #[test]
    fn test_deadline_relative_to_clock() {
        let mut scheduler: Scheduler<()> = Scheduler::new();
        scheduler.advance(2.0);
        scheduler.schedule_after(0.5, ());
        assert_eq!(scheduler.now(), 2.0);
        assert!(scheduler.advance(0.25).is_empty());
        assert_eq!(scheduler.advance(0.25).len(), 1);
    }

    #[test]
    fn test_zero_delay_fires_on_next_advance() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_after(0.0, ());
        assert_eq!(scheduler.advance(0.0).len(), 1);
    }
}
