use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::debug;

/// Identity of one logical run, incremented on every start.
pub type RunId = u64;

/// Monotonic time source measured from the clock's own origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock; clones share the same time.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use sequencer::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let handle = clock.clone();
/// handle.advance(Duration::from_secs(5));
/// assert_eq!(clock.now(), Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_us: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now: Duration) {
        self.now_us
            .store(u64::try_from(now.as_micros()).unwrap_or(u64::MAX), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let by_us = u64::try_from(by.as_micros()).unwrap_or(u64::MAX);
        let _ = self
            .now_us
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(by_us))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_micros(self.now_us.load(Ordering::SeqCst))
    }
}

/// Cancelable "fire after duration" primitive driving the sequencer.
///
/// Deadlines are absolute times on the scheduler's own clock.
pub trait Scheduler {
    fn now(&self) -> Duration;

    /// Registers one advance for `run_id` at `deadline`.
    fn schedule_at(&mut self, deadline: Duration, run_id: RunId);

    fn schedule_after(&mut self, delay: Duration, run_id: RunId) {
        let deadline = self.now().saturating_add(delay);
        self.schedule_at(deadline, run_id);
    }

    /// Drops every pending advance registered for `run_id`.
    fn cancel(&mut self, run_id: RunId);

    /// Earliest pending deadline, if any.
    fn next_deadline(&self) -> Option<Duration>;

    /// Removes and returns every run whose deadline is `<= now`, earliest first.
    fn take_due(&mut self) -> Vec<RunId>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingTimer {
    deadline: Duration,
    run_id: RunId,
}

/// Deadline-ordered timer queue over any [`Clock`].
#[derive(Debug)]
pub struct TimerQueue<C> {
    clock: C,
    pending: Vec<PendingTimer>,
}

impl<C> TimerQueue<C>
where
    C: Clock,
{
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            pending: Vec::new(),
        }
    }

    /// Number of registered timers, due or not.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl TimerQueue<SystemClock> {
    /// Creates a queue driven by wall-clock time.
    pub fn with_system_clock() -> Self {
        Self::new(SystemClock::new())
    }
}

impl<C> Scheduler for TimerQueue<C>
where
    C: Clock,
{
    fn now(&self) -> Duration {
        self.clock.now()
    }

    fn schedule_at(&mut self, deadline: Duration, run_id: RunId) {
        // Equal deadlines keep insertion order.
        let index = self
            .pending
            .partition_point(|timer| timer.deadline <= deadline);
        self.pending
            .insert(index, PendingTimer { deadline, run_id });
        debug!(
            run_id,
            deadline_us = deadline.as_micros() as u64,
            pending = self.pending.len(),
            "timer scheduled"
        );
    }

    fn cancel(&mut self, run_id: RunId) {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.run_id != run_id);
        let removed = before - self.pending.len();
        if removed > 0 {
            debug!(run_id, removed, "timers canceled");
        }
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.pending.first().map(|timer| timer.deadline)
    }

    fn take_due(&mut self) -> Vec<RunId> {
        let now = self.clock.now();
        let due = self.pending.partition_point(|timer| timer.deadline <= now);
        self.pending
            .drain(..due)
            .map(|timer| timer.run_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{ManualClock, Scheduler, TimerQueue};

    #[test]
    fn take_due_returns_only_expired_timers_in_deadline_order() {
        let clock = ManualClock::new();
        let mut queue = TimerQueue::new(clock.clone());
        queue.schedule_at(Duration::from_secs(10), 2);
        queue.schedule_at(Duration::from_secs(5), 1);
        queue.schedule_at(Duration::from_secs(20), 3);

        clock.set(Duration::from_secs(10));

        assert_eq!(queue.take_due(), vec![1, 2]);
        assert_eq!(queue.next_deadline(), Some(Duration::from_secs(20)));
        assert_eq!(queue.pending_len(), 1);
    }

    #[test]
    fn timer_is_not_due_before_its_deadline() {
        let clock = ManualClock::new();
        let mut queue = TimerQueue::new(clock.clone());
        queue.schedule_after(Duration::from_millis(500), 7);

        clock.advance(Duration::from_millis(499));
        assert!(queue.take_due().is_empty());

        clock.advance(Duration::from_millis(1));
        assert_eq!(queue.take_due(), vec![7]);
    }

    #[test]
    fn cancel_removes_only_the_named_run() {
        let clock = ManualClock::new();
        let mut queue = TimerQueue::new(clock.clone());
        queue.schedule_at(Duration::from_secs(1), 1);
        queue.schedule_at(Duration::from_secs(2), 2);

        queue.cancel(1);
        clock.set(Duration::from_secs(5));

        assert_eq!(queue.take_due(), vec![2]);
        assert_eq!(queue.next_deadline(), None);
    }

    #[test]
    fn schedule_after_is_relative_to_current_time() {
        let clock = ManualClock::new();
        clock.set(Duration::from_secs(3));
        let mut queue = TimerQueue::new(clock);

        queue.schedule_after(Duration::from_secs(2), 1);

        assert_eq!(queue.next_deadline(), Some(Duration::from_secs(5)));
    }
}
