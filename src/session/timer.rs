/// Recurring timers for the poll and pull loops.
///
/// A [`Timers`] set behaves like a page's `setInterval` registry with an
/// explicit handle per loop: the first tick fires one interval after start,
/// cancellation is idempotent, and a late driver never bursts through missed
/// ticks (a timer that fell behind is rescheduled from the current time).
use std::time::Duration;

/// Shortest interval a timer may run at. Keeps a zero interval from
/// spinning the driver.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to a running timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Timer {
    id: TimerId,
    interval: Duration,
    due: Duration,
}

#[derive(Debug, Default)]
pub struct Timers {
    next_id: u64,
    active: Vec<Timer>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a recurring timer whose first tick is due at `now + interval`.
    pub fn start(&mut self, now: Duration, interval: Duration) -> TimerId {
        let interval = interval.max(MIN_INTERVAL);
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.active.push(Timer {
            id,
            interval,
            due: now + interval,
        });
        id
    }

    /// Stop a timer. Returns `false` if it was not running.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.active.len();
        self.active.retain(|t| t.id != id);
        self.active.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Earliest due time across all running timers.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.active.iter().map(|t| t.due).min()
    }

    /// Take the earliest timer that is due at `now` and reschedule it.
    ///
    /// Ties resolve in start order.
    pub fn pop_due(&mut self, now: Duration) -> Option<TimerId> {
        let timer = self
            .active
            .iter_mut()
            .filter(|t| t.due <= now)
            .min_by_key(|t| t.due)?;

        let mut next = timer.due + timer.interval;
        if next <= now {
            next = now + timer.interval;
        }
        timer.due = next;
        Some(timer.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn first_tick_is_one_interval_after_start() {
        let mut timers = Timers::new();
        let id = timers.start(ms(100), ms(50));
        assert_eq!(timers.next_deadline(), Some(ms(150)));
        assert_eq!(timers.pop_due(ms(149)), None);
        assert_eq!(timers.pop_due(ms(150)), Some(id));
        assert_eq!(timers.next_deadline(), Some(ms(200)));
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut timers = Timers::new();
        let id = timers.start(ms(0), ms(10));
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert!(timers.is_empty());
        assert_eq!(timers.pop_due(ms(1000)), None);
    }

    #[test]
    fn late_driver_does_not_burst() {
        let mut timers = Timers::new();
        let id = timers.start(ms(0), ms(10));
        assert_eq!(timers.pop_due(ms(55)), Some(id));
        // Rescheduled from "now", not from the missed deadline.
        assert_eq!(timers.pop_due(ms(55)), None);
        assert_eq!(timers.next_deadline(), Some(ms(65)));
    }

    #[test]
    fn earliest_due_fires_first() {
        let mut timers = Timers::new();
        let slow = timers.start(ms(0), ms(30));
        let fast = timers.start(ms(0), ms(5));
        assert_eq!(timers.pop_due(ms(30)), Some(fast));
        assert_eq!(timers.pop_due(ms(30)), Some(slow));
        assert_eq!(timers.len(), 2);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let mut timers = Timers::new();
        timers.start(ms(0), Duration::ZERO);
        assert_eq!(timers.next_deadline(), Some(MIN_INTERVAL));
    }

    #[test]
    fn ids_are_unique() {
        let mut timers = Timers::new();
        let a = timers.start(ms(0), ms(1));
        timers.cancel(a);
        let b = timers.start(ms(0), ms(1));
        assert_ne!(a, b);
        assert!(!timers.cancel(a));
        assert!(timers.cancel(b));
    }
}
