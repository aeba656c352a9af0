//! Time source for the poll loop
//!
//! The poller never calls `std::thread::sleep` directly. It goes through
//! [`Clock`], so tests drive the state machine with [`FakeClock`] and no
//! wall-clock delay.
//!
//! [`PollDeadline`] enforces the optional max duration. It only reports
//! that the limit has passed; the poller decides what to do about it.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Source of time and of blocking waits
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration);
}

/// Real time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Virtual time: `sleep` returns immediately and advances `now`.
#[derive(Debug)]
pub struct FakeClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Move time forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        if let Ok(mut elapsed) = self.elapsed.lock() {
            *elapsed += duration;
        }
    }

    /// Virtual time since creation
    pub fn elapsed(&self) -> Duration {
        self.elapsed.lock().map(|e| *e).unwrap_or_default()
    }

    /// Every sleep requested so far
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        if let Ok(mut sleeps) = self.sleeps.lock() {
            sleeps.push(duration);
        }
        self.advance(duration);
    }
}

/// Optional wall-clock limit for a poll loop
#[derive(Debug, Clone, Copy)]
pub struct PollDeadline {
    start: Instant,
    limit: Option<Duration>,
}

impl PollDeadline {
    /// Start measuring now. `None` never expires.
    pub fn start(clock: &dyn Clock, limit: Option<Duration>) -> Self {
        Self {
            start: clock.now(),
            limit,
        }
    }

    pub fn elapsed(&self, clock: &dyn Clock) -> Duration {
        clock.now().saturating_duration_since(self.start)
    }

    /// Whether the limit has been passed
    pub fn is_expired(&self, clock: &dyn Clock) -> bool {
        match self.limit {
            Some(limit) => self.elapsed(clock) >= limit,
            None => false,
        }
    }

    /// Time left before expiry (`None` when unlimited)
    pub fn remaining(&self, clock: &dyn Clock) -> Option<Duration> {
        self.limit
            .map(|limit| limit.saturating_sub(self.elapsed(clock)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_clock_sleep_advances_time() {
        let clock = FakeClock::new();
        let before = clock.now();
        clock.sleep(Duration::from_secs(30));
        clock.sleep(Duration::from_secs(30));

        assert_eq!(clock.now() - before, Duration::from_secs(60));
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(30); 2]);
    }

    #[test]
    fn test_advance_is_not_a_sleep() {
        let clock = FakeClock::new();
        clock.advance(Duration::from_secs(5));
        assert_eq!(clock.elapsed(), Duration::from_secs(5));
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_deadline_unlimited() {
        let clock = FakeClock::new();
        let deadline = PollDeadline::start(&clock, None);
        clock.advance(Duration::from_secs(86_400 * 7));
        assert!(!deadline.is_expired(&clock));
        assert_eq!(deadline.remaining(&clock), None);
    }

    #[test]
    fn test_deadline_expires() {
        let clock = FakeClock::new();
        let deadline = PollDeadline::start(&clock, Some(Duration::from_secs(90)));

        clock.advance(Duration::from_secs(60));
        assert!(!deadline.is_expired(&clock));
        assert_eq!(deadline.remaining(&clock), Some(Duration::from_secs(30)));

        clock.advance(Duration::from_secs(30));
        assert!(deadline.is_expired(&clock));
        assert_eq!(deadline.remaining(&clock), Some(Duration::ZERO));
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        clock.sleep(Duration::from_millis(1));
        assert!(clock.now() > a);
    }
}
