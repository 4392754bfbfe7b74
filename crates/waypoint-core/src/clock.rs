#![forbid(unsafe_code)]

//! Host-driven clocks.
//!
//! The tour never reads ambient time for its own scheduling. The host advances
//! a [`DeterministicClock`] explicitly (e.g. from `requestAnimationFrame`), and
//! wall-clock timestamps for persisted records come from a [`WallClock`].

use core::time::Duration;

use web_time::{SystemTime, UNIX_EPOCH};

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Current monotonic time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Set current monotonic time. Time never moves backwards.
    pub fn set(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

/// Source of wall-clock timestamps, in Unix epoch milliseconds.
pub trait WallClock {
    fn now_millis(&self) -> u64;
}

/// Wall clock backed by the platform (`Date.now()` on wasm).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

/// Wall clock pinned to a fixed instant, for tests and replays.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FixedWallClock(pub u64);

impl WallClock for FixedWallClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_clock_is_monotonic() {
        let mut clock = DeterministicClock::new();
        clock.advance(Duration::from_millis(100));
        clock.set(Duration::from_millis(50));
        assert_eq!(clock.now(), Duration::from_millis(100));
        clock.set(Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::from_millis(250));
    }

    #[test]
    fn advance_saturates() {
        let mut clock = DeterministicClock::new();
        clock.set(Duration::MAX);
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::MAX);
    }

    #[test]
    fn system_wall_clock_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemWallClock.now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn fixed_wall_clock() {
        assert_eq!(FixedWallClock(42).now_millis(), 42);
    }
}
