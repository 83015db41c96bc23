//! Study-time accounting.
//!
//! A [`StudyClock`] hands out elapsed time in slices: each `tick` returns
//! the time since the previous flush and `stop` returns the final partial
//! slice. The slices sum to the whole session, to the millisecond, so a caller that
//! persists every slice loses at most the one in flight.

use std::time::{Duration, Instant};

/// How often an open session flushes its elapsed time.
pub const DEFAULT_TICK: Duration = Duration::from_millis(1000);

/// Whole milliseconds of a duration, saturating.
pub fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone)]
pub struct StudyClock {
    started_at: Instant,
    last_flush: Instant,
    flushed: Duration,
}

impl StudyClock {
    pub fn start(now: Instant) -> Self {
        Self {
            started_at: now,
            last_flush: now,
            flushed: Duration::ZERO,
        }
    }

    /// Whole milliseconds since the last flush; marks them flushed.
    ///
    /// The sub-millisecond remainder carries into the next slice.
    pub fn tick(&mut self, now: Instant) -> Duration {
        let pending = now.saturating_duration_since(self.last_flush);
        let slice = Duration::from_millis(duration_ms(pending));
        self.last_flush += slice;
        self.flushed += slice;
        slice
    }

    /// Final partial slice. Consumes the clock so it cannot flush twice.
    pub fn stop(mut self, now: Instant) -> Duration {
        self.tick(now)
    }

    /// Total handed out so far.
    pub fn flushed(&self) -> Duration {
        self.flushed
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn slices_sum_to_session_length() {
        let t0 = Instant::now();
        let mut clock = StudyClock::start(t0);

        assert_eq!(clock.tick(t0 + Duration::from_millis(1000)), Duration::from_millis(1000));
        assert_eq!(clock.tick(t0 + Duration::from_millis(2000)), Duration::from_millis(1000));
        assert_eq!(clock.flushed(), Duration::from_millis(2000));

        let last = clock.stop(t0 + Duration::from_millis(2350));
        assert_eq!(last, Duration::from_millis(350));
    }

    #[test]
    fn late_tick_carries_the_whole_gap() {
        let t0 = Instant::now();
        let mut clock = StudyClock::start(t0);
        assert_eq!(clock.tick(t0 + Duration::from_millis(2500)), Duration::from_millis(2500));
    }

    #[test]
    fn time_never_runs_backwards() {
        let t0 = Instant::now() + Duration::from_secs(5);
        let mut clock = StudyClock::start(t0);
        assert_eq!(clock.tick(t0 - Duration::from_secs(1)), Duration::ZERO);
        assert_eq!(clock.tick(t0 + Duration::from_millis(10)), Duration::from_millis(10));
        assert_eq!(clock.started_at(), t0);
    }

    #[test]
    fn sub_millisecond_remainder_carries_over() {
        let t0 = Instant::now();
        let mut clock = StudyClock::start(t0);
        assert_eq!(clock.tick(t0 + Duration::from_micros(1_600)), Duration::from_millis(1));
        assert_eq!(clock.stop(t0 + Duration::from_micros(3_200)), Duration::from_millis(2));
    }

    #[test]
    fn millis_conversion() {
        assert_eq!(duration_ms(Duration::from_micros(1_999)), 1);
        assert_eq!(duration_ms(DEFAULT_TICK), 1000);
    }
}
