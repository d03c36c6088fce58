//! Flush policy: when accumulated mutations are written to storage

use emissor_common::time::millis_to_duration;
use std::time::{Duration, Instant};

/// Tick period used when an interval of zero asks for flush-on-every-tick
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Flush after every mutating input
    Immediate,
    /// Flush when dirty and at least this long since the last flush
    Interval(Duration),
    /// Never flush by policy; only scenario boundaries persist
    Explicit,
}

impl FlushPolicy {
    /// Policy for the configured settings
    ///
    /// `interval_ms`: absent or negative -> explicit, 0 -> every tick,
    /// N -> batched by N milliseconds.
    pub fn from_settings(immediate: bool, interval_ms: Option<i64>) -> Self {
        if immediate {
            return FlushPolicy::Immediate;
        }

        match interval_ms {
            Some(ms) if ms >= 0 => FlushPolicy::Interval(millis_to_duration(ms as u64)),
            _ => FlushPolicy::Explicit,
        }
    }

    /// Period of the timer tick this policy needs, if any
    pub fn tick_period(&self) -> Option<Duration> {
        match self {
            FlushPolicy::Interval(d) if d.is_zero() => Some(DEFAULT_TICK_PERIOD),
            FlushPolicy::Interval(d) => Some(*d),
            FlushPolicy::Immediate | FlushPolicy::Explicit => None,
        }
    }
}

/// Tracks the last flush and decides whether the next one is due
#[derive(Debug, Clone)]
pub struct FlushScheduler {
    policy: FlushPolicy,
    last_flush: Instant,
}

impl FlushScheduler {
    pub fn new(policy: FlushPolicy) -> Self {
        Self::new_at(policy, Instant::now())
    }

    pub fn new_at(policy: FlushPolicy, now: Instant) -> Self {
        Self {
            policy,
            last_flush: now,
        }
    }

    pub fn policy(&self) -> FlushPolicy {
        self.policy
    }

    /// Whether a session with the given dirty state should flush at `now`
    pub fn due(&self, dirty: bool, now: Instant) -> bool {
        if !dirty {
            return false;
        }

        match self.policy {
            FlushPolicy::Immediate => true,
            FlushPolicy::Interval(interval) => now.saturating_duration_since(self.last_flush) >= interval,
            FlushPolicy::Explicit => false,
        }
    }

    pub fn record_flush(&mut self, now: Instant) {
        self.last_flush = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_settings() {
        assert_eq!(FlushPolicy::from_settings(false, None), FlushPolicy::Explicit);
        assert_eq!(FlushPolicy::from_settings(false, Some(-1)), FlushPolicy::Explicit);
        assert_eq!(
            FlushPolicy::from_settings(false, Some(0)),
            FlushPolicy::Interval(Duration::ZERO)
        );
        assert_eq!(
            FlushPolicy::from_settings(false, Some(250)),
            FlushPolicy::Interval(Duration::from_millis(250))
        );
        assert_eq!(FlushPolicy::from_settings(true, Some(250)), FlushPolicy::Immediate);
    }

    #[test]
    fn test_tick_period() {
        assert_eq!(FlushPolicy::Explicit.tick_period(), None);
        assert_eq!(FlushPolicy::Immediate.tick_period(), None);
        assert_eq!(
            FlushPolicy::Interval(Duration::ZERO).tick_period(),
            Some(DEFAULT_TICK_PERIOD)
        );
        assert_eq!(
            FlushPolicy::Interval(Duration::from_millis(40)).tick_period(),
            Some(Duration::from_millis(40))
        );
    }

    #[test]
    fn test_interval_waits_for_elapsed_time() {
        let start = Instant::now();
        let mut scheduler = FlushScheduler::new_at(FlushPolicy::Interval(Duration::from_secs(10)), start);

        assert!(!scheduler.due(true, start + Duration::from_secs(5)));
        assert!(scheduler.due(true, start + Duration::from_secs(10)));
        assert!(!scheduler.due(false, start + Duration::from_secs(60)));

        scheduler.record_flush(start + Duration::from_secs(10));
        assert!(!scheduler.due(true, start + Duration::from_secs(15)));
    }

    #[test]
    fn test_zero_interval_flushes_whenever_dirty() {
        let start = Instant::now();
        let scheduler = FlushScheduler::new_at(FlushPolicy::Interval(Duration::ZERO), start);

        assert!(scheduler.due(true, start));
        assert!(!scheduler.due(false, start));
    }

    #[test]
    fn test_immediate_and_explicit() {
        let now = Instant::now();
        assert!(FlushScheduler::new_at(FlushPolicy::Immediate, now).due(true, now));
        assert!(!FlushScheduler::new_at(FlushPolicy::Explicit, now).due(true, now + Duration::from_secs(3600)));
    }
}
