// Monotonic time sources for lease expiry
//
// Lease deadlines are compared against `Instant`, never wall-clock time, so
// NTP steps or manual clock changes cannot extend or cut short a lease.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Seconds in one hour, used to turn lease `hours` into a `Duration`.
pub const SECS_PER_HOUR: f64 = 3600.0;

/// Source of monotonic instants
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> Instant;
}

/// Clock backed by `Instant::now`
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
///
/// Starts at the instant it was created and advances by explicit steps, which
/// lets tests cross a lease deadline without sleeping.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward by `step`
    pub fn advance(&self, step: Duration) {
        let mut offset = self.offset.lock();
        *offset += step;
    }

    /// Time elapsed since the clock was created
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock()
    }
}

/// Convert a lease length in hours to a `Duration`
///
/// Returns `None` for negative, non-finite or unrepresentably large values.
pub fn hours_to_duration(hours: f64) -> Option<Duration> {
    if !hours.is_finite() || hours < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(hours * SECS_PER_HOUR).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new();
        let start = clock.now();

        clock.advance(Duration::from_secs(5));
        assert_eq!(clock.now() - start, Duration::from_secs(5));
        assert_eq!(clock.elapsed(), Duration::from_secs(5));
    }

    #[test]
    fn test_hours_to_duration() {
        assert_eq!(hours_to_duration(1.0), Some(Duration::from_secs(3600)));
        assert_eq!(hours_to_duration(0.0), Some(Duration::ZERO));
        assert_eq!(hours_to_duration(0.001), Some(Duration::from_millis(3600)));
        assert_eq!(hours_to_duration(-1.0), None);
        assert_eq!(hours_to_duration(f64::NAN), None);
        assert_eq!(hours_to_duration(f64::INFINITY), None);
        assert_eq!(hours_to_duration(f64::MAX), None);
    }
}
