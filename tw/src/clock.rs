//! Time seams for the retry loop

use std::time::Duration;

use chrono::{Local, NaiveDate};
use tracing::debug;

/// Source of "today" for readiness comparisons
pub trait Clock {
    fn today(&self) -> NaiveDate;

    /// Wall-clock stamp for status output
    fn stamp(&self) -> String;
}

/// Blocks the calling thread between cycles
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

impl<S: Sleeper + ?Sized> Sleeper for &mut S {
    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Local wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn stamp(&self) -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Sleeps with `std::thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        debug!(secs = duration.as_secs(), "ThreadSleeper::sleep: blocking");
        std::thread::sleep(duration);
    }
}


#[cfg(test)]
mod tests {
    use super::mock::*;
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::ymd(2024, 1, 2);
        assert_eq!(clock.today().to_string(), "2024-01-02");
        assert_eq!(clock.stamp(), "2024-01-02 00:00:00");
    }

    #[test]
    fn test_recording_sleeper_does_not_block() {
        let mut sleeper = RecordingSleeper::default();
        sleeper.sleep(Duration::from_secs(3600));
        assert_eq!(sleeper.sleeps, vec![Duration::from_secs(3600)]);
    }
}
