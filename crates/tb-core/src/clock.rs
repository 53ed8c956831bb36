//! Wall-clock and monotonic time access.
//!
//! Everything that needs "now" goes through a [`Clock`] so that timers and
//! reports can be driven by a [`ManualClock`] in tests.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeDelta, Utc};

use crate::timezone::Timezone;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Monotonic instant used for measuring elapsed time.
    fn monotonic(&self) -> Instant;

    /// Current wall-clock time in UTC.
    fn utc_now(&self) -> DateTime<Utc>;

    /// Today's date in the process-local timezone.
    fn local_today(&self) -> NaiveDate;

    /// Current wall-clock time shifted into a user's timezone.
    fn now_in(&self, timezone: Timezone) -> NaiveDateTime {
        timezone.to_local(self.utc_now())
    }
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn monotonic(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock that only moves when told to.
///
/// The process-local timezone of a manual clock is UTC.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    start: DateTime<Utc>,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            origin: Instant::now(),
            start,
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    /// Moves both the monotonic and the wall clock forward.
    pub fn advance(&self, by: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(PoisonError::into_inner);
        *elapsed += by;
    }

    fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn monotonic(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        self.start + TimeDelta::from_std(self.elapsed()).unwrap_or(TimeDelta::MAX)
    }

    fn local_today(&self) -> NaiveDate {
        self.utc_now().date_naive()
    }
}
