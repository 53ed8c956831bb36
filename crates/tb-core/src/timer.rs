//! In-memory registry of running timers.
//!
//! A user has at most one running timer. Timers are volatile: a process
//! restart drops them, while completed entries live in the store.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::NaiveDate;
use thiserror::Error;

use crate::clock::Clock;
use crate::types::{TaskLabel, UserId};

/// Timer state conflicts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// The user already has a running timer.
    #[error("a timer is already running for '{label}'")]
    AlreadyRunning { label: String },
    /// The user has no running timer.
    #[error("no timer is running")]
    NotRunning,
}

#[derive(Debug, Clone)]
struct ActiveTimer {
    label: String,
    started: Instant,
    date: NaiveDate,
}

/// A freshly started timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedTimer {
    pub label: String,
    pub date: NaiveDate,
}

/// A stopped timer, ready to be persisted as a task entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoppedTimer {
    pub label: String,
    pub duration_secs: i64,
    /// The date the timer was started on.
    pub date: NaiveDate,
}

/// Registry of running timers keyed by user.
///
/// All operations take one short lock over the whole map, so start and stop
/// for the same user are serialized and two racing stops cannot both
/// observe the same timer.
pub struct ActiveTimerRegistry {
    clock: Arc<dyn Clock>,
    timers: Mutex<HashMap<UserId, ActiveTimer>>,
}

impl std::fmt::Debug for ActiveTimerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveTimerRegistry")
            .field("running", &self.timers().len())
            .finish_non_exhaustive()
    }
}

impl ActiveTimerRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            timers: Mutex::new(HashMap::new()),
        }
    }

    fn timers(&self) -> MutexGuard<'_, HashMap<UserId, ActiveTimer>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a timer for `user`.
    pub fn start(&self, user: UserId, label: TaskLabel) -> Result<StartedTimer, TimerError> {
        let mut timers = self.timers();
        match timers.entry(user) {
            Entry::Occupied(existing) => Err(TimerError::AlreadyRunning {
                label: existing.get().label.clone(),
            }),
            Entry::Vacant(slot) => {
                let timer = slot.insert(ActiveTimer {
                    label: label.into_inner(),
                    started: self.clock.monotonic(),
                    date: self.clock.local_today(),
                });
                tracing::info!(%user, label = %timer.label, "timer started");
                Ok(StartedTimer {
                    label: timer.label.clone(),
                    date: timer.date,
                })
            }
        }
    }

    /// Stops the user's timer and returns what was measured.
    pub fn stop(&self, user: UserId) -> Result<StoppedTimer, TimerError> {
        let timer = self.timers().remove(&user).ok_or(TimerError::NotRunning)?;
        let elapsed = self
            .clock
            .monotonic()
            .saturating_duration_since(timer.started);
        let duration_secs = i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX);
        tracing::info!(%user, label = %timer.label, duration_secs, "timer stopped");
        Ok(StoppedTimer {
            label: timer.label,
            duration_secs,
            date: timer.date,
        })
    }

    pub fn is_running(&self, user: UserId) -> bool {
        self.timers().contains_key(&user)
    }

    /// Label and elapsed whole seconds of the user's running timer.
    pub fn elapsed(&self, user: UserId) -> Option<(String, i64)> {
        let timers = self.timers();
        let timer = timers.get(&user)?;
        let elapsed = self
            .clock
            .monotonic()
            .saturating_duration_since(timer.started);
        Some((
            timer.label.clone(),
            i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{DateTime, Utc};

    use super::*;
    use crate::clock::ManualClock;

    fn setup() -> (Arc<ManualClock>, ActiveTimerRegistry) {
        let start = DateTime::parse_from_rfc3339("2025-03-10T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let clock = Arc::new(ManualClock::new(start));
        let registry = ActiveTimerRegistry::new(clock.clone());
        (clock, registry)
    }

    fn label(text: &str) -> TaskLabel {
        TaskLabel::new(text).unwrap()
    }

    #[test]
    fn second_start_reports_already_running() {
        let (_clock, registry) = setup();
        let user = UserId::new(1);

        registry.start(user, label("Task 1")).unwrap();
        let err = registry.start(user, label("Task 2")).unwrap_err();

        assert_eq!(
            err,
            TimerError::AlreadyRunning {
                label: "Task 1".to_string()
            }
        );
    }

    #[test]
    fn stop_without_start_reports_not_running() {
        let (_clock, registry) = setup();
        assert_eq!(
            registry.stop(UserId::new(1)),
            Err(TimerError::NotRunning)
        );
    }

    #[test]
    fn duration_matches_elapsed_time_exactly() {
        let (clock, registry) = setup();
        let user = UserId::new(7);

        let started = registry.start(user, label("Review")).unwrap();
        clock.advance(Duration::from_secs(3_725));
        let stopped = registry.stop(user).unwrap();

        assert_eq!(stopped.duration_secs, 3_725);
        assert_eq!(stopped.label, "Review");
        assert_eq!(stopped.date, started.date);
        assert!(!registry.is_running(user));
    }

    #[test]
    fn date_is_captured_at_start() {
        let (clock, registry) = setup();
        let user = UserId::new(3);

        registry.start(user, label("Night shift")).unwrap();
        clock.advance(Duration::from_secs(20 * 3600));
        let stopped = registry.stop(user).unwrap();

        assert_eq!(stopped.date.to_string(), "2025-03-10");
        assert_eq!(stopped.duration_secs, 72_000);
    }

    #[test]
    fn stopping_one_user_leaves_others_running() {
        let (clock, registry) = setup();
        let alice = UserId::new(1);
        let bob = UserId::new(2);

        registry.start(alice, label("A")).unwrap();
        registry.start(bob, label("B")).unwrap();
        clock.advance(Duration::from_secs(60));

        let stopped = registry.stop(alice).unwrap();
        assert_eq!(stopped.label, "A");
        assert!(registry.is_running(bob));
        assert_eq!(registry.elapsed(bob), Some(("B".to_string(), 60)));
    }

    #[test]
    fn racing_stops_produce_a_single_result() {
        let (_clock, registry) = setup();
        let user = UserId::new(9);
        registry.start(user, label("Race")).unwrap();

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let registry = &registry;
                    scope.spawn(move || registry.stop(user))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| **r == Err(TimerError::NotRunning))
                .count(),
            7
        );
    }

    #[test]
    fn racing_starts_admit_a_single_timer() {
        let (_clock, registry) = setup();
        let user = UserId::new(4);

        let started = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let registry = &registry;
                    scope.spawn(move || registry.start(user, label(&format!("T{i}"))))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(Result::is_ok)
                .count()
        });

        assert_eq!(started, 1);
    }
}
