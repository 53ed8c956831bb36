//! Core domain logic for the time tracking bot.
//!
//! This crate contains the fundamental types and logic for:
//! - Timers: the in-memory registry of running timers, one per user
//! - Reports: per-date and per-task aggregation, duration formatting, CSV export
//! - Calendar: the month grid used as a date picker
//! - Timezones: the fixed table of supported named offsets

pub mod calendar;
pub mod clock;
pub mod csv_export;
pub mod report;
pub mod stats;
pub mod timer;
pub mod timezone;
pub mod types;

pub use calendar::{CalendarCell, CalendarGrid, MonthCursor};
pub use clock::{Clock, ManualClock, SystemClock};
pub use report::{DateReport, DaySummary, TaskReport, aggregate_by_date, aggregate_by_task, format_duration};
pub use timer::{ActiveTimerRegistry, StartedTimer, StoppedTimer, TimerError};
pub use timezone::Timezone;
pub use types::{TaskEntry, TaskLabel, UserId, ValidationError};
