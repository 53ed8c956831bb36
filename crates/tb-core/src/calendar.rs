//! Month grid used as a date picker.
//!
//! A grid is a pure function of the month it shows, so navigating back and
//! forth re-renders the same layout every time.

use chrono::{Datelike, NaiveDate};

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthCursor {
    year: i32,
    month: u32,
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

impl MonthCursor {
    /// Returns `None` unless `month` is in `1..=12` and the year is representable.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub const fn year(self) -> i32 {
        self.year
    }

    pub const fn month(self) -> u32 {
        self.month
    }

    /// The previous month, wrapping January back to December.
    pub const fn prev(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// The next month, wrapping December forward to January.
    pub const fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Title such as `March 2025`.
    pub fn title(self) -> String {
        format!("{} {}", MONTH_NAMES[(self.month - 1) as usize], self.year)
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn days_in_month(self) -> u32 {
        let (Some(first), Some(next)) = (self.first_day(), self.next().first_day()) else {
            return 31;
        };
        u32::try_from((next - first).num_days()).unwrap_or(31)
    }

    /// `YYYY-MM` form used in callback payloads.
    pub fn key(self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Parses the `YYYY-MM` form produced by [`MonthCursor::key`].
    pub fn parse_key(key: &str) -> Option<Self> {
        let (year, month) = key.split_once('-')?;
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }
}

/// One cell of the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarCell {
    /// Navigate to the given (previous) month.
    Prev(MonthCursor),
    /// Non-interactive month title.
    Title(String),
    /// Navigate to the given (next) month.
    Next(MonthCursor),
    /// Padding before the first day.
    Blank,
    Day(NaiveDate),
    Cancel,
}

/// A rendered month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarGrid {
    pub month: MonthCursor,
    pub rows: Vec<Vec<CalendarCell>>,
}

/// Number of blank cells before the first day of the month.
///
/// Computed as `(days_from_monday(first) + 1) mod 7`.
pub fn leading_blanks(first: NaiveDate) -> usize {
    (first.weekday().num_days_from_monday() as usize + 1) % 7
}

/// Builds the grid for a month.
///
/// Row 0 is navigation, then weeks of seven cells (the last one may be
/// shorter), then a single cancel cell.
pub fn build(month: MonthCursor) -> CalendarGrid {
    let mut rows = vec![vec![
        CalendarCell::Prev(month.prev()),
        CalendarCell::Title(month.title()),
        CalendarCell::Next(month.next()),
    ]];

    if let Some(first) = month.first_day() {
        let mut week: Vec<CalendarCell> = vec![CalendarCell::Blank; leading_blanks(first)];
        for day in first.iter_days().take(month.days_in_month() as usize) {
            week.push(CalendarCell::Day(day));
            if week.len() == 7 {
                rows.push(std::mem::take(&mut week));
            }
        }
        if !week.is_empty() {
            rows.push(week);
        }
    }

    rows.push(vec![CalendarCell::Cancel]);
    CalendarGrid { month, rows }
}
