//! Report aggregation over stored task entries.
//!
//! All functions here are pure: they take entries already loaded from the
//! store and compute totals and groupings. An empty result is a valid report.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{NaiveDate, NaiveTime, TimeDelta};

use crate::types::{TaskEntry, UserId};

/// Entries recorded on one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateReport {
    pub date: NaiveDate,
    pub total_secs: i64,
    /// Ordered by end clock ascending.
    pub entries: Vec<TaskEntry>,
}

/// One date's share of a task report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaySummary {
    pub subtotal_secs: i64,
    /// In recorded order.
    pub entries: Vec<TaskEntry>,
}

/// Entries sharing one label, across all history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub label: String,
    pub total_secs: i64,
    pub per_date: BTreeMap<NaiveDate, DaySummary>,
}

impl DateReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TaskReport {
    pub fn is_empty(&self) -> bool {
        self.per_date.is_empty()
    }
}

/// Collects a user's entries for one date.
pub fn aggregate_by_date(entries: &[TaskEntry], user: UserId, date: NaiveDate) -> DateReport {
    let mut selected: Vec<TaskEntry> = entries
        .iter()
        .filter(|e| e.user_id == user && e.date == date)
        .cloned()
        .collect();
    selected.sort_by_key(|e| (e.end_clock, e.id));
    let total_secs = selected.iter().map(|e| e.duration_secs).sum();

    DateReport {
        date,
        total_secs,
        entries: selected,
    }
}

/// Collects a user's entries for one label, grouped by date ascending.
pub fn aggregate_by_task(entries: &[TaskEntry], user: UserId, label: &str) -> TaskReport {
    let mut selected: Vec<&TaskEntry> = entries
        .iter()
        .filter(|e| e.user_id == user && e.label == label)
        .collect();
    selected.sort_by_key(|e| e.id);

    let mut per_date: BTreeMap<NaiveDate, DaySummary> = BTreeMap::new();
    let mut total_secs = 0;
    for entry in selected {
        let day = per_date.entry(entry.date).or_default();
        day.subtotal_secs += entry.duration_secs;
        day.entries.push(entry.clone());
        total_secs += entry.duration_secs;
    }

    TaskReport {
        label: label.to_string(),
        total_secs,
        per_date,
    }
}

/// Formats seconds as `HH:MM:SS`.
///
/// Hours are not wrapped at 24. Negative input is shown as zero.
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Start clock derived from the recorded end clock.
///
/// Wraps around midnight, so a timer stopped at 00:10 after 30 minutes shows
/// a 23:40 start even though the entry's date is the start date.
pub fn derived_start(end_clock: NaiveTime, duration_secs: i64) -> NaiveTime {
    let (start, _) = end_clock.overflowing_sub_signed(TimeDelta::seconds(duration_secs.max(0)));
    start
}

fn clock_span(entry: &TaskEntry) -> String {
    let start = derived_start(entry.end_clock, entry.duration_secs);
    format!(
        "{}-{}",
        start.format("%H:%M"),
        entry.end_clock.format("%H:%M")
    )
}

/// Renders a date report as chat text.
pub fn render_date_report(report: &DateReport) -> String {
    if report.is_empty() {
        return format!("📊 No tasks recorded on {}.", report.date);
    }

    let mut out = String::new();
    writeln!(out, "📊 Report for {}", report.date).unwrap();
    writeln!(out).unwrap();
    writeln!(out, "Total time: {}", format_duration(report.total_secs)).unwrap();
    writeln!(out).unwrap();
    for entry in &report.entries {
        writeln!(
            out,
            "• {}: {} ({})",
            entry.label,
            format_duration(entry.duration_secs),
            clock_span(entry)
        )
        .unwrap();
        if let Some(description) = entry.description.as_deref().filter(|d| !d.is_empty()) {
            writeln!(out, "  └ {description}").unwrap();
        }
    }
    out
}

/// Renders a task report as chat text.
pub fn render_task_report(report: &TaskReport) -> String {
    if report.is_empty() {
        return format!("📁 No entries recorded for '{}'.", report.label);
    }

    let mut out = String::new();
    writeln!(out, "📁 Task: {}", report.label).unwrap();
    writeln!(out).unwrap();
    writeln!(out, "Total time: {}", format_duration(report.total_secs)).unwrap();
    for (date, day) in &report.per_date {
        writeln!(out).unwrap();
        writeln!(out, "{date}: {}", format_duration(day.subtotal_secs)).unwrap();
        for entry in &day.entries {
            writeln!(
                out,
                "  • {} ({})",
                clock_span(entry),
                format_duration(entry.duration_secs)
            )
            .unwrap();
            if let Some(description) = entry.description.as_deref().filter(|d| !d.is_empty()) {
                writeln!(out, "    └ {description}").unwrap();
            }
        }
    }
    out
}
