//! Usage statistics shown to administrators.

use std::fmt::Write;

use chrono::{NaiveDate, TimeDelta};

use crate::report::format_duration;
use crate::timezone::Timezone;
use crate::types::UserId;

/// How far back a user counts as active.
pub const ACTIVE_WINDOW_DAYS: i64 = 7;

/// First date inside the activity window ending today (inclusive).
pub fn active_since(today: NaiveDate) -> NaiveDate {
    today - TimeDelta::days(ACTIVE_WINDOW_DAYS)
}

/// Mean tracked seconds per user, zero when nobody tracked anything.
pub const fn mean_secs(total_secs: i64, users: i64) -> i64 {
    if users <= 0 { 0 } else { total_secs / users }
}

/// Statistics over every user and entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalStats {
    pub total_users: i64,
    pub premium_users: i64,
    /// Users with at least one entry.
    pub tracking_users: i64,
    /// Users with an entry dated within the activity window.
    pub active_users: i64,
    pub total_entries: i64,
    pub total_secs: i64,
}

impl GlobalStats {
    pub const fn mean_secs_per_user(&self) -> i64 {
        mean_secs(self.total_secs, self.tracking_users)
    }
}

/// Statistics for a single user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStats {
    pub user_id: UserId,
    pub name: String,
    pub joined: NaiveDate,
    pub is_admin: bool,
    pub is_premium: bool,
    pub timezone: Option<Timezone>,
    pub total_entries: i64,
    pub total_secs: i64,
    pub distinct_labels: i64,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

pub fn render_global_stats(stats: &GlobalStats) -> String {
    let mut out = String::new();
    writeln!(out, "📈 Bot statistics").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "Users: {}", stats.total_users).unwrap();
    writeln!(out, "Premium users: {}", stats.premium_users).unwrap();
    writeln!(out, "Users tracking time: {}", stats.tracking_users).unwrap();
    writeln!(
        out,
        "Active in the last {ACTIVE_WINDOW_DAYS} days: {}",
        stats.active_users
    )
    .unwrap();
    writeln!(out, "Entries: {}", stats.total_entries).unwrap();
    writeln!(out, "Total time: {}", format_duration(stats.total_secs)).unwrap();
    writeln!(
        out,
        "Mean per user: {}",
        format_duration(stats.mean_secs_per_user())
    )
    .unwrap();
    out
}

pub fn render_user_stats(stats: &UserStats) -> String {
    let flag = |on: bool| if on { "yes" } else { "no" };
    let mut out = String::new();
    writeln!(out, "👤 {} ({})", stats.name, stats.user_id).unwrap();
    writeln!(out).unwrap();
    writeln!(out, "Joined: {}", stats.joined).unwrap();
    writeln!(out, "Admin: {}", flag(stats.is_admin)).unwrap();
    writeln!(out, "Premium: {}", flag(stats.is_premium)).unwrap();
    writeln!(
        out,
        "Timezone: {}",
        stats.timezone.map_or_else(|| "not set".to_string(), Timezone::label)
    )
    .unwrap();
    writeln!(out, "Entries: {}", stats.total_entries).unwrap();
    writeln!(out, "Distinct tasks: {}", stats.distinct_labels).unwrap();
    writeln!(out, "Total time: {}", format_duration(stats.total_secs)).unwrap();
    if let (Some(first), Some(last)) = (stats.first_date, stats.last_date) {
        writeln!(out, "Tracked from {first} to {last}").unwrap();
    }
    out
}
