//! Storage layer for the time tracking bot.
//!
//! Provides persistence for users, completed task entries and timezone
//! preferences using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! The bot shares one instance behind a `Mutex<Database>` and holds the lock for
//! a single statement or transaction at a time.
//!
//! # Schema
//!
//! Dates are stored as TEXT in `YYYY-MM-DD` form so that lexicographic ordering
//! matches chronological ordering. End clocks are stored as `HH:MM` in the
//! user's timezone at the moment the timer stopped.

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tb_core::stats::{GlobalStats, UserStats};
use tb_core::types::{format_clock, parse_clock};
use tb_core::{TaskEntry, Timezone, UserId};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored date could not be parsed.
    #[error("invalid date '{value}' in {table}")]
    InvalidDate { table: &'static str, value: String },
    /// A stored end clock could not be parsed.
    #[error("invalid clock '{value}' for task {task_id}")]
    InvalidClock { task_id: i64, value: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub join_date: NaiveDate,
    pub is_admin: bool,
    pub is_premium: bool,
}

/// A task entry about to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub user_id: UserId,
    pub label: String,
    pub duration_secs: i64,
    pub date: NaiveDate,
    pub end_clock: chrono::NaiveTime,
}

/// Raw task row before date/clock parsing.
struct TaskRow {
    id: i64,
    user_id: i64,
    label: String,
    duration_secs: i64,
    date: String,
    end_clock: String,
    description: Option<String>,
}

const TASK_COLUMNS: &str = "id, user_id, label, duration_secs, date, end_clock, description";

impl TaskRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            label: row.get(2)?,
            duration_secs: row.get(3)?,
            date: row.get(4)?,
            end_clock: row.get(5)?,
            description: row.get(6)?,
        })
    }

    fn into_entry(self) -> Result<TaskEntry, DbError> {
        let date = parse_date(&self.date, "tasks")?;
        let end_clock = parse_clock(&self.end_clock).ok_or_else(|| DbError::InvalidClock {
            task_id: self.id,
            value: self.end_clock.clone(),
        })?;
        Ok(TaskEntry {
            id: self.id,
            user_id: UserId::new(self.user_id),
            label: self.label,
            duration_secs: self.duration_secs,
            date,
            end_clock,
            description: self.description,
        })
    }
}

fn parse_date(value: &str, table: &'static str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| DbError::InvalidDate {
        table,
        value: value.to_string(),
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                join_date TEXT NOT NULL,
                is_admin INTEGER NOT NULL DEFAULT 0,
                is_premium INTEGER NOT NULL DEFAULT 0
            );

            -- date: the date the timer was started (YYYY-MM-DD)
            -- end_clock: local stop time (HH:MM)
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                label TEXT NOT NULL,
                duration_secs INTEGER NOT NULL CHECK (duration_secs >= 0),
                date TEXT NOT NULL,
                end_clock TEXT NOT NULL,
                description TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_user_date ON tasks(user_id, date);
            CREATE INDEX IF NOT EXISTS idx_tasks_user_label ON tasks(user_id, label);

            CREATE TABLE IF NOT EXISTS user_timezones (
                user_id INTEGER PRIMARY KEY,
                timezone TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    // ========== Users ==========

    /// Registers a user on first contact and returns the stored record.
    ///
    /// Existing users keep their name, join date and premium flag; the admin
    /// flag follows `is_admin` so configuration changes take effect.
    pub fn ensure_user(
        &mut self,
        id: UserId,
        name: &str,
        join_date: NaiveDate,
        is_admin: bool,
    ) -> Result<UserRecord, DbError> {
        let tx = self.conn.transaction()?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO users (id, name, join_date, is_admin, is_premium) VALUES (?, ?, ?, ?, 0)",
            params![id.get(), name, format_date(join_date), is_admin],
        )?;
        tx.execute(
            "UPDATE users SET is_admin = ? WHERE id = ?",
            params![is_admin, id.get()],
        )?;
        tx.commit()?;
        if inserted > 0 {
            tracing::info!(user = %id, "registered new user");
        }
        self.user(id)?.ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Looks up a user by ID.
    pub fn user(&self, id: UserId) -> Result<Option<UserRecord>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, join_date, is_admin, is_premium FROM users WHERE id = ?",
                [id.get()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, bool>(3)?,
                        row.get::<_, bool>(4)?,
                    ))
                },
            )
            .optional()?;
        row.map(|(id, name, join_date, is_admin, is_premium)| {
            Ok(UserRecord {
                id: UserId::new(id),
                name,
                join_date: parse_date(&join_date, "users")?,
                is_admin,
                is_premium,
            })
        })
        .transpose()
    }

    /// Sets the premium flag. Returns `false` if the user is unknown.
    pub fn set_premium(&mut self, id: UserId, premium: bool) -> Result<bool, DbError> {
        let updated = self.conn.execute(
            "UPDATE users SET is_premium = ? WHERE id = ?",
            params![premium, id.get()],
        )?;
        Ok(updated > 0)
    }

    /// Flips the premium flag and returns the new value, or `None` for an unknown user.
    pub fn toggle_premium(&mut self, id: UserId) -> Result<Option<bool>, DbError> {
        let tx = self.conn.transaction()?;
        let current: Option<bool> = tx
            .query_row(
                "SELECT is_premium FROM users WHERE id = ?",
                [id.get()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(current) = current else {
            return Ok(None);
        };
        tx.execute(
            "UPDATE users SET is_premium = ? WHERE id = ?",
            params![!current, id.get()],
        )?;
        tx.commit()?;
        Ok(Some(!current))
    }

    pub fn is_premium(&self, id: UserId) -> Result<bool, DbError> {
        let premium: Option<bool> = self
            .conn
            .query_row(
                "SELECT is_premium FROM users WHERE id = ?",
                [id.get()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(premium.unwrap_or(false))
    }

    /// Lists every registered user ID in ascending order.
    pub fn user_ids(&self) -> Result<Vec<UserId>, DbError> {
        let mut stmt = self.conn.prepare("SELECT id FROM users ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(UserId::new(row?));
        }
        Ok(ids)
    }

    /// Lists users with at least one entry dated on or after `since`.
    pub fn active_user_ids(&self, since: NaiveDate) -> Result<Vec<UserId>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT user_id FROM tasks WHERE date >= ? ORDER BY user_id ASC",
        )?;
        let rows = stmt.query_map([format_date(since)], |row| row.get::<_, i64>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(UserId::new(row?));
        }
        Ok(ids)
    }

    // ========== Timezones ==========

    /// Returns the user's timezone, or `None` if none is on file.
    ///
    /// A stored name that is no longer supported reads as `None`.
    pub fn timezone(&self, id: UserId) -> Result<Option<Timezone>, DbError> {
        let name: Option<String> = self
            .conn
            .query_row(
                "SELECT timezone FROM user_timezones WHERE user_id = ?",
                [id.get()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name.and_then(|name| name.parse().ok()))
    }

    pub fn set_timezone(&mut self, id: UserId, timezone: Timezone) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO user_timezones (user_id, timezone) VALUES (?, ?)
            ON CONFLICT(user_id) DO UPDATE SET timezone = excluded.timezone
            ",
            params![id.get(), timezone.name()],
        )?;
        Ok(())
    }

    // ========== Tasks ==========

    /// Stores a completed task and returns its ID.
    pub fn insert_task(&mut self, task: &NewTask) -> Result<i64, DbError> {
        self.conn.execute(
            "
            INSERT INTO tasks (user_id, label, duration_secs, date, end_clock)
            VALUES (?, ?, ?, ?, ?)
            ",
            params![
                task.user_id.get(),
                task.label,
                task.duration_secs.max(0),
                format_date(task.date),
                format_clock(task.end_clock),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Attaches a description to a task owned by `user_id`.
    ///
    /// Only a task without a description is updated. Returns whether a row changed.
    pub fn set_description(
        &mut self,
        task_id: i64,
        user_id: UserId,
        description: &str,
    ) -> Result<bool, DbError> {
        let updated = self.conn.execute(
            "UPDATE tasks SET description = ? WHERE id = ? AND user_id = ? AND description IS NULL",
            params![description, task_id, user_id.get()],
        )?;
        Ok(updated > 0)
    }

    fn query_tasks(&self, filter: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<TaskEntry>, DbError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE {filter} ORDER BY id ASC"))?;
        let rows = stmt.query_map(args, TaskRow::from_row)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.into_entry()?);
        }
        Ok(entries)
    }

    /// Lists a user's entries dated `date`.
    pub fn tasks_on(&self, user_id: UserId, date: NaiveDate) -> Result<Vec<TaskEntry>, DbError> {
        self.query_tasks(
            "user_id = ? AND date = ?",
            params![user_id.get(), format_date(date)],
        )
    }

    /// Lists a user's entries with the given label.
    pub fn tasks_labelled(&self, user_id: UserId, label: &str) -> Result<Vec<TaskEntry>, DbError> {
        self.query_tasks("user_id = ? AND label = ?", params![user_id.get(), label])
    }

    /// Lists all of a user's entries.
    pub fn tasks_for_user(&self, user_id: UserId) -> Result<Vec<TaskEntry>, DbError> {
        self.query_tasks("user_id = ?", params![user_id.get()])
    }

    /// Distinct labels a user has recorded, sorted.
    pub fn distinct_labels(&self, user_id: UserId) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT label FROM tasks WHERE user_id = ? ORDER BY label ASC",
        )?;
        let rows = stmt.query_map([user_id.get()], |row| row.get::<_, String>(0))?;
        let mut labels = Vec::new();
        for row in rows {
            labels.push(row?);
        }
        Ok(labels)
    }

    // ========== Statistics ==========

    fn count(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<i64, DbError> {
        Ok(self.conn.query_row(sql, args, |row| row.get(0))?)
    }

    /// Computes statistics over all users; `active_since` bounds the activity window.
    pub fn global_stats(&self, active_since: NaiveDate) -> Result<GlobalStats, DbError> {
        Ok(GlobalStats {
            total_users: self.count("SELECT COUNT(*) FROM users", params![])?,
            premium_users: self.count("SELECT COUNT(*) FROM users WHERE is_premium = 1", params![])?,
            tracking_users: self.count("SELECT COUNT(DISTINCT user_id) FROM tasks", params![])?,
            active_users: self.count(
                "SELECT COUNT(DISTINCT user_id) FROM tasks WHERE date >= ?",
                params![format_date(active_since)],
            )?,
            total_entries: self.count("SELECT COUNT(*) FROM tasks", params![])?,
            total_secs: self.count("SELECT COALESCE(SUM(duration_secs), 0) FROM tasks", params![])?,
        })
    }

    /// Computes statistics for one user, or `None` if the user is unknown.
    pub fn user_stats(&self, id: UserId) -> Result<Option<UserStats>, DbError> {
        let Some(user) = self.user(id)? else {
            return Ok(None);
        };
        let timezone = self.timezone(id)?;
        let (total_entries, total_secs, distinct_labels, first, last) = self.conn.query_row(
            "
            SELECT COUNT(*), COALESCE(SUM(duration_secs), 0), COUNT(DISTINCT label), MIN(date), MAX(date)
            FROM tasks
            WHERE user_id = ?
            ",
            [id.get()],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            },
        )?;

        Ok(Some(UserStats {
            user_id: user.id,
            name: user.name,
            joined: user.join_date,
            is_admin: user.is_admin,
            is_premium: user.is_premium,
            timezone,
            total_entries,
            total_secs,
            distinct_labels,
            first_date: first.as_deref().map(|d| parse_date(d, "tasks")).transpose()?,
            last_date: last.as_deref().map(|d| parse_date(d, "tasks")).transpose()?,
        }))
    }
}
