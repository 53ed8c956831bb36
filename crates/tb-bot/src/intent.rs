//! Normalization of inbound events into intents.
//!
//! Button labels are display text only. Everything the state machine matches
//! on is produced here, so the handlers never compare against label strings.

use chrono::NaiveDate;
use tb_core::MonthCursor;

use crate::messenger::{EventKind, MessageRef};

pub const START: &str = "⏰ Start";
pub const STOP: &str = "⏹️ Stop";
pub const TODAY: &str = "📊 Today";
pub const REPORTS: &str = "📁 Reports";
pub const TIMEZONE: &str = "🌍 Timezone";
pub const BY_DATE: &str = "📅 By date";
pub const ENTER_DATE: &str = "⌨️ Enter date";
pub const BY_TASK: &str = "🗂 By task";
pub const CSV_EXPORT: &str = "📄 CSV export";
pub const BACK: &str = "⬅️ Back";
pub const YES: &str = "✅ Yes";
pub const NO: &str = "❌ No";
pub const CANCEL: &str = "✖️ Cancel";
pub const OTHER: &str = "🌐 Other";
pub const SKIP: &str = "⏭ Skip";

/// What a text message or button press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Start,
    Stop,
    Today,
    Reports,
    Timezone,
    ByDate,
    EnterDate,
    ByTask,
    CsvExport,
    Back,
    Yes,
    No,
    Cancel,
    Other,
    Skip,
}

impl Intent {
    /// Recognizes button labels and their bare keywords, case-insensitively.
    pub fn from_text(text: &str) -> Option<Self> {
        let normalized = text
            .trim()
            .trim_start_matches(|c: char| !c.is_alphanumeric())
            .trim()
            .to_lowercase();
        let intent = match normalized.as_str() {
            "start" => Self::Start,
            "stop" => Self::Stop,
            "today" => Self::Today,
            "reports" => Self::Reports,
            "timezone" => Self::Timezone,
            "by date" => Self::ByDate,
            "enter date" => Self::EnterDate,
            "by task" => Self::ByTask,
            "csv export" | "csv" => Self::CsvExport,
            "back" => Self::Back,
            "yes" => Self::Yes,
            "no" => Self::No,
            "cancel" => Self::Cancel,
            "other" => Self::Other,
            "skip" => Self::Skip,
            _ => return None,
        };
        Some(intent)
    }
}

/// A slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Welcome,
    Help,
    Cancel,
    Timezone,
    Today,
    Reports,
    Stats,
    UserInfo(String),
    TogglePremium(String),
    Broadcast,
    MessageAll,
    Unknown(String),
}

impl Command {
    pub fn parse(name: &str, args: &str) -> Self {
        let name = name.trim().trim_start_matches('/');
        // Group chats address commands as /name@botname.
        let name = name.split('@').next().unwrap_or(name).to_lowercase();
        let args = args.trim().to_string();
        match name.as_str() {
            "start" => Self::Welcome,
            "help" => Self::Help,
            "cancel" => Self::Cancel,
            "timezone" => Self::Timezone,
            "today" => Self::Today,
            "reports" => Self::Reports,
            "stats" => Self::Stats,
            "user" => Self::UserInfo(args),
            "premium" => Self::TogglePremium(args),
            "broadcast" => Self::Broadcast,
            "msgall" => Self::MessageAll,
            _ => Self::Unknown(name),
        }
    }

    /// Commands only administrators may run.
    pub const fn is_admin_only(&self) -> bool {
        matches!(
            self,
            Self::Stats | Self::UserInfo(_) | Self::TogglePremium(_) | Self::Broadcast | Self::MessageAll
        )
    }
}

/// An inline button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callback {
    CalendarNavigate(MonthCursor),
    CalendarDay(NaiveDate),
    CalendarCancel,
    /// Title or padding cell.
    Noop,
    /// Index into the task list offered in the session.
    TaskPick(usize),
}

impl Callback {
    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.splitn(3, ':');
        let callback = match (parts.next()?, parts.next(), parts.next()) {
            ("cal", Some("nav"), Some(month)) => Self::CalendarNavigate(MonthCursor::parse_key(month)?),
            ("cal", Some("day"), Some(day)) => {
                Self::CalendarDay(NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?)
            }
            ("cal", Some("cancel"), None) => Self::CalendarCancel,
            ("cal", Some("noop"), None) => Self::Noop,
            ("task", Some(index), None) => Self::TaskPick(index.parse().ok()?),
            _ => return None,
        };
        Some(callback)
    }

    pub fn encode(self) -> String {
        match self {
            Self::CalendarNavigate(month) => format!("cal:nav:{}", month.key()),
            Self::CalendarDay(day) => format!("cal:day:{}", day.format("%Y-%m-%d")),
            Self::CalendarCancel => "cal:cancel".to_string(),
            Self::Noop => "cal:noop".to_string(),
            Self::TaskPick(index) => format!("task:{index}"),
        }
    }
}

/// A normalized inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Text(String),
    Command(Command),
    Callback {
        callback: Option<Callback>,
        message: MessageRef,
    },
    Photo {
        file_id: String,
        caption: Option<String>,
    },
    Payment {
        payload: String,
    },
}

impl Input {
    pub fn from_event(event: &EventKind) -> Self {
        match event {
            EventKind::Text { text } => {
                if let Some(command) = text.trim().strip_prefix('/') {
                    let (name, args) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
                    Self::Command(Command::parse(name, args))
                } else {
                    Self::Text(text.clone())
                }
            }
            EventKind::Command { name, args } => Self::Command(Command::parse(name, args)),
            EventKind::Callback { data, message } => Self::Callback {
                callback: Callback::parse(data),
                message: *message,
            },
            EventKind::Photo { file_id, caption } => Self::Photo {
                file_id: file_id.clone(),
                caption: caption.clone(),
            },
            EventKind::PaymentConfirmation { payload } => Self::Payment {
                payload: payload.clone(),
            },
        }
    }
}
