//! Per-user conversation sessions.
//!
//! Sessions are volatile: they live in memory only, so a restart drops any
//! half-finished dialog while timers and stored entries are unaffected.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tb_core::UserId;
use tokio::sync::OwnedMutexGuard;

/// The step a user's dialog is at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingTaskName,
    AwaitingDescriptionChoice,
    AwaitingDescriptionText,
    AwaitingReportDate,
    AwaitingTimezoneChoice,
    AwaitingCustomTimezone,
    AwaitingReportsMenuChoice,
    AwaitingBroadcastBody,
    AwaitingMsgToAllBody,
    /// Driven by calendar button callbacks.
    AwaitingCalendarPick,
    /// Driven by task button callbacks.
    AwaitingTaskPick,
}

impl SessionState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingTaskName => "awaiting_task_name",
            Self::AwaitingDescriptionChoice => "awaiting_description_choice",
            Self::AwaitingDescriptionText => "awaiting_description_text",
            Self::AwaitingReportDate => "awaiting_report_date",
            Self::AwaitingTimezoneChoice => "awaiting_timezone_choice",
            Self::AwaitingCustomTimezone => "awaiting_custom_timezone",
            Self::AwaitingReportsMenuChoice => "awaiting_reports_menu_choice",
            Self::AwaitingBroadcastBody => "awaiting_broadcast_body",
            Self::AwaitingMsgToAllBody => "awaiting_msg_to_all_body",
            Self::AwaitingCalendarPick => "awaiting_calendar_pick",
            Self::AwaitingTaskPick => "awaiting_task_pick",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's dialog state and the transient values it carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub state: SessionState,
    /// Entry waiting for a description.
    pub pending_entry: Option<i64>,
    /// Labels offered in the task picker, addressed by index.
    pub offered_tasks: Vec<String>,
}

impl Session {
    pub fn in_state(state: SessionState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }
}

/// Session map shared by all handlers.
#[derive(Debug, Default)]
pub struct Sessions {
    inner: Mutex<HashMap<UserId, Session>>,
}

impl Sessions {
    fn map(&self) -> MutexGuard<'_, HashMap<UserId, Session>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the user's session, `Idle` if none exists.
    pub fn get(&self, user: UserId) -> Session {
        self.map().get(&user).cloned().unwrap_or_default()
    }

    pub fn state(&self, user: UserId) -> SessionState {
        self.map()
            .get(&user)
            .map_or(SessionState::Idle, |session| session.state)
    }

    pub fn set(&self, user: UserId, session: Session) {
        let previous = {
            let mut map = self.map();
            if session.state == SessionState::Idle {
                map.remove(&user)
            } else {
                map.insert(user, session.clone())
            }
        };
        let from = previous.map_or(SessionState::Idle, |s| s.state);
        if from != session.state {
            tracing::debug!(%user, %from, to = %session.state, "session transition");
        }
    }

    /// Moves the user to `state`, dropping all transient fields.
    pub fn transition(&self, user: UserId, state: SessionState) {
        self.set(user, Session::in_state(state));
    }

    /// Clears the user's session back to `Idle`.
    pub fn reset(&self, user: UserId) {
        self.set(user, Session::default());
    }
}

/// One async lock per user.
///
/// Holding a user's guard serializes every handler for that user while other
/// users proceed independently. Locks nobody holds or waits on are dropped.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    pub async fn lock(&self, user: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(user).or_default())
        };
        lock.lock_owned().await
    }
}
