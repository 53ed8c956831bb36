//! Handler error taxonomy.

use tb_core::{TimerError, ValidationError};
use tb_db::DbError;
use thiserror::Error;

use crate::messenger::MessengerError;

/// Errors raised while handling an inbound event.
///
/// Conflict, not-found, validation and delivery errors are recovered at the
/// handler boundary: the user gets a message and the session resets. Store and
/// transport errors are fatal and stop the process.
#[derive(Debug, Error)]
pub enum BotError {
    /// A timer was already running, or none was.
    #[error(transparent)]
    Conflict(#[from] TimerError),
    /// A referenced record does not exist.
    #[error("{what} not found")]
    NotFound { what: String },
    /// User input was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A single message could not be delivered.
    #[error("delivery failed: {0}")]
    TransientDelivery(#[source] MessengerError),
    /// Building an export failed.
    #[error("export failed: {0}")]
    Export(#[from] csv::Error),
    /// The store is unavailable.
    #[error("store error: {0}")]
    Store(#[from] DbError),
    /// The chat transport is unavailable.
    #[error("transport error: {0}")]
    Transport(#[source] MessengerError),
}

impl BotError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Transport(_))
    }

    /// Text shown to the user when the error is recovered.
    pub fn user_message(&self) -> String {
        match self {
            Self::Conflict(TimerError::AlreadyRunning { label }) => {
                format!("⏳ A timer is already running for '{label}'. Stop it first.")
            }
            Self::Conflict(TimerError::NotRunning) => {
                "No timer is running. Press ⏰ Start to begin.".to_string()
            }
            Self::NotFound { what } => format!("🤷 Couldn't find {what}."),
            Self::Validation(err) => format!("⚠️ {err}"),
            Self::TransientDelivery(_) => "⚠️ A message could not be delivered.".to_string(),
            Self::Export(_) => "⚠️ The export could not be built. Please try again.".to_string(),
            Self::Store(_) | Self::Transport(_) => {
                "⚠️ Something went wrong. Please try again later.".to_string()
            }
        }
    }
}

impl From<MessengerError> for BotError {
    /// Per-recipient failures are transient; anything else means the transport is down.
    fn from(err: MessengerError) -> Self {
        if err.is_per_recipient() {
            Self::TransientDelivery(err)
        } else {
            Self::Transport(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use tb_core::UserId;

    use super::*;

    #[test]
    fn store_and_transport_errors_are_fatal() {
        let store = BotError::from(DbError::InvalidDate {
            table: "tasks",
            value: "yesterday".to_string(),
        });
        assert!(store.is_fatal());

        let transport = BotError::from(MessengerError::Unavailable("down".to_string()));
        assert!(transport.is_fatal());
    }

    #[test]
    fn user_facing_errors_are_recoverable() {
        let errors = [
            BotError::from(TimerError::NotRunning),
            BotError::not_found("the last task"),
            BotError::from(ValidationError::InvalidDate {
                value: "2025-13-40".to_string(),
            }),
            BotError::from(MessengerError::Unreachable {
                user: UserId::new(1),
                reason: "blocked".to_string(),
            }),
        ];
        for err in errors {
            assert!(!err.is_fatal(), "{err}");
        }
    }

    #[test]
    fn conflict_messages_name_the_running_task() {
        let err = BotError::from(TimerError::AlreadyRunning {
            label: "Docs".to_string(),
        });
        assert_eq!(
            err.user_message(),
            "⏳ A timer is already running for 'Docs'. Stop it first."
        );
    }
}
