//! The chat transport contract.
//!
//! The bot never talks to a chat service directly. Inbound traffic arrives as
//! [`InboundEvent`]s and replies go out through a [`Messenger`].

use std::future::Future;

use serde::{Deserialize, Serialize};
use tb_core::UserId;
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum MessengerError {
    /// The recipient cannot be reached (blocked the bot, deleted account, ...).
    #[error("recipient {user} unreachable: {reason}")]
    Unreachable { user: UserId, reason: String },
    /// The transport itself is down.
    #[error("transport unavailable: {0}")]
    Unavailable(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl MessengerError {
    /// Whether the failure concerns one recipient only.
    pub const fn is_per_recipient(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

/// Reference to a message the bot sent earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat: UserId,
    pub message_id: i64,
}

/// An inline button carrying callback data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub data: String,
}

/// Keyboard attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum Keyboard {
    /// Persistent reply keyboard; pressing a button sends its label as text.
    Reply(Vec<Vec<String>>),
    /// Buttons attached to the message that produce callbacks.
    Inline(Vec<Vec<InlineButton>>),
}

/// The sender of an inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
}

/// An inbound event from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub sender: Sender,
    pub event: EventKind,
}

/// The kind of inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A plain text message (including reply keyboard presses).
    Text { text: String },
    /// An inline button press.
    Callback { data: String, message: MessageRef },
    /// A slash command, without the leading slash.
    Command {
        name: String,
        #[serde(default)]
        args: String,
    },
    /// A photo, identified by the transport's file ID.
    Photo {
        file_id: String,
        #[serde(default)]
        caption: Option<String>,
    },
    /// A completed payment.
    PaymentConfirmation { payload: String },
}

impl InboundEvent {
    pub fn text(sender: UserId, text: impl Into<String>) -> Self {
        Self::new(sender, EventKind::Text { text: text.into() })
    }

    pub fn new(sender: UserId, event: EventKind) -> Self {
        Self {
            sender: Sender {
                id: sender,
                name: String::new(),
            },
            event,
        }
    }
}

/// Outbound side of the chat transport.
pub trait Messenger: Send + Sync + 'static {
    fn send_text(
        &self,
        to: UserId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> impl Future<Output = Result<MessageRef, MessengerError>> + Send;

    fn send_document(
        &self,
        to: UserId,
        bytes: &[u8],
        filename: &str,
        caption: &str,
    ) -> impl Future<Output = Result<MessageRef, MessengerError>> + Send;

    fn send_photo(
        &self,
        to: UserId,
        file_id: &str,
        caption: Option<&str>,
    ) -> impl Future<Output = Result<MessageRef, MessengerError>> + Send;

    fn edit_keyboard(
        &self,
        message: MessageRef,
        keyboard: &Keyboard,
    ) -> impl Future<Output = Result<(), MessengerError>> + Send;

    fn delete_message(
        &self,
        message: MessageRef,
    ) -> impl Future<Output = Result<(), MessengerError>> + Send;
}
