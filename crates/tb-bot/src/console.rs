//! A [`Messenger`] that writes outbound messages as JSON lines.
//!
//! Each message becomes one line on the wrapped writer (stdout for the
//! binary), tagged with a `type` and the message ID the bot will use to refer
//! to it later.

use std::sync::atomic::{AtomicI64, Ordering};

use serde::Serialize;
use tb_core::UserId;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::messenger::{Keyboard, MessageRef, Messenger, MessengerError};

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Outbound<'a> {
    Text {
        to: UserId,
        message_id: i64,
        text: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        keyboard: Option<&'a Keyboard>,
    },
    Document {
        to: UserId,
        message_id: i64,
        filename: &'a str,
        caption: &'a str,
        content: String,
    },
    Photo {
        to: UserId,
        message_id: i64,
        file_id: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        caption: Option<&'a str>,
    },
    EditKeyboard {
        chat: UserId,
        message_id: i64,
        keyboard: &'a Keyboard,
    },
    Delete {
        chat: UserId,
        message_id: i64,
    },
}

pub struct ConsoleMessenger<W> {
    out: Mutex<W>,
    next_id: AtomicI64,
}

impl<W> ConsoleMessenger<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn allocate(&self, to: UserId) -> MessageRef {
        MessageRef {
            chat: to,
            message_id: self.next_id.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl<W: AsyncWrite + Unpin + Send> ConsoleMessenger<W> {
    async fn write(&self, message: &Outbound<'_>) -> Result<(), MessengerError> {
        let mut line = serde_json::to_vec(message).map_err(std::io::Error::from)?;
        line.push(b'\n');
        let mut out = self.out.lock().await;
        out.write_all(&line).await?;
        out.flush().await?;
        Ok(())
    }
}

impl<W: AsyncWrite + Unpin + Send + 'static> Messenger for ConsoleMessenger<W> {
    async fn send_text(
        &self,
        to: UserId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, MessengerError> {
        let message = self.allocate(to);
        self.write(&Outbound::Text {
            to,
            message_id: message.message_id,
            text,
            keyboard,
        })
        .await?;
        Ok(message)
    }

    async fn send_document(
        &self,
        to: UserId,
        bytes: &[u8],
        filename: &str,
        caption: &str,
    ) -> Result<MessageRef, MessengerError> {
        let message = self.allocate(to);
        self.write(&Outbound::Document {
            to,
            message_id: message.message_id,
            filename,
            caption,
            content: String::from_utf8_lossy(bytes).into_owned(),
        })
        .await?;
        Ok(message)
    }

    async fn send_photo(
        &self,
        to: UserId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<MessageRef, MessengerError> {
        let message = self.allocate(to);
        self.write(&Outbound::Photo {
            to,
            message_id: message.message_id,
            file_id,
            caption,
        })
        .await?;
        Ok(message)
    }

    async fn edit_keyboard(
        &self,
        message: MessageRef,
        keyboard: &Keyboard,
    ) -> Result<(), MessengerError> {
        self.write(&Outbound::EditKeyboard {
            chat: message.chat,
            message_id: message.message_id,
            keyboard,
        })
        .await
    }

    async fn delete_message(&self, message: MessageRef) -> Result<(), MessengerError> {
        self.write(&Outbound::Delete {
            chat: message.chat,
            message_id: message.message_id,
        })
        .await
    }
}
