//! Sequential message fan-out for admin broadcasts.

use std::time::Duration;

use tb_core::UserId;

use crate::messenger::{Messenger, MessengerError};

/// What gets sent to every recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastPayload {
    Text(String),
    Photo {
        file_id: String,
        caption: Option<String>,
    },
}

/// Outcome of a broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastTally {
    pub sent: usize,
    pub failed: usize,
}

/// Which users a broadcast reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Users with an entry in the activity window.
    Active,
    /// Every registered user.
    Everyone,
}

impl Audience {
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Active => "active users",
            Self::Everyone => "all users",
        }
    }
}

async fn send_one<M: Messenger>(
    messenger: &M,
    to: UserId,
    payload: &BroadcastPayload,
) -> Result<(), MessengerError> {
    match payload {
        BroadcastPayload::Text(text) => messenger.send_text(to, text, None).await?,
        BroadcastPayload::Photo { file_id, caption } => {
            messenger.send_photo(to, file_id, caption.as_deref()).await?
        }
    };
    Ok(())
}

/// Sends `payload` to each recipient in turn, pausing `delay` between sends.
///
/// A failed recipient is logged and counted; the batch always runs to the end.
/// Nothing is retried.
pub async fn dispatch<M: Messenger>(
    messenger: &M,
    recipients: &[UserId],
    payload: &BroadcastPayload,
    delay: Duration,
) -> BroadcastTally {
    let mut tally = BroadcastTally::default();
    for (index, &to) in recipients.iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match send_one(messenger, to, payload).await {
            Ok(()) => tally.sent += 1,
            Err(err) => {
                tracing::warn!(recipient = %to, error = %err, "broadcast delivery failed");
                tally.failed += 1;
            }
        }
    }
    tracing::info!(sent = tally.sent, failed = tally.failed, "broadcast finished");
    tally
}
