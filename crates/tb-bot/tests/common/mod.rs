//! Shared harness for driving the controller in tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use tb_bot::intent;
use tb_bot::{
    Controller, EventKind, InboundEvent, Keyboard, MessageRef, Messenger, MessengerError,
    SessionState, Settings,
};
use tb_core::{ManualClock, Timezone, UserId};
use tb_db::Database;

pub const ADMIN: UserId = UserId::new(1);

/// Everything the bot sent, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        to: UserId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Document {
        to: UserId,
        bytes: Vec<u8>,
        filename: String,
        caption: String,
    },
    Photo {
        to: UserId,
        file_id: String,
        caption: Option<String>,
    },
    Edit {
        message: MessageRef,
        keyboard: Keyboard,
    },
    Delete {
        message: MessageRef,
    },
}

#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    next_id: AtomicI64,
    unreachable: Mutex<HashSet<UserId>>,
}

impl RecordingMessenger {
    pub fn block(&self, user: UserId) {
        self.unreachable.lock().unwrap().insert(user);
    }

    pub fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    fn record(&self, to: UserId, sent: Sent) -> Result<MessageRef, MessengerError> {
        if self.unreachable.lock().unwrap().contains(&to) {
            return Err(MessengerError::Unreachable {
                user: to,
                reason: "blocked by user".to_string(),
            });
        }
        self.sent.lock().unwrap().push(sent);
        Ok(MessageRef {
            chat: to,
            message_id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
        })
    }
}

impl Messenger for RecordingMessenger {
    async fn send_text(
        &self,
        to: UserId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, MessengerError> {
        self.record(
            to,
            Sent::Text {
                to,
                text: text.to_string(),
                keyboard: keyboard.cloned(),
            },
        )
    }

    async fn send_document(
        &self,
        to: UserId,
        bytes: &[u8],
        filename: &str,
        caption: &str,
    ) -> Result<MessageRef, MessengerError> {
        self.record(
            to,
            Sent::Document {
                to,
                bytes: bytes.to_vec(),
                filename: filename.to_string(),
                caption: caption.to_string(),
            },
        )
    }

    async fn send_photo(
        &self,
        to: UserId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<MessageRef, MessengerError> {
        self.record(
            to,
            Sent::Photo {
                to,
                file_id: file_id.to_string(),
                caption: caption.map(str::to_string),
            },
        )
    }

    async fn edit_keyboard(
        &self,
        message: MessageRef,
        keyboard: &Keyboard,
    ) -> Result<(), MessengerError> {
        self.record(
            message.chat,
            Sent::Edit {
                message,
                keyboard: keyboard.clone(),
            },
        )
        .map(|_| ())
    }

    async fn delete_message(&self, message: MessageRef) -> Result<(), MessengerError> {
        self.record(message.chat, Sent::Delete { message }).map(|_| ())
    }
}

/// A controller wired to an in-memory store, a manual clock and a recording messenger.
pub struct Harness {
    pub controller: Controller<RecordingMessenger>,
    pub messenger: Arc<RecordingMessenger>,
    pub clock: Arc<ManualClock>,
    pub db: Arc<Mutex<Database>>,
}

/// 2025-03-14 09:00 UTC, 12:00 in Moscow.
pub fn start_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap()
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

impl Harness {
    pub fn new() -> Self {
        let messenger = Arc::new(RecordingMessenger::default());
        let clock = Arc::new(ManualClock::new(start_time()));
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        let settings = Settings {
            admin_ids: HashSet::from([ADMIN]),
            broadcast_delay: Duration::ZERO,
        };
        let controller = Controller::new(
            Arc::clone(&messenger),
            Arc::clone(&db),
            clock.clone(),
            settings,
        );
        Self {
            controller,
            messenger,
            clock,
            db,
        }
    }

    /// Registers a user with a timezone so the onboarding prompt is skipped.
    pub fn onboard(&self, user: UserId, timezone: Timezone) {
        let mut db = self.db.lock().unwrap();
        db.ensure_user(user, "tester", today(), user == ADMIN).unwrap();
        db.set_timezone(user, timezone).unwrap();
    }

    pub async fn event(&self, user: UserId, kind: EventKind) {
        self.controller
            .handle(InboundEvent::new(user, kind))
            .await
            .unwrap();
    }

    pub async fn send(&self, user: UserId, text: &str) {
        self.controller
            .handle(InboundEvent::text(user, text))
            .await
            .unwrap();
    }

    pub async fn command(&self, user: UserId, name: &str, args: &str) {
        self.event(
            user,
            EventKind::Command {
                name: name.to_string(),
                args: args.to_string(),
            },
        )
        .await;
    }

    pub async fn press(&self, user: UserId, data: &str, message: MessageRef) {
        self.event(
            user,
            EventKind::Callback {
                data: data.to_string(),
                message,
            },
        )
        .await;
    }

    /// Starts and stops a timer, answering "No" to the description prompt.
    pub async fn track(&self, user: UserId, label: &str, duration: Duration) {
        self.send(user, intent::START).await;
        self.send(user, label).await;
        self.clock.advance(duration);
        self.send(user, intent::STOP).await;
        self.send(user, intent::NO).await;
    }

    pub fn state(&self, user: UserId) -> SessionState {
        self.controller.session_state(user)
    }

    pub fn take(&self) -> Vec<Sent> {
        self.messenger.take()
    }

    /// Texts sent to `user` since the last call, draining everything recorded.
    pub fn texts_to(&self, user: UserId) -> Vec<String> {
        self.take()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Text { to, text, .. } if to == user => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn last_text(&self, user: UserId) -> String {
        self.texts_to(user).pop().unwrap_or_default()
    }
}
