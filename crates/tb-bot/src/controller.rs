//! The conversation state machine.
//!
//! [`Controller::handle`] takes one inbound event, advances the sender's
//! session and replies through the [`Messenger`]. Every event for a user runs
//! under that user's lock, so transitions for one user never interleave.
//!
//! # Errors
//!
//! Recoverable errors (see [`BotError::is_fatal`]) are turned into a message
//! for the user and a reset to [`SessionState::Idle`]. Store and transport
//! errors are returned to the caller.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::NaiveDate;
use tb_core::calendar::MonthCursor;
use tb_core::csv_export::{export_csv, export_filename};
use tb_core::report::{render_date_report, render_task_report};
use tb_core::stats::{active_since, render_global_stats, render_user_stats};
use tb_core::types::parse_strict_date;
use tb_core::{
    ActiveTimerRegistry, Clock, TaskLabel, TimerError, Timezone, UserId, ValidationError,
    aggregate_by_date, aggregate_by_task, format_duration,
};
use tb_db::{Database, NewTask};

use crate::broadcast::{self, Audience, BroadcastPayload};
use crate::error::BotError;
use crate::intent::{Callback, Command, Input, Intent};
use crate::keyboards;
use crate::messenger::{InboundEvent, Keyboard, MessageRef, Messenger};
use crate::session::{KeyedLocks, Session, SessionState, Sessions};

const WELCOME: &str = "👋 Hi! I keep track of the time you spend on tasks.\n\
Press ⏰ Start when you begin working and ⏹️ Stop when you're done.";

const HELP: &str = "ℹ️ How to use me:\n\
⏰ Start: begin timing a task\n\
⏹️ Stop: stop the running timer and save the entry\n\
📊 Today: what you tracked today\n\
📁 Reports: reports by date or task, CSV export\n\
🌍 Timezone: change your timezone\n\
/cancel: abandon the current step";

const ADMIN_HELP: &str = "\n\nAdmin commands:\n\
/stats: global statistics\n\
/user <id>: statistics for one user\n\
/premium <id>: toggle premium\n\
/broadcast: message users active this week\n\
/msgall: message every user";

/// Runtime settings for the controller.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub admin_ids: HashSet<UserId>,
    /// Pause between two broadcast sends.
    pub broadcast_delay: Duration,
}

/// Routes inbound events through the per-user conversation.
pub struct Controller<M> {
    messenger: Arc<M>,
    db: Arc<Mutex<Database>>,
    clock: Arc<dyn Clock>,
    timers: ActiveTimerRegistry,
    sessions: Sessions,
    locks: KeyedLocks,
    settings: Settings,
}

impl<M: Messenger> Controller<M> {
    pub fn new(
        messenger: Arc<M>,
        db: Arc<Mutex<Database>>,
        clock: Arc<dyn Clock>,
        settings: Settings,
    ) -> Self {
        Self {
            messenger,
            db,
            timers: ActiveTimerRegistry::new(Arc::clone(&clock)),
            clock,
            sessions: Sessions::default(),
            locks: KeyedLocks::default(),
            settings,
        }
    }

    pub fn session_state(&self, user: UserId) -> SessionState {
        self.sessions.state(user)
    }

    pub fn is_running(&self, user: UserId) -> bool {
        self.timers.is_running(user)
    }

    /// Handles one inbound event.
    ///
    /// # Errors
    ///
    /// Returns only fatal errors; everything else is answered and swallowed.
    pub async fn handle(&self, event: InboundEvent) -> Result<(), BotError> {
        let user = event.sender.id;
        let _guard = self.locks.lock(user).await;

        match self.dispatch(&event).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_fatal() => {
                tracing::error!(%user, error = %err, "fatal error while handling event");
                Err(err)
            }
            Err(err) => self.recover(user, &err).await,
        }
    }

    async fn recover(&self, user: UserId, err: &BotError) -> Result<(), BotError> {
        tracing::warn!(%user, error = %err, "handler failed, resetting session");
        self.sessions.reset(user);
        match self
            .messenger
            .send_text(user, &err.user_message(), Some(&keyboards::main_menu()))
            .await
        {
            Ok(_) => Ok(()),
            Err(send_err) if send_err.is_per_recipient() => {
                tracing::warn!(%user, error = %send_err, "could not report error to user");
                Ok(())
            }
            Err(send_err) => Err(BotError::Transport(send_err)),
        }
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_admin(&self, user: UserId) -> bool {
        self.settings.admin_ids.contains(&user)
    }

    async fn reply(&self, user: UserId, text: &str, keyboard: Keyboard) -> Result<(), BotError> {
        self.messenger.send_text(user, text, Some(&keyboard)).await?;
        Ok(())
    }

    async fn dispatch(&self, event: &InboundEvent) -> Result<(), BotError> {
        let user = event.sender.id;
        let has_timezone = {
            let mut db = self.db();
            db.ensure_user(
                user,
                &event.sender.name,
                self.clock.local_today(),
                self.is_admin(user),
            )?;
            db.timezone(user)?.is_some()
        };

        let input = Input::from_event(&event.event);
        let session = self.sessions.get(user);

        if is_cancel(&input) {
            return self.cancel(user, session.state).await;
        }
        let is_payment = matches!(input, Input::Payment { .. });
        if !has_timezone && session.state == SessionState::Idle && !is_payment {
            return self.prompt_timezone(user, true).await;
        }

        match input {
            Input::Command(command) => self.command(user, session.state, command).await,
            Input::Callback { callback, message } => {
                self.callback(user, &session, callback, message).await
            }
            Input::Photo { file_id, caption } => match session.state {
                SessionState::AwaitingBroadcastBody => {
                    self.broadcast(user, Audience::Active, BroadcastPayload::Photo { file_id, caption })
                        .await
                }
                SessionState::AwaitingMsgToAllBody => {
                    self.broadcast(user, Audience::Everyone, BroadcastPayload::Photo { file_id, caption })
                        .await
                }
                _ => self.hint(user).await,
            },
            Input::Text(text) => self.text(user, session, &text).await,
            Input::Payment { payload } => self.grant_premium(user, &payload).await,
        }
    }

    async fn text(&self, user: UserId, session: Session, text: &str) -> Result<(), BotError> {
        let intent = Intent::from_text(text);
        match session.state {
            SessionState::Idle => self.idle(user, intent).await,
            SessionState::AwaitingTaskName => self.start_timer(user, text).await,
            SessionState::AwaitingDescriptionChoice => match intent {
                Some(Intent::Yes) => {
                    self.sessions.set(
                        user,
                        Session {
                            state: SessionState::AwaitingDescriptionText,
                            ..session
                        },
                    );
                    self.reply(user, "✍️ Type the description.", keyboards::cancel_only())
                        .await
                }
                Some(Intent::No) => {
                    self.sessions.reset(user);
                    self.reply(user, "👌 Saved without a description.", keyboards::main_menu())
                        .await
                }
                _ => {
                    self.reply(user, "Add a description? Please answer Yes or No.", keyboards::yes_no())
                        .await
                }
            },
            SessionState::AwaitingDescriptionText => self.describe(user, &session, text).await,
            SessionState::AwaitingReportDate => self.report_for_typed_date(user, text).await,
            SessionState::AwaitingTimezoneChoice => match intent {
                Some(Intent::Skip) => self.save_timezone(user, Timezone::default()).await,
                Some(Intent::Other) => {
                    self.sessions.transition(user, SessionState::AwaitingCustomTimezone);
                    self.reply(user, &custom_timezone_prompt(), keyboards::cancel_only())
                        .await
                }
                _ => match text.parse::<Timezone>() {
                    Ok(timezone) => self.save_timezone(user, timezone).await,
                    Err(_) => {
                        self.reply(user, "Please pick one of the options.", keyboards::timezone_choice())
                            .await
                    }
                },
            },
            SessionState::AwaitingCustomTimezone => match text.parse::<Timezone>() {
                Ok(timezone) => self.save_timezone(user, timezone).await,
                Err(err) => {
                    let prompt = format!("⚠️ {err}\n\n{}", custom_timezone_prompt());
                    self.reply(user, &prompt, keyboards::cancel_only()).await
                }
            },
            SessionState::AwaitingReportsMenuChoice => self.reports_choice(user, intent).await,
            SessionState::AwaitingBroadcastBody => {
                self.broadcast(user, Audience::Active, BroadcastPayload::Text(text.to_string()))
                    .await
            }
            SessionState::AwaitingMsgToAllBody => {
                self.broadcast(user, Audience::Everyone, BroadcastPayload::Text(text.to_string()))
                    .await
            }
            SessionState::AwaitingCalendarPick | SessionState::AwaitingTaskPick => {
                self.reply(
                    user,
                    "Please use the buttons above, or press ✖️ Cancel.",
                    keyboards::cancel_only(),
                )
                .await
            }
        }
    }

    async fn idle(&self, user: UserId, intent: Option<Intent>) -> Result<(), BotError> {
        match intent {
            Some(Intent::Start) => self.prompt_task_name(user).await,
            Some(Intent::Stop) => self.stop_timer(user).await,
            Some(Intent::Today) => self.today_report(user).await,
            Some(Intent::Reports) => self.open_reports(user).await,
            Some(Intent::Timezone) => self.prompt_timezone(user, false).await,
            _ => self.hint(user).await,
        }
    }

    async fn command(&self, user: UserId, state: SessionState, command: Command) -> Result<(), BotError> {
        // Commands other than /cancel abandon the dialog in progress.
        if state != SessionState::Idle && command != Command::Cancel {
            self.sessions.reset(user);
        }
        if command.is_admin_only() && !self.is_admin(user) {
            tracing::warn!(%user, ?command, "admin command from non-admin");
            return self.help(user).await;
        }
        match command {
            Command::Welcome => self.reply(user, WELCOME, keyboards::main_menu()).await,
            Command::Help => self.help(user).await,
            Command::Cancel => self.cancel(user, state).await,
            Command::Timezone => self.prompt_timezone(user, false).await,
            Command::Today => self.today_report(user).await,
            Command::Reports => self.open_reports(user).await,
            Command::Stats => {
                let stats = self.db().global_stats(active_since(self.clock.local_today()))?;
                self.reply(user, &render_global_stats(&stats), keyboards::main_menu())
                    .await
            }
            Command::UserInfo(args) => {
                let target = parse_target("user", &args)?;
                let stats = self
                    .db()
                    .user_stats(target)?
                    .ok_or_else(|| BotError::not_found(format!("user {target}")))?;
                self.reply(user, &render_user_stats(&stats), keyboards::main_menu())
                    .await
            }
            Command::TogglePremium(args) => self.toggle_premium(user, &args).await,
            Command::Broadcast => {
                self.sessions.transition(user, SessionState::AwaitingBroadcastBody);
                self.reply(
                    user,
                    "📣 Send the message for users active in the last 7 days (text or a photo with a caption).",
                    keyboards::cancel_only(),
                )
                .await
            }
            Command::MessageAll => {
                self.sessions.transition(user, SessionState::AwaitingMsgToAllBody);
                self.reply(
                    user,
                    "📣 Send the message for all users (text or a photo with a caption).",
                    keyboards::cancel_only(),
                )
                .await
            }
            Command::Unknown(name) => {
                let text = format!("🤔 Unknown command /{name}.\n\n{}", self.help_text(user));
                self.reply(user, &text, keyboards::main_menu()).await
            }
        }
    }

    async fn callback(
        &self,
        user: UserId,
        session: &Session,
        callback: Option<Callback>,
        message: MessageRef,
    ) -> Result<(), BotError> {
        let state = session.state;
        match callback {
            Some(Callback::Noop) => Ok(()),
            Some(Callback::CalendarNavigate(month)) if state == SessionState::AwaitingCalendarPick => {
                self.messenger
                    .edit_keyboard(message, &keyboards::calendar(month))
                    .await?;
                Ok(())
            }
            Some(Callback::CalendarDay(date)) if state == SessionState::AwaitingCalendarPick => {
                self.messenger.delete_message(message).await?;
                self.sessions.reset(user);
                self.date_report(user, date).await
            }
            Some(Callback::CalendarCancel) if state == SessionState::AwaitingCalendarPick => {
                self.messenger.delete_message(message).await?;
                self.sessions.reset(user);
                self.reply(user, "✖️ Cancelled.", keyboards::main_menu()).await
            }
            Some(Callback::TaskPick(index)) if state == SessionState::AwaitingTaskPick => {
                let label = session
                    .offered_tasks
                    .get(index)
                    .cloned()
                    .ok_or_else(|| BotError::not_found("that task"))?;
                self.messenger.delete_message(message).await?;
                self.sessions.reset(user);
                let entries = self.db().tasks_labelled(user, &label)?;
                let report = aggregate_by_task(&entries, user, &label);
                self.reply(user, &render_task_report(&report), keyboards::main_menu())
                    .await
            }
            _ => {
                tracing::debug!(%user, %state, ?callback, "stale callback");
                self.messenger
                    .send_text(user, "⌛ This button is no longer active.", None)
                    .await?;
                Ok(())
            }
        }
    }

    async fn cancel(&self, user: UserId, state: SessionState) -> Result<(), BotError> {
        if state == SessionState::Idle {
            return self
                .reply(user, "Nothing to cancel.", keyboards::main_menu())
                .await;
        }
        self.sessions.reset(user);
        self.reply(user, "✖️ Cancelled.", keyboards::main_menu()).await
    }

    fn help_text(&self, user: UserId) -> String {
        if self.is_admin(user) {
            format!("{HELP}{ADMIN_HELP}")
        } else {
            HELP.to_string()
        }
    }

    async fn help(&self, user: UserId) -> Result<(), BotError> {
        let text = self.help_text(user);
        self.reply(user, &text, keyboards::main_menu()).await
    }

    /// Reply to input that means nothing in the current context.
    async fn hint(&self, user: UserId) -> Result<(), BotError> {
        match self.timers.elapsed(user) {
            Some((label, secs)) => {
                let text = format!(
                    "⏳ '{label}' is running ({}). Press ⏹️ Stop when you're done.",
                    format_duration(secs)
                );
                self.reply(user, &text, keyboards::main_menu()).await
            }
            None => self.help(user).await,
        }
    }

    // ========== Timezone ==========

    async fn prompt_timezone(&self, user: UserId, first_contact: bool) -> Result<(), BotError> {
        self.sessions.transition(user, SessionState::AwaitingTimezoneChoice);
        let text = if first_contact {
            format!("{WELCOME}\n\n🌍 First, which timezone are you in?")
        } else {
            "🌍 Which timezone are you in?".to_string()
        };
        self.reply(user, &text, keyboards::timezone_choice()).await
    }

    async fn save_timezone(&self, user: UserId, timezone: Timezone) -> Result<(), BotError> {
        self.db().set_timezone(user, timezone)?;
        self.sessions.reset(user);
        tracing::info!(%user, timezone = timezone.name(), "timezone saved");
        let text = format!("✅ Timezone set to {}.", timezone.label());
        self.reply(user, &text, keyboards::main_menu()).await
    }

    // ========== Timer ==========

    async fn prompt_task_name(&self, user: UserId) -> Result<(), BotError> {
        if let Some((label, _)) = self.timers.elapsed(user) {
            return Err(TimerError::AlreadyRunning { label }.into());
        }
        self.sessions.transition(user, SessionState::AwaitingTaskName);
        self.reply(user, "📝 What are you working on?", keyboards::cancel_only())
            .await
    }

    async fn start_timer(&self, user: UserId, text: &str) -> Result<(), BotError> {
        let Ok(label) = TaskLabel::new(text) else {
            return self
                .reply(user, "The task name can't be empty. What are you working on?", keyboards::cancel_only())
                .await;
        };
        let started = self.timers.start(user, label)?;
        self.sessions.reset(user);
        let text = format!("⏰ Started '{}'. Press ⏹️ Stop when you're done.", started.label);
        self.reply(user, &text, keyboards::main_menu()).await
    }

    async fn stop_timer(&self, user: UserId) -> Result<(), BotError> {
        let stopped = self.timers.stop(user)?;
        let entry_id = {
            let mut db = self.db();
            let timezone = db.timezone(user)?.unwrap_or_default();
            db.insert_task(&NewTask {
                user_id: user,
                label: stopped.label.clone(),
                duration_secs: stopped.duration_secs,
                date: stopped.date,
                end_clock: self.clock.now_in(timezone).time(),
            })?
        };
        self.sessions.set(
            user,
            Session {
                state: SessionState::AwaitingDescriptionChoice,
                pending_entry: Some(entry_id),
                offered_tasks: Vec::new(),
            },
        );
        let text = format!(
            "⏹️ Stopped '{}' after {}. Add a description?",
            stopped.label,
            format_duration(stopped.duration_secs)
        );
        self.reply(user, &text, keyboards::yes_no()).await
    }

    async fn describe(&self, user: UserId, session: &Session, text: &str) -> Result<(), BotError> {
        let description = text.trim();
        if description.is_empty() {
            self.sessions.reset(user);
            return self
                .reply(user, "No description added.", keyboards::main_menu())
                .await;
        }
        let entry_id = session
            .pending_entry
            .ok_or_else(|| BotError::not_found("the entry to describe"))?;
        let updated = self.db().set_description(entry_id, user, description)?;
        self.sessions.reset(user);
        if !updated {
            tracing::debug!(%user, entry_id, "description not written");
        }
        self.reply(user, "📝 Description saved.", keyboards::main_menu())
            .await
    }

    // ========== Reports ==========

    async fn open_reports(&self, user: UserId) -> Result<(), BotError> {
        self.sessions.transition(user, SessionState::AwaitingReportsMenuChoice);
        self.reply(user, "📁 Which report?", keyboards::reports_menu())
            .await
    }

    async fn reports_choice(&self, user: UserId, intent: Option<Intent>) -> Result<(), BotError> {
        match intent {
            Some(Intent::Today) => {
                let today = self.clock.local_today();
                let entries = self.db().tasks_on(user, today)?;
                let report = aggregate_by_date(&entries, user, today);
                self.reply(user, &render_date_report(&report), keyboards::reports_menu())
                    .await
            }
            Some(Intent::ByDate) => {
                self.sessions.transition(user, SessionState::AwaitingCalendarPick);
                let month = MonthCursor::containing(self.clock.local_today());
                self.reply(user, "📅 Pick a date:", keyboards::calendar(month))
                    .await
            }
            Some(Intent::EnterDate) => {
                self.sessions.transition(user, SessionState::AwaitingReportDate);
                self.reply(user, "⌨️ Enter a date as YYYY-MM-DD.", keyboards::cancel_only())
                    .await
            }
            Some(Intent::ByTask) => self.offer_tasks(user).await,
            Some(Intent::CsvExport) => self.export(user).await,
            Some(Intent::Back) => {
                self.sessions.reset(user);
                self.reply(user, "⬅️ Main menu.", keyboards::main_menu()).await
            }
            _ => {
                self.reply(user, "Please pick a report.", keyboards::reports_menu())
                    .await
            }
        }
    }

    async fn offer_tasks(&self, user: UserId) -> Result<(), BotError> {
        let labels = self.db().distinct_labels(user)?;
        if labels.is_empty() {
            self.sessions.reset(user);
            return self
                .reply(user, "🗂 You haven't recorded any tasks yet.", keyboards::main_menu())
                .await;
        }
        self.messenger
            .send_text(user, "🗂 Pick a task:", Some(&keyboards::task_list(&labels)))
            .await?;
        self.sessions.set(
            user,
            Session {
                state: SessionState::AwaitingTaskPick,
                pending_entry: None,
                offered_tasks: labels,
            },
        );
        Ok(())
    }

    async fn today_report(&self, user: UserId) -> Result<(), BotError> {
        self.date_report(user, self.clock.local_today()).await
    }

    async fn date_report(&self, user: UserId, date: NaiveDate) -> Result<(), BotError> {
        let entries = self.db().tasks_on(user, date)?;
        let report = aggregate_by_date(&entries, user, date);
        self.reply(user, &render_date_report(&report), keyboards::main_menu())
            .await
    }

    async fn report_for_typed_date(&self, user: UserId, text: &str) -> Result<(), BotError> {
        match parse_strict_date(text) {
            Ok(date) => {
                self.sessions.reset(user);
                self.date_report(user, date).await
            }
            Err(err) => {
                let text = format!("⚠️ {err}. Try again, or press ✖️ Cancel.");
                self.reply(user, &text, keyboards::cancel_only()).await
            }
        }
    }

    async fn export(&self, user: UserId) -> Result<(), BotError> {
        self.sessions.reset(user);
        let premium = self.db().is_premium(user)?;
        if !premium {
            return self
                .reply(user, "⭐ CSV export is a premium feature.", keyboards::main_menu())
                .await;
        }
        let entries = self.db().tasks_for_user(user)?;
        if entries.is_empty() {
            return self
                .reply(user, "📄 Nothing to export yet.", keyboards::main_menu())
                .await;
        }
        let bytes = export_csv(&entries)?;
        let filename = export_filename(self.clock.local_today());
        let caption = format!("📄 Your timesheet, {} entries.", entries.len());
        self.messenger
            .send_document(user, &bytes, &filename, &caption)
            .await?;
        tracing::info!(%user, entries = entries.len(), "csv exported");
        self.reply(user, "⬅️ Main menu.", keyboards::main_menu()).await
    }

    // ========== Admin ==========

    async fn toggle_premium(&self, admin: UserId, args: &str) -> Result<(), BotError> {
        let target = parse_target("premium", args)?;
        let premium = self
            .db()
            .toggle_premium(target)?
            .ok_or_else(|| BotError::not_found(format!("user {target}")))?;
        tracing::info!(%admin, %target, premium, "premium toggled");

        let notice = if premium {
            "⭐ Premium has been enabled for your account."
        } else {
            "Premium has been disabled for your account."
        };
        if let Err(err) = self.messenger.send_text(target, notice, None).await {
            tracing::warn!(%target, error = %err, "could not notify user about premium change");
        }

        let state = if premium { "enabled" } else { "disabled" };
        let text = format!("Premium {state} for user {target}.");
        self.reply(admin, &text, keyboards::main_menu()).await
    }

    async fn grant_premium(&self, user: UserId, payload: &str) -> Result<(), BotError> {
        self.db().set_premium(user, true)?;
        tracing::info!(%user, payload, "payment confirmed, premium granted");
        self.reply(
            user,
            "⭐ Thank you! Premium is active and CSV export is unlocked.",
            keyboards::main_menu(),
        )
        .await
    }

    async fn broadcast(
        &self,
        admin: UserId,
        audience: Audience,
        payload: BroadcastPayload,
    ) -> Result<(), BotError> {
        self.sessions.reset(admin);
        let recipients = {
            let db = self.db();
            match audience {
                Audience::Active => db.active_user_ids(active_since(self.clock.local_today()))?,
                Audience::Everyone => db.user_ids()?,
            }
        };
        tracing::info!(%admin, recipients = recipients.len(), audience = audience.describe(), "broadcast started");
        let tally = broadcast::dispatch(
            self.messenger.as_ref(),
            &recipients,
            &payload,
            self.settings.broadcast_delay,
        )
        .await;
        let text = format!(
            "📣 Sent to {} of {} {}; {} failed.",
            tally.sent,
            recipients.len(),
            audience.describe(),
            tally.failed
        );
        self.reply(admin, &text, keyboards::main_menu()).await
    }
}

fn is_cancel(input: &Input) -> bool {
    matches!(input, Input::Text(text) if Intent::from_text(text) == Some(Intent::Cancel))
}

fn parse_target(command: &'static str, args: &str) -> Result<UserId, ValidationError> {
    if args.is_empty() {
        return Err(ValidationError::InvalidArguments {
            command,
            reason: "expected a user id".to_string(),
        });
    }
    args.parse().map_err(|_| ValidationError::InvalidArguments {
        command,
        reason: format!("'{args}' is not a user id"),
    })
}

fn custom_timezone_prompt() -> String {
    let names: Vec<&str> = Timezone::ALL.iter().map(|tz| tz.name()).collect();
    format!("Type your timezone. Supported: {}.", names.join(", "))
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn cancel_is_recognized_from_text_and_command() {
        assert!(!is_cancel(&Input::Command(Command::Help)));
        assert!(is_cancel(&Input::Text("✖️ Cancel".to_string())));
        assert!(is_cancel(&Input::Text("cancel".to_string())));
        assert!(!is_cancel(&Input::Text("Cancel the meeting".to_string())));
    }

    #[test]
    fn admin_targets_must_be_numeric() {
        assert_eq!(parse_target("user", " 42").ok(), Some(UserId::new(42)));
        assert!(matches!(
            parse_target("user", ""),
            Err(ValidationError::InvalidArguments { command: "user", .. })
        ));
        assert!(parse_target("premium", "bob").is_err());
    }

    #[test]
    fn custom_timezone_prompt_lists_every_zone() {
        assert_snapshot!(
            custom_timezone_prompt(),
            @"Type your timezone. Supported: Kaliningrad, Moscow, Samara, Yekaterinburg, Novosibirsk, Vladivostok."
        );
    }
}
