//! Conversational time tracking bot.
//!
//! The [`Controller`] runs the per-user conversation on top of the domain
//! types in `tb_core` and the store in `tb_db`. Chat traffic flows through the
//! [`Messenger`] trait; the binary drives it with a JSON-lines console
//! transport via [`runner::run`].

pub mod broadcast;
mod cli;
mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod intent;
pub mod keyboards;
pub mod messenger;
pub mod runner;
pub mod session;

pub use cli::Cli;
pub use config::Config;
pub use controller::{Controller, Settings};
pub use error::BotError;
pub use messenger::{EventKind, InboundEvent, Keyboard, MessageRef, Messenger, MessengerError};
pub use session::SessionState;
