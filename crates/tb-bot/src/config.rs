//! Configuration loading and management.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tb_core::UserId;

use crate::controller::Settings;

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Users allowed to run admin commands.
    #[serde(default)]
    pub admin_ids: Vec<UserId>,

    /// Chat platform token.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Payment provider token.
    #[serde(default)]
    pub payment_token: Option<String>,

    /// Pause between two broadcast sends, in milliseconds.
    pub broadcast_delay_ms: u64,
}

/// Shows whether a secret is set without revealing it.
const fn redacted(secret: Option<&String>) -> &'static str {
    if secret.is_some() { "[REDACTED]" } else { "None" }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("admin_ids", &self.admin_ids)
            .field("bot_token", &redacted(self.bot_token.as_ref()))
            .field("payment_token", &redacted(self.payment_token.as_ref()))
            .field("broadcast_delay_ms", &self.broadcast_delay_ms)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("timebot.db"),
            admin_ids: Vec::new(),
            bot_token: None,
            payment_token: None,
            broadcast_delay_ms: 50,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // TIMEBOT_DATABASE_PATH, TIMEBOT_ADMIN_IDS=[1,2], ...
        figment = figment.merge(Env::prefixed("TIMEBOT_"));

        figment.extract()
    }

    /// Controller settings derived from this configuration.
    pub fn settings(&self) -> Settings {
        Settings {
            admin_ids: self.admin_ids.iter().copied().collect::<HashSet<_>>(),
            broadcast_delay: Duration::from_millis(self.broadcast_delay_ms),
        }
    }
}

/// Returns the platform-specific config directory for timebot.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("timebot"))
}

/// Returns the platform-specific data directory for timebot.
///
/// On Linux: `~/.local/share/timebot`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("timebot"))
}
