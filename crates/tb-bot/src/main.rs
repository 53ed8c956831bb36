use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tb_bot::console::ConsoleMessenger;
use tb_bot::{Cli, Config, Controller, runner};
use tb_core::SystemClock;
use tb_db::Database;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&std::path::Path>) -> Result<(Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // stdout carries the transport, so logs go to stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let (db, config) = open_database(cli.config.as_deref())?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let result = runtime.block_on(async {
        let messenger = Arc::new(ConsoleMessenger::new(tokio::io::stdout()));
        let controller = Arc::new(Controller::new(
            messenger,
            Arc::new(Mutex::new(db)),
            Arc::new(SystemClock),
            config.settings(),
        ));
        tracing::info!(admins = config.admin_ids.len(), "timebot started");
        runner::run(controller, BufReader::new(tokio::io::stdin())).await
    });
    // A blocked stdin read must not keep the process alive.
    runtime.shutdown_background();
    result
}
