//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

/// Conversational time tracking bot.
///
/// Reads inbound chat events as JSON lines on stdin and writes outbound
/// messages as JSON lines on stdout.
#[derive(Debug, Parser)]
#[command(name = "timebot", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::parse_from(["timebot", "-v", "--config", "bot.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("bot.toml")));
    }
}
