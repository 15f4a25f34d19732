// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Codunot - conversation state and quota manager for a persona chat bot.
//!
//! This is the binary entry point.

mod shell;
mod usage;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use codunot_config::CodunotConfig;
use colored::Colorize;

/// Codunot - conversation state and quota manager for a persona chat bot.
#[derive(Parser, Debug)]
#[command(name = "codunot", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with the bot from the terminal as a local console channel.
    Shell,
    /// Show an entity's tier and usage from the persisted usage files.
    Usage {
        /// Server id, or channel id for direct messages.
        key: String,
        /// Output JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// List the premium and gold allow-lists.
    Tiers {
        /// Output JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => codunot_config::load_and_validate_path(path),
        None => codunot_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            codunot_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    let result = match cli.command {
        Some(Commands::Shell) => shell::run_shell(config).await,
        Some(Commands::Usage { key, json }) => usage::run_usage(&config, &key, json),
        Some(Commands::Tiers { json }) => usage::run_tiers(&config, json),
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("codunot: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

fn print_config(config: &CodunotConfig) -> Result<(), codunot_core::CodunotError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| codunot_core::CodunotError::Internal(format!("cannot render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}

/// `RUST_LOG` wins over `agent.log_level` when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("codunot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_usage_with_json() {
        let cli = Cli::try_parse_from(["codunot", "usage", "g1", "--json"]).unwrap();
        match cli.command {
            Some(Commands::Usage { key, json }) => {
                assert_eq!(key, "g1");
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_accepts_global_config_flag() {
        let cli = Cli::try_parse_from(["codunot", "tiers", "--config", "/tmp/c.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }

    #[test]
    fn default_config_renders_as_toml() {
        let config = codunot_config::load_and_validate_str("").unwrap();
        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(rendered.contains("[agent]"));
        assert!(rendered.contains("history_limit = 60"));
        assert!(rendered.contains("daily_messages = \"unlimited\""));
    }
}
