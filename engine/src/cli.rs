//! CLI interface for Potluck
//!
//! Commands and global flags, using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Potluck household dinner planner
///
/// Collects dinner wishes from the family over chat, plans the week's
/// dinners and fills the grocery cart.
#[derive(Parser, Debug)]
#[command(name = "potluck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the polling loop in the foreground
    Run,

    /// Start a planning session now
    Start,

    /// Stop the running daemon
    Stop,

    /// Show daemon and session status
    Status,

    /// Show recently cooked dinners
    History {
        /// How many weeks to look back
        #[arg(short, long, default_value = "4")]
        weeks: u32,
    },

    /// Show the recipes of the running or most recent session
    Menu,

    /// Show learned preferences
    Preferences {
        /// Only show preferences of this member (name or address)
        #[arg(short, long)]
        member: Option<String>,
    },

    /// List family members
    Members,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_history_weeks() {
        let cli = Cli::try_parse_from(["potluck", "history", "--weeks", "2"]).unwrap();
        assert!(matches!(cli.command, Command::History { weeks: 2 }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["potluck", "members", "--json", "--log", "debug"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.log.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Command::Members));
    }

    #[test]
    fn test_config_show() {
        let cli = Cli::try_parse_from(["potluck", "--config", "/tmp/p.toml", "config", "show"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/p.toml")));
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Show
            }
        ));
    }

    #[test]
    fn test_parse_menu() {
        let cli = Cli::try_parse_from(["potluck", "menu", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Command::Menu));
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(Cli::try_parse_from(["potluck", "deploy"]).is_err());
    }
}
