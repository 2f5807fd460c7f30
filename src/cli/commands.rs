//! Command definitions for the pomidor CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ============================================================================
// CLI Structure
// ============================================================================

/// Pomidor - keyed countdown timer daemon for focus sessions
#[derive(Parser, Debug)]
#[command(
    name = "pomidor",
    version,
    about = "Countdown timer daemon for Pomodoro-style focus sessions",
    long_about = "A terminal Pomodoro timer built on a keyed countdown registry.\n\
                  Commands talk to a background daemon over a Unix socket;\n\
                  start one with `pomidor daemon`.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start a focus session (arming it first if needed)
    Start(SessionArgs),

    /// Pause the running session
    Pause(KeyArgs),

    /// Resume a paused session
    Resume(KeyArgs),

    /// Stop the session, restoring its full duration
    Stop(KeyArgs),

    /// Re-arm the session with a fresh duration without starting it
    Reset(SessionArgs),

    /// Show the current session state
    Status(KeyArgs),

    /// Show completed sessions
    History(HistoryArgs),

    /// Run the daemon (background service)
    Daemon(DaemonArgs),

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

/// Arguments carrying optional session configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
    /// Session length in minutes
    #[arg(short, long)]
    pub minutes: Option<u32>,

    /// Tick interval in milliseconds
    #[arg(long, value_name = "MS")]
    pub tick_interval: Option<u64>,

    /// Timer key (defaults to the daemon's session key)
    #[arg(short, long)]
    pub key: Option<String>,
}

/// Arguments selecting a timer key.
#[derive(Args, Debug, Clone, Default)]
pub struct KeyArgs {
    /// Timer key (defaults to the daemon's session key)
    #[arg(short, long)]
    pub key: Option<String>,
}

/// Arguments for the history listing.
#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Maximum number of sessions to show, newest first
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,
}

/// Arguments for the daemon.
#[derive(Args, Debug, Clone, Default)]
pub struct DaemonArgs {
    /// Socket path (defaults to ~/.pomidor/pomidor.sock)
    #[arg(long)]
    pub socket: Option<PathBuf>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_no_args() {
        let cli = Cli::parse_from(["pomidor"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_status() {
        let cli = Cli::parse_from(["pomidor", "status"]);
        assert!(matches!(cli.command, Some(Commands::Status(_))));
    }

    #[test]
    fn test_parse_start_defaults() {
        let cli = Cli::parse_from(["pomidor", "start"]);
        match cli.command {
            Some(Commands::Start(args)) => {
                assert!(args.minutes.is_none());
                assert!(args.tick_interval.is_none());
                assert!(args.key.is_none());
            }
            _ => panic!("expected Start command"),
        }
    }

    #[test]
    fn test_parse_start_with_options() {
        let cli = Cli::parse_from([
            "pomidor",
            "start",
            "--minutes",
            "30",
            "--tick-interval",
            "500",
            "--key",
            "deep-work",
        ]);
        match cli.command {
            Some(Commands::Start(args)) => {
                assert_eq!(args.minutes, Some(30));
                assert_eq!(args.tick_interval, Some(500));
                assert_eq!(args.key, Some("deep-work".to_string()));
            }
            _ => panic!("expected Start command"),
        }
    }

    #[test]
    fn test_parse_reset() {
        let cli = Cli::parse_from(["pomidor", "reset", "-m", "50"]);
        match cli.command {
            Some(Commands::Reset(args)) => assert_eq!(args.minutes, Some(50)),
            _ => panic!("expected Reset command"),
        }
    }

    #[test]
    fn test_parse_pause_with_key() {
        let cli = Cli::parse_from(["pomidor", "pause", "--key", "side"]);
        match cli.command {
            Some(Commands::Pause(args)) => assert_eq!(args.key, Some("side".to_string())),
            _ => panic!("expected Pause command"),
        }
    }

    #[test]
    fn test_parse_history_limit() {
        let cli = Cli::parse_from(["pomidor", "history", "--limit", "3"]);
        match cli.command {
            Some(Commands::History(args)) => assert_eq!(args.limit, 3),
            _ => panic!("expected History command"),
        }

        let cli = Cli::parse_from(["pomidor", "history"]);
        match cli.command {
            Some(Commands::History(args)) => assert_eq!(args.limit, 10),
            _ => panic!("expected History command"),
        }
    }

    #[test]
    fn test_parse_daemon_socket() {
        let cli = Cli::parse_from(["pomidor", "daemon", "--socket", "/tmp/p.sock"]);
        match cli.command {
            Some(Commands::Daemon(args)) => {
                assert_eq!(args.socket, Some(PathBuf::from("/tmp/p.sock")));
            }
            _ => panic!("expected Daemon command"),
        }
    }

    #[test]
    fn test_parse_verbose() {
        let cli = Cli::parse_from(["pomidor", "--verbose", "status"]);
        assert!(cli.verbose);
    }
}
