//! Pomidor CLI - a countdown timer daemon for focus sessions
//!
//! Timers live in a background daemon keyed by name; the CLI drives the
//! well-known session timer over a Unix socket:
//! - `pomidor daemon` runs the service
//! - `pomidor start` / `pause` / `resume` / `stop` / `reset` drive a session
//! - `pomidor status` and `pomidor history` report on it

use anyhow::Result;
use clap::{CommandFactory, Parser};

use pomidor::cli::{default_socket_path, Cli, Commands, Display, IpcClient};
use pomidor::daemon;
use pomidor::history::HistoryStore;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    init_tracing();

    // Parse command line arguments
    let cli = Cli::parse();

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match cli.command {
        Some(Commands::Start(args)) => {
            let client = IpcClient::new()?;
            let response = client.start(&args).await?;
            Display::show_start(&response);
        }
        Some(Commands::Pause(args)) => {
            let client = IpcClient::new()?;
            let response = client.pause(args.key).await?;
            Display::show_pause(&response);
        }
        Some(Commands::Resume(args)) => {
            let client = IpcClient::new()?;
            let response = client.resume(args.key).await?;
            Display::show_resume(&response);
        }
        Some(Commands::Stop(args)) => {
            let client = IpcClient::new()?;
            let response = client.stop(args.key).await?;
            Display::show_stop(&response);
        }
        Some(Commands::Reset(args)) => {
            let client = IpcClient::new()?;
            let response = client.reset(&args).await?;
            Display::show_reset(&response);
        }
        Some(Commands::Status(args)) => {
            let client = IpcClient::new()?;
            let response = client.status(args.key).await?;
            Display::show_status(&response);
        }
        Some(Commands::History(args)) => {
            let store = HistoryStore::open_default()?;
            let records = store.load()?;
            Display::show_history(&records, args.limit);
        }
        Some(Commands::Daemon(args)) => {
            let socket_path = match args.socket {
                Some(path) => path,
                None => default_socket_path()?,
            };
            daemon::run(&socket_path).await?;
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
