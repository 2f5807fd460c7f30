//! Daemon for the pomidor timer.
//!
//! This module contains the long-running side of the application:
//! - `ipc`: Unix socket server and request dispatch onto the registry
//! - `service`: session watcher driving notices and history records
//! - `notify`: pluggable notice sink

pub mod ipc;
pub mod notify;
pub mod service;

pub use ipc::{IpcServer, RequestHandler};
pub use notify::{LogNotifier, MockNotifier, Notifier, SessionNotice};
pub use service::SessionService;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::history::HistoryStore;
use crate::timer::{TickScheduler, TimerRegistry, TokioTickScheduler};

/// Well-known key the session service and default CLI commands operate on.
pub const SESSION_KEY: &str = "session";

/// Runs the daemon until a shutdown signal arrives.
///
/// Binds the IPC socket, spawns the session service, and serves one request
/// per connection.
pub async fn run(socket_path: &Path) -> Result<()> {
    let registry = Arc::new(TimerRegistry::new(
        Arc::new(TokioTickScheduler::new()) as Arc<dyn TickScheduler>
    ));

    let history = HistoryStore::open_default()?;
    info!(history = %history.path().display(), "session history file");
    let service = SessionService::new(
        Arc::clone(&registry),
        history,
        Arc::new(LogNotifier) as Arc<dyn Notifier>,
    );
    tokio::spawn(service.run());

    let server = IpcServer::new(socket_path)?;
    let handler = Arc::new(RequestHandler::new(registry));
    info!(socket = %socket_path.display(), "daemon listening");

    loop {
        tokio::select! {
            accepted = server.accept() => match accepted {
                Ok(mut stream) => {
                    let handler = Arc::clone(&handler);
                    tokio::spawn(async move {
                        match IpcServer::receive_request(&mut stream).await {
                            Ok(request) => {
                                let response = handler.handle(request);
                                if let Err(e) = IpcServer::send_response(&mut stream, &response).await {
                                    warn!(error = %e, "failed to send response");
                                }
                            }
                            Err(e) => warn!(error = %e, "failed to read request"),
                        }
                    });
                }
                Err(e) => warn!(error = %e, "failed to accept connection"),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}
