//! IPC server for the pomidor daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for timer commands
//! - Dispatch onto the `TimerRegistry`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::time::{timeout, Duration};

use crate::timer::{TimerRegistry, TimerState};
use crate::types::{IpcRequest, IpcResponse, SessionConfig, SessionParams, TimerSnapshot};

use super::SESSION_KEY;

// ============================================================================
// Constants
// ============================================================================

/// Default socket path relative to the home directory
pub const DEFAULT_SOCKET_PATH: &str = ".pomidor/pomidor.sock";

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Socket binding error
    #[error("failed to bind socket: {0}")]
    Bind(String),

    /// Read error
    #[error("failed to read request: {0}")]
    Read(String),

    /// Timeout error
    #[error("operation timed out")]
    Timeout,

    /// Request too large
    #[error("request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// A stale socket file is removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("failed to remove stale socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .map_err(|e| IpcError::Bind(e.to_string()))
            .with_context(|| format!("failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Applies a read timeout to prevent blocking indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = vec![0u8; MAX_REQUEST_SIZE];

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await;

        let n = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(IpcError::Read(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        };

        if n == 0 {
            anyhow::bail!("connection closed by client");
        }
        if n >= MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest = serde_json::from_slice(&buffer[..n])
            .context("failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("failed to write response")?;
        stream.flush().await.context("failed to flush response")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        // Clean up socket file on drop
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to the timer registry.
pub struct RequestHandler {
    /// Shared reference to the timer registry
    registry: Arc<TimerRegistry>,
}

impl RequestHandler {
    /// Creates a new request handler over the given registry.
    pub fn new(registry: Arc<TimerRegistry>) -> Self {
        Self { registry }
    }

    /// Handles an IPC request and returns the appropriate response.
    pub fn handle(&self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Reset { params } => self.handle_reset(params),
            IpcRequest::Start { params } => self.handle_start(params),
            IpcRequest::Pause { key } => self.handle_pause(key),
            IpcRequest::Resume { key } => self.handle_resume(key),
            IpcRequest::Stop { key } => self.handle_stop(key),
            IpcRequest::Status { key } => self.handle_status(key),
        }
    }

    /// Handles the reset command.
    fn handle_reset(&self, params: SessionParams) -> IpcResponse {
        let key = resolve_key(&params.key);
        let config = SessionConfig::default().with_overrides(&params);
        if let Err(e) = config.validate() {
            return IpcResponse::error(e);
        }

        let state =
            self.registry
                .reset_timer(&key, config.session_duration(), config.tick_interval());
        IpcResponse::success(
            "Timer re-armed",
            Some(TimerSnapshot::from_state(&key, &state)),
        )
    }

    /// Handles the start command.
    ///
    /// Re-arms the timer first when duration overrides are given or the key
    /// has never been configured.
    fn handle_start(&self, params: SessionParams) -> IpcResponse {
        let key = resolve_key(&params.key);

        let current = self.registry.snapshot(&key);
        if params.has_overrides() || current == TimerState::Uninitialized {
            let config = SessionConfig::default().with_overrides(&params);
            if let Err(e) = config.validate() {
                return IpcResponse::error(e);
            }
            self.registry
                .reset_timer(&key, config.session_duration(), config.tick_interval());
        } else if current.is_completed() {
            // A finished session restarts at its previous duration.
            if let Some(total) = current.total() {
                let interval = current
                    .tick_interval()
                    .unwrap_or_else(|| SessionConfig::default().tick_interval());
                self.registry.reset_timer(&key, total, interval);
            }
        }

        match self.registry.start_timer(&key) {
            Some(state @ TimerState::Running { .. }) => IpcResponse::success(
                "Session started",
                Some(TimerSnapshot::from_state(&key, &state)),
            ),
            Some(state) => IpcResponse::error(format!(
                "cannot start while {}; pause/resume or stop first",
                state.phase_name()
            )),
            None => IpcResponse::error(format!("no timer registered for key '{}'", key)),
        }
    }

    /// Handles the pause command.
    fn handle_pause(&self, key: Option<String>) -> IpcResponse {
        let key = resolve_key(&key);
        match self.registry.pause_timer(&key) {
            Some(state @ TimerState::Paused { .. }) => IpcResponse::success(
                "Session paused",
                Some(TimerSnapshot::from_state(&key, &state)),
            ),
            Some(state) => {
                IpcResponse::error(format!("cannot pause while {}", state.phase_name()))
            }
            None => IpcResponse::error(format!("no timer registered for key '{}'", key)),
        }
    }

    /// Handles the resume command.
    fn handle_resume(&self, key: Option<String>) -> IpcResponse {
        let key = resolve_key(&key);
        match self.registry.resume_timer(&key) {
            Some(state @ TimerState::Running { .. }) => IpcResponse::success(
                "Session resumed",
                Some(TimerSnapshot::from_state(&key, &state)),
            ),
            Some(state) => {
                IpcResponse::error(format!("cannot resume while {}", state.phase_name()))
            }
            None => IpcResponse::error(format!("no timer registered for key '{}'", key)),
        }
    }

    /// Handles the stop command.
    fn handle_stop(&self, key: Option<String>) -> IpcResponse {
        let key = resolve_key(&key);
        match self.registry.stop_timer(&key) {
            Some(state @ TimerState::Ready { .. }) => IpcResponse::success(
                "Session stopped",
                Some(TimerSnapshot::from_state(&key, &state)),
            ),
            Some(state) => {
                IpcResponse::error(format!("cannot stop while {}", state.phase_name()))
            }
            None => IpcResponse::error(format!("no timer registered for key '{}'", key)),
        }
    }

    /// Handles the status command.
    fn handle_status(&self, key: Option<String>) -> IpcResponse {
        let key = resolve_key(&key);
        let state = self.registry.snapshot(&key);
        IpcResponse::success("", Some(TimerSnapshot::from_state(&key, &state)))
    }
}

fn resolve_key(key: &Option<String>) -> String {
    key.clone().unwrap_or_else(|| SESSION_KEY.to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{ManualTickScheduler, TickScheduler};

    // ------------------------------------------------------------------------
    // Helper functions
    // ------------------------------------------------------------------------

    fn create_temp_socket_path() -> PathBuf {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sock");
        // Keep the directory so it's not deleted
        std::mem::forget(dir);
        path
    }

    fn create_handler() -> (Arc<ManualTickScheduler>, RequestHandler) {
        let scheduler = Arc::new(ManualTickScheduler::new());
        let registry = Arc::new(TimerRegistry::new(
            Arc::clone(&scheduler) as Arc<dyn TickScheduler>
        ));
        (scheduler, RequestHandler::new(registry))
    }

    fn params(minutes: u32) -> SessionParams {
        SessionParams {
            minutes: Some(minutes),
            ..Default::default()
        }
    }

    // ------------------------------------------------------------------------
    // IpcServer Tests
    // ------------------------------------------------------------------------

    mod ipc_server_tests {
        use super::*;

        #[tokio::test]
        async fn test_server_creation() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path);

            assert!(server.is_ok());
            assert!(socket_path.exists());
        }

        #[tokio::test]
        async fn test_server_removes_stale_socket() {
            let socket_path = create_temp_socket_path();
            std::fs::write(&socket_path, "stale").unwrap();

            let server = IpcServer::new(&socket_path);
            assert!(server.is_ok());
        }

        #[tokio::test]
        async fn test_server_creates_parent_directory() {
            let dir = tempfile::tempdir().unwrap();
            let socket_path = dir.path().join("subdir").join("test.sock");

            let server = IpcServer::new(&socket_path);
            assert!(server.is_ok());
            assert!(socket_path.parent().unwrap().exists());
        }

        #[tokio::test]
        async fn test_request_response_round_trip() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let client = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                stream
                    .write_all(br#"{"command":"status"}"#)
                    .await
                    .unwrap();
                stream.flush().await.unwrap();

                let mut buffer = vec![0u8; 4096];
                let n = stream.read(&mut buffer).await.unwrap();
                serde_json::from_slice::<IpcResponse>(&buffer[..n]).unwrap()
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await.unwrap();
            assert!(matches!(request, IpcRequest::Status { key: None }));

            let response = IpcResponse::success("ok", None);
            IpcServer::send_response(&mut stream, &response).await.unwrap();

            let received = client.await.unwrap();
            assert!(received.is_success());
        }

        #[tokio::test]
        async fn test_receive_request_invalid_json() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let _client = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                stream.write_all(b"not valid json").await.unwrap();
                stream.flush().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await;
            assert!(request.is_err());
        }

        #[tokio::test]
        async fn test_connection_closed_by_client() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let _client = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let stream = UnixStream::connect(&client_path).await.unwrap();
                drop(stream);
            });

            let mut stream = server.accept().await.unwrap();
            let result = IpcServer::receive_request(&mut stream).await;
            assert!(result.is_err());
        }

        #[test]
        fn test_ipc_error_display() {
            let err = IpcError::Bind("address in use".to_string());
            assert_eq!(err.to_string(), "failed to bind socket: address in use");

            let err = IpcError::Timeout;
            assert_eq!(err.to_string(), "operation timed out");

            let err = IpcError::RequestTooLarge;
            assert!(err.to_string().contains("4096"));
        }

        #[tokio::test]
        async fn test_server_drop_cleanup() {
            let socket_path = create_temp_socket_path();

            {
                let _server = IpcServer::new(&socket_path).unwrap();
                assert!(socket_path.exists());
            }

            assert!(!socket_path.exists());
        }
    }

    // ------------------------------------------------------------------------
    // RequestHandler Tests
    // ------------------------------------------------------------------------

    mod request_handler_tests {
        use super::*;

        #[test]
        fn test_handle_status_defaults_to_session_key() {
            let (_scheduler, handler) = create_handler();

            let response = handler.handle(IpcRequest::Status { key: None });

            assert!(response.is_success());
            let data = response.data.unwrap();
            assert_eq!(data.key, SESSION_KEY);
            assert_eq!(data.phase, "uninitialized");
        }

        #[test]
        fn test_handle_reset() {
            let (_scheduler, handler) = create_handler();

            let response = handler.handle(IpcRequest::Reset { params: params(30) });

            assert!(response.is_success());
            let data = response.data.unwrap();
            assert_eq!(data.phase, "ready");
            assert_eq!(data.total_ms, Some(30 * 60 * 1000));
            assert_eq!(data.tick_interval_ms, Some(1000));
        }

        #[test]
        fn test_handle_reset_invalid_config() {
            let (_scheduler, handler) = create_handler();

            let response = handler.handle(IpcRequest::Reset { params: params(0) });

            assert!(!response.is_success());
            assert!(response.message.contains("1 and 180"));
        }

        #[test]
        fn test_handle_start_arms_uninitialized_key_with_defaults() {
            let (_scheduler, handler) = create_handler();

            let response = handler.handle(IpcRequest::Start {
                params: SessionParams::default(),
            });

            assert!(response.is_success());
            let data = response.data.unwrap();
            assert_eq!(data.phase, "running");
            assert_eq!(data.remaining_ms, Some(25 * 60 * 1000));
        }

        #[test]
        fn test_handle_start_with_overrides_rearms() {
            let (_scheduler, handler) = create_handler();
            handler.handle(IpcRequest::Reset { params: params(30) });

            let response = handler.handle(IpcRequest::Start { params: params(5) });

            assert!(response.is_success());
            let data = response.data.unwrap();
            assert_eq!(data.remaining_ms, Some(5 * 60 * 1000));
        }

        #[test]
        fn test_handle_start_already_running() {
            let (_scheduler, handler) = create_handler();
            handler.handle(IpcRequest::Start {
                params: SessionParams::default(),
            });

            let response = handler.handle(IpcRequest::Start {
                params: SessionParams::default(),
            });

            assert!(!response.is_success());
            assert!(response.message.contains("running"));
        }

        #[test]
        fn test_handle_start_after_completion_restarts() {
            let (scheduler, handler) = create_handler();
            handler.handle(IpcRequest::Start {
                params: SessionParams {
                    minutes: Some(1),
                    tick_interval_ms: Some(30_000),
                    key: None,
                },
            });
            scheduler.advance(Duration::from_secs(60));

            let status = handler.handle(IpcRequest::Status { key: None });
            assert_eq!(status.data.unwrap().phase, "completed");

            let response = handler.handle(IpcRequest::Start {
                params: SessionParams::default(),
            });
            assert!(response.is_success());
            let data = response.data.unwrap();
            assert_eq!(data.phase, "running");
            assert_eq!(data.total_ms, Some(60_000));
        }

        #[test]
        fn test_handle_pause_and_resume() {
            let (_scheduler, handler) = create_handler();
            handler.handle(IpcRequest::Start {
                params: SessionParams::default(),
            });

            let paused = handler.handle(IpcRequest::Pause { key: None });
            assert!(paused.is_success());
            assert_eq!(paused.data.unwrap().phase, "paused");

            let resumed = handler.handle(IpcRequest::Resume { key: None });
            assert!(resumed.is_success());
            assert_eq!(resumed.data.unwrap().phase, "running");
        }

        #[test]
        fn test_handle_pause_not_running() {
            let (_scheduler, handler) = create_handler();
            handler.handle(IpcRequest::Reset { params: params(25) });

            let response = handler.handle(IpcRequest::Pause { key: None });

            assert!(!response.is_success());
            assert!(response.message.contains("cannot pause"));
        }

        #[test]
        fn test_handle_pause_unknown_key() {
            let (_scheduler, handler) = create_handler();

            let response = handler.handle(IpcRequest::Pause {
                key: Some("ghost".to_string()),
            });

            assert!(!response.is_success());
            assert!(response.message.contains("ghost"));
        }

        #[test]
        fn test_handle_stop_restores_full_duration() {
            let (scheduler, handler) = create_handler();
            handler.handle(IpcRequest::Start {
                params: SessionParams {
                    minutes: Some(1),
                    tick_interval_ms: Some(1000),
                    key: None,
                },
            });
            scheduler.advance(Duration::from_secs(30));

            let response = handler.handle(IpcRequest::Stop { key: None });

            assert!(response.is_success());
            let data = response.data.unwrap();
            assert_eq!(data.phase, "ready");
            assert_eq!(data.total_ms, Some(60_000));
        }

        #[test]
        fn test_handle_resume_not_paused() {
            let (_scheduler, handler) = create_handler();

            let response = handler.handle(IpcRequest::Resume {
                key: Some("nope".to_string()),
            });

            assert!(!response.is_success());
        }

        #[test]
        fn test_handle_commands_on_custom_key() {
            let (_scheduler, handler) = create_handler();

            let response = handler.handle(IpcRequest::Start {
                params: SessionParams {
                    key: Some("side".to_string()),
                    ..Default::default()
                },
            });

            assert!(response.is_success());
            assert_eq!(response.data.unwrap().key, "side");

            // The well-known session key is untouched.
            let status = handler.handle(IpcRequest::Status { key: None });
            assert_eq!(status.data.unwrap().phase, "uninitialized");
        }
    }
}
