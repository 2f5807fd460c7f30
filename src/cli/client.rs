//! IPC client for communicating with the pomidor daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Request/response handling
//! - Connection retry logic
//! - Timeout handling

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::cli::commands::SessionArgs;
use crate::types::{IpcRequest, IpcResponse, SessionParams};

// ============================================================================
// Constants
// ============================================================================

/// Default socket path relative to the home directory
const DEFAULT_SOCKET_PATH: &str = ".pomidor/pomidor.sock";

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Maximum response size in bytes (64KB)
const MAX_RESPONSE_SIZE: usize = 65536;

/// Maximum retry attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
pub struct IpcClient {
    /// Socket path
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
}

impl IpcClient {
    /// Creates a new IPC client with the default socket path.
    pub fn new() -> Result<Self> {
        let socket_path = default_socket_path()?;
        Ok(Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        })
    }

    /// Creates a new IPC client with a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        }
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &PathBuf {
        &self.socket_path
    }

    /// Sends a start command to the daemon.
    pub async fn start(&self, args: &SessionArgs) -> Result<IpcResponse> {
        let request = IpcRequest::Start {
            params: session_params(args),
        };
        self.send_request_with_retry(&request).await
    }

    /// Sends a reset command to the daemon.
    pub async fn reset(&self, args: &SessionArgs) -> Result<IpcResponse> {
        let request = IpcRequest::Reset {
            params: session_params(args),
        };
        self.send_request_with_retry(&request).await
    }

    /// Sends a pause command to the daemon.
    pub async fn pause(&self, key: Option<String>) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Pause { key }).await
    }

    /// Sends a resume command to the daemon.
    pub async fn resume(&self, key: Option<String>) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Resume { key }).await
    }

    /// Sends a stop command to the daemon.
    pub async fn stop(&self, key: Option<String>) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Stop { key }).await
    }

    /// Sends a status query to the daemon.
    pub async fn status(&self, key: Option<String>) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Status { key }).await
    }

    /// Sends a request to the daemon with retry logic.
    async fn send_request_with_retry(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match self.send_request(request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(attempt, max = MAX_RETRIES, error = %e, "request failed");
                    last_error = Some(e);

                    if attempt < MAX_RETRIES {
                        let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("request failed")))
    }

    /// Sends a single request to the daemon.
    async fn send_request(&self, request: &IpcRequest) -> Result<IpcResponse> {
        // Connect with timeout
        let mut stream = timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("connection timed out")?
            .context("cannot reach the daemon; start it with 'pomidor daemon'")?;

        // Serialize request
        let request_json =
            serde_json::to_string(request).context("failed to serialize request")?;

        // Send request with timeout
        timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            stream.write_all(request_json.as_bytes()),
        )
        .await
        .context("write timed out")?
        .context("failed to send request")?;

        timeout(Duration::from_secs(IO_TIMEOUT_SECS), stream.flush())
            .await
            .context("flush timed out")?
            .context("failed to flush request")?;

        // Shutdown write side to signal end of request
        stream
            .shutdown()
            .await
            .context("failed to shut down write side")?;

        // Read response with timeout
        let mut buffer = vec![0u8; MAX_RESPONSE_SIZE];
        let n = timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await
        .context("read timed out")?
        .context("failed to read response")?;

        if n == 0 {
            anyhow::bail!("daemon closed the connection without responding");
        }

        // Deserialize response
        let response: IpcResponse =
            serde_json::from_slice(&buffer[..n]).context("failed to parse response")?;

        // Surface daemon-side errors to the caller
        if !response.is_success() {
            anyhow::bail!("{}", response.message);
        }

        Ok(response)
    }
}

/// Returns the default socket path (`$HOME/.pomidor/pomidor.sock`).
pub fn default_socket_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable is not set")?;
    Ok(PathBuf::from(home).join(DEFAULT_SOCKET_PATH))
}

fn session_params(args: &SessionArgs) -> SessionParams {
    SessionParams {
        minutes: args.minutes,
        tick_interval_ms: args.tick_interval,
        key: args.key.clone(),
    }
}

// ============================================================================
// Tests
// ============================================================================
