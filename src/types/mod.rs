//! Shared data types for the pomidor daemon and CLI.
//!
//! This module defines:
//! - Session configuration with validation
//! - The serializable timer state projection consumed by service/CLI layers
//! - IPC request/response serialization

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerState;

// ============================================================================
// SessionConfig
// ============================================================================

/// Configuration for one countdown session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session length in minutes (1-180)
    pub minutes: u32,
    /// Tick interval in milliseconds (100-60000)
    pub tick_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            minutes: 25,
            tick_interval_ms: 1000,
        }
    }
}

impl SessionConfig {
    /// Applies optional overrides on top of this configuration.
    pub fn with_overrides(mut self, params: &SessionParams) -> Self {
        if let Some(minutes) = params.minutes {
            self.minutes = minutes;
        }
        if let Some(tick_interval_ms) = params.tick_interval_ms {
            self.tick_interval_ms = tick_interval_ms;
        }
        self
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.minutes < 1 || self.minutes > 180 {
            return Err("session length must be between 1 and 180 minutes".to_string());
        }
        if self.tick_interval_ms < 100 || self.tick_interval_ms > 60_000 {
            return Err("tick interval must be between 100 and 60000 milliseconds".to_string());
        }
        Ok(())
    }

    /// Full session duration.
    pub fn session_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.minutes) * 60)
    }

    /// Tick period.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

// ============================================================================
// TimerSnapshot
// ============================================================================

/// Serializable projection of one timer's current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    /// Key the timer is registered under
    pub key: String,
    /// Phase name: "uninitialized", "ready", "running", "paused", "completed"
    pub phase: String,
    /// Remaining milliseconds, when the state carries a countdown
    #[serde(rename = "remainingMs", skip_serializing_if = "Option::is_none")]
    pub remaining_ms: Option<u64>,
    /// Full run duration in milliseconds
    #[serde(rename = "totalMs", skip_serializing_if = "Option::is_none")]
    pub total_ms: Option<u64>,
    /// Tick interval in milliseconds
    #[serde(rename = "tickIntervalMs", skip_serializing_if = "Option::is_none")]
    pub tick_interval_ms: Option<u64>,
    /// Wall-clock start of the current run segment
    #[serde(rename = "startedAt", skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl TimerSnapshot {
    /// Projects a `TimerState` into its wire shape.
    pub fn from_state(key: &str, state: &TimerState) -> Self {
        Self {
            key: key.to_string(),
            phase: state.phase_name().to_string(),
            remaining_ms: state.remaining().map(duration_ms),
            total_ms: state.total().map(duration_ms),
            tick_interval_ms: state.tick_interval().map(duration_ms),
            started_at: state.started_at(),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

// ============================================================================
// IPC Types
// ============================================================================

/// Optional session parameters carried by reset/start requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionParams {
    /// Session length in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes: Option<u32>,
    /// Tick interval in milliseconds
    #[serde(rename = "tickIntervalMs", skip_serializing_if = "Option::is_none")]
    pub tick_interval_ms: Option<u64>,
    /// Timer key; the daemon substitutes the session key when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl SessionParams {
    /// Returns true when any duration override is present.
    pub fn has_overrides(&self) -> bool {
        self.minutes.is_some() || self.tick_interval_ms.is_some()
    }
}

/// IPC request from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum IpcRequest {
    /// Re-arm a timer with a fresh duration
    Reset {
        /// Reset parameters
        #[serde(flatten)]
        params: SessionParams,
    },
    /// Start the armed timer (re-arming first when overrides are given)
    Start {
        /// Start parameters
        #[serde(flatten)]
        params: SessionParams,
    },
    /// Pause the running timer
    Pause {
        /// Timer key
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
    /// Resume the paused timer
    Resume {
        /// Timer key
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
    /// Stop the timer, restoring its full duration
    Stop {
        /// Timer key
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
    /// Query the current state
    Status {
        /// Timer key
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Snapshot of the addressed timer, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<TimerSnapshot>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<TimerSnapshot>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true for a success response.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================
