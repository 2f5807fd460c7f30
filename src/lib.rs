//! Pomidor Timer Library
//!
//! This library provides the core functionality for the pomidor CLI/daemon.
//! It includes:
//! - Keyed countdown timer registry with observable per-key state streams
//! - Injectable tick scheduling (tokio-backed, plus a deterministic manual
//!   scheduler for tests)
//! - IPC server/client for daemon-CLI communication
//! - Session service reacting to timer transitions (notices, history)
//! - Completed-session history persistence
//! - CLI command parsing and display utilities

pub mod cli;
pub mod daemon;
pub mod history;
pub mod timer;
pub mod types;

// Re-export commonly used types for convenience
pub use timer::{
    ManualTickScheduler, Tick, TickHandle, TickScheduler, TimerInstance, TimerRegistry,
    TimerState, TokioTickScheduler,
};

pub use types::{IpcRequest, IpcResponse, SessionConfig, SessionParams, TimerSnapshot};

pub use history::{HistoryError, HistoryStore, SessionRecord};

pub use daemon::{
    LogNotifier, MockNotifier, Notifier, SessionNotice, SessionService, SESSION_KEY,
};
