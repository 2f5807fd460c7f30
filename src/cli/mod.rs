//! CLI module for the pomidor timer.
//!
//! This module contains the client side of the application:
//! - `commands`: clap command definitions
//! - `client`: IPC client for daemon communication
//! - `display`: formatted terminal output

pub mod client;
pub mod commands;
pub mod display;

pub use client::{default_socket_path, IpcClient};
pub use commands::{Cli, Commands, DaemonArgs, HistoryArgs, KeyArgs, SessionArgs};
pub use display::Display;
