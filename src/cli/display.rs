//! Display utilities for the pomidor CLI.
//!
//! This module provides formatted output for:
//! - Success messages
//! - Error messages
//! - Status display
//! - History listing

use chrono::Local;

use crate::history::SessionRecord;
use crate::types::{IpcResponse, TimerSnapshot};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows a success message for session start.
    pub fn show_start(response: &IpcResponse) {
        println!("* Session started");
        if let Some(data) = &response.data {
            Self::show_remaining(data);
        }
    }

    /// Shows a success message for session pause.
    pub fn show_pause(response: &IpcResponse) {
        println!("|| Session paused");
        if let Some(data) = &response.data {
            Self::show_remaining(data);
        }
    }

    /// Shows a success message for session resume.
    pub fn show_resume(response: &IpcResponse) {
        println!("> Session resumed");
        if let Some(data) = &response.data {
            Self::show_remaining(data);
        }
    }

    /// Shows a success message for session stop.
    pub fn show_stop(response: &IpcResponse) {
        println!("[] Session stopped");
        if let Some(data) = &response.data {
            if let Some(total) = data.total_ms {
                let (minutes, seconds) = Self::format_time_ms(total);
                println!("  re-armed at: {}:{:02}", minutes, seconds);
            }
        }
    }

    /// Shows a success message for session reset.
    pub fn show_reset(response: &IpcResponse) {
        println!("* Timer re-armed");
        if let Some(data) = &response.data {
            if let Some(total) = data.total_ms {
                let (minutes, seconds) = Self::format_time_ms(total);
                println!("  duration: {}:{:02}", minutes, seconds);
            }
        }
    }

    /// Shows the current session state.
    pub fn show_status(response: &IpcResponse) {
        println!("pomidor status");
        println!("-----------------------------");

        let Some(data) = &response.data else {
            println!("state: unknown");
            return;
        };

        let phase_display = match data.phase.as_str() {
            "uninitialized" => "not configured",
            "ready" => "ready",
            "running" => "running",
            "paused" => "paused",
            "completed" => "completed",
            other => other,
        };
        println!("key:   {}", data.key);
        println!("state: {}", phase_display);

        if let Some(remaining) = data.remaining_ms {
            let (minutes, seconds) = Self::format_time_ms(remaining);
            println!("left:  {}:{:02}", minutes, seconds);
        }
        if let Some(total) = data.total_ms {
            let (minutes, seconds) = Self::format_time_ms(total);
            println!("total: {}:{:02}", minutes, seconds);
        }
        if let Some(started_at) = data.started_at {
            println!(
                "since: {}",
                started_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
            );
        }
    }

    /// Shows the most recent completed sessions, newest first.
    pub fn show_history(records: &[SessionRecord], limit: usize) {
        println!("completed sessions");
        println!("-----------------------------");

        if records.is_empty() {
            println!("(none yet)");
            return;
        }

        for record in records.iter().rev().take(limit) {
            let (minutes, seconds) = Self::format_time_ms(record.duration_ms);
            println!(
                "{}  {}:{:02}",
                record
                    .completed_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M"),
                minutes,
                seconds
            );
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("error: {}", message);
    }

    fn show_remaining(data: &TimerSnapshot) {
        if let Some(remaining) = data.remaining_ms {
            let (minutes, seconds) = Self::format_time_ms(remaining);
            println!("  remaining: {}:{:02}", minutes, seconds);
        }
    }

    /// Splits milliseconds into whole minutes and leftover seconds.
    fn format_time_ms(ms: u64) -> (u64, u64) {
        let total_seconds = ms / 1000;
        (total_seconds / 60, total_seconds % 60)
    }
}

// ============================================================================
// Tests
// ============================================================================
