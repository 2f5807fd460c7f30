//! Timer state machine data for a single keyed countdown.
//!
//! `TimerState` is the value published on each timer's watch channel. Every
//! transition site matches all five variants; there is no catch-all arm in
//! the core so a new variant forces every site to be revisited.

use std::time::Duration;

use chrono::{DateTime, Utc};

// ============================================================================
// TimerState
// ============================================================================

/// The lifecycle state of one keyed countdown timer.
///
/// `started_at` records the wall-clock instant the current run segment began
/// and is carried unchanged through `pause`/`resume`. `remaining` is always
/// within `[0, total]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerState {
    /// No configuration has been applied to this key yet.
    Uninitialized,
    /// Configured and armed, not counting down.
    Ready {
        /// Full countdown duration for the next run.
        total: Duration,
        /// Period between tick updates.
        tick_interval: Duration,
    },
    /// Counting down.
    Running {
        /// When the current run segment began.
        started_at: DateTime<Utc>,
        /// Time left, as of the most recent tick.
        remaining: Duration,
        /// Full countdown duration of this run.
        total: Duration,
        /// Period between tick updates.
        tick_interval: Duration,
    },
    /// Counting down is suspended; `remaining` is frozen at pause time.
    Paused {
        /// When the paused run segment began.
        started_at: DateTime<Utc>,
        /// Time left captured at pause time.
        remaining: Duration,
        /// Full countdown duration of this run.
        total: Duration,
        /// Period between tick updates.
        tick_interval: Duration,
    },
    /// The countdown reached zero.
    Completed {
        /// When the completed run began.
        started_at: DateTime<Utc>,
        /// Full countdown duration of the completed run.
        total: Duration,
    },
}

impl TimerState {
    /// Returns the lowercase phase name used by logs and the IPC projection.
    pub fn phase_name(&self) -> &'static str {
        match self {
            TimerState::Uninitialized => "uninitialized",
            TimerState::Ready { .. } => "ready",
            TimerState::Running { .. } => "running",
            TimerState::Paused { .. } => "paused",
            TimerState::Completed { .. } => "completed",
        }
    }

    /// Returns true while the countdown is actively ticking.
    pub fn is_running(&self) -> bool {
        matches!(self, TimerState::Running { .. })
    }

    /// Returns true while the countdown is suspended.
    pub fn is_paused(&self) -> bool {
        matches!(self, TimerState::Paused { .. })
    }

    /// Returns true once the countdown has reached zero.
    pub fn is_completed(&self) -> bool {
        matches!(self, TimerState::Completed { .. })
    }

    /// Time left in the current run, if the state carries one.
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            TimerState::Uninitialized | TimerState::Ready { .. } => None,
            TimerState::Running { remaining, .. } | TimerState::Paused { remaining, .. } => {
                Some(*remaining)
            }
            TimerState::Completed { .. } => Some(Duration::ZERO),
        }
    }

    /// Full duration of the configured or in-flight run, if any.
    pub fn total(&self) -> Option<Duration> {
        match self {
            TimerState::Uninitialized => None,
            TimerState::Ready { total, .. }
            | TimerState::Running { total, .. }
            | TimerState::Paused { total, .. }
            | TimerState::Completed { total, .. } => Some(*total),
        }
    }

    /// Tick period of the configured or in-flight run, if any.
    pub fn tick_interval(&self) -> Option<Duration> {
        match self {
            TimerState::Uninitialized | TimerState::Completed { .. } => None,
            TimerState::Ready { tick_interval, .. }
            | TimerState::Running { tick_interval, .. }
            | TimerState::Paused { tick_interval, .. } => Some(*tick_interval),
        }
    }

    /// Wall-clock start of the current run segment, if one exists.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match self {
            TimerState::Uninitialized | TimerState::Ready { .. } => None,
            TimerState::Running { started_at, .. }
            | TimerState::Paused { started_at, .. }
            | TimerState::Completed { started_at, .. } => Some(*started_at),
        }
    }
}

impl Default for TimerState {
    fn default() -> Self {
        TimerState::Uninitialized
    }
}

// ============================================================================
// Tests
// ============================================================================
