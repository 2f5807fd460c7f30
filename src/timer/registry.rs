//! Key-addressed registry of countdown timers.
//!
//! The registry owns the `key -> TimerInstance` map and routes every public
//! command to the addressed instance. `reset_timer` and the state surface
//! (`watch_timer`/`snapshot`) create the instance on first reference; the
//! remaining commands only route to an existing instance and report a missing
//! key as a non-fatal error. Entries are never evicted for the lifetime of
//! the process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::error;

use super::instance::TimerInstance;
use super::state::TimerState;
use super::ticker::TickScheduler;

// ============================================================================
// TimerRegistry
// ============================================================================

/// Process-wide collection of independently addressable countdown timers.
///
/// Callers hold an explicit reference; there is no global singleton. The
/// get-or-create path runs under a single lock, so concurrent first access
/// to the same key always yields one instance.
pub struct TimerRegistry {
    scheduler: Arc<dyn TickScheduler>,
    timers: Mutex<HashMap<String, Arc<TimerInstance>>>,
}

impl TimerRegistry {
    /// Creates an empty registry driving all timers through `scheduler`.
    pub fn new(scheduler: Arc<dyn TickScheduler>) -> Self {
        Self {
            scheduler,
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Re-arms the timer for `key` with a fresh duration and tick interval,
    /// creating the instance if this is the first reference to the key.
    pub fn reset_timer(
        &self,
        key: &str,
        total: Duration,
        tick_interval: Duration,
    ) -> TimerState {
        self.get_or_create(key).reset(total, tick_interval)
    }

    /// Starts the timer for `key`. Returns `None` (and logs an error) when
    /// no timer was ever registered under the key.
    pub fn start_timer(&self, key: &str) -> Option<TimerState> {
        self.route(key, "start", |timer| timer.start())
    }

    /// Pauses the timer for `key`, if it exists.
    pub fn pause_timer(&self, key: &str) -> Option<TimerState> {
        self.route(key, "pause", |timer| timer.pause())
    }

    /// Resumes the timer for `key`, if it exists.
    pub fn resume_timer(&self, key: &str) -> Option<TimerState> {
        self.route(key, "resume", |timer| timer.resume())
    }

    /// Stops the timer for `key`, if it exists.
    pub fn stop_timer(&self, key: &str) -> Option<TimerState> {
        self.route(key, "stop", |timer| timer.stop())
    }

    /// Subscribes to the state stream for `key`, creating the instance if
    /// absent. The receiver observes the current state immediately, then
    /// every subsequent transition.
    pub fn watch_timer(&self, key: &str) -> watch::Receiver<TimerState> {
        self.get_or_create(key).watch()
    }

    /// Returns a copy of the current state for `key`, creating the instance
    /// if absent.
    pub fn snapshot(&self, key: &str) -> TimerState {
        self.get_or_create(key).snapshot()
    }

    /// Returns true when an instance already exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.lock_timers().contains_key(key)
    }

    // ------------------------------------------------------------------------
    // Internal
    // ------------------------------------------------------------------------

    fn lock_timers(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, Arc<TimerInstance>>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get_or_create(&self, key: &str) -> Arc<TimerInstance> {
        let mut timers = self.lock_timers();
        Arc::clone(timers.entry(key.to_string()).or_insert_with(|| {
            Arc::new(TimerInstance::new(key, Arc::clone(&self.scheduler)))
        }))
    }

    fn route(
        &self,
        key: &str,
        command: &str,
        apply: impl FnOnce(&TimerInstance) -> TimerState,
    ) -> Option<TimerState> {
        let existing = self.lock_timers().get(key).cloned();
        match existing {
            Some(timer) => Some(apply(&timer)),
            None => {
                error!(key, command, "no timer registered for key; command dropped");
                None
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
