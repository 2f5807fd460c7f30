//! A single keyed countdown timer.
//!
//! Each instance owns one state machine and at most one armed tick schedule.
//! The current `TimerState` lives inside a `tokio::sync::watch` channel:
//! every transition is a closure applied under the channel's lock, so a
//! command and a tick callback racing on the same key cannot lose updates.
//!
//! Commands that tear down a run (`pause`, `stop`, `reset`) bump the run
//! generation before cancelling the schedule. A tick callback carries the
//! generation it was armed with and is dropped when it no longer matches,
//! which makes cancellation synchronous from the caller's point of view: once
//! `pause()` returns, no `Running` tick from the paused run can be observed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::state::TimerState;
use super::ticker::{Tick, TickFn, TickHandle, TickScheduler};

// ============================================================================
// TimerShared
// ============================================================================

/// State shared between the instance and its tick callbacks.
struct TimerShared {
    key: String,
    state_tx: watch::Sender<TimerState>,
    /// Current run generation. Ticks armed under an older generation are
    /// stale and must not touch the state.
    generation: AtomicU64,
}

// ============================================================================
// TimerInstance
// ============================================================================

/// One named countdown: state machine plus the bridge to its tick schedule.
///
/// All commands are non-blocking and return the resulting state, unchanged
/// when the command did not apply in the current state.
pub struct TimerInstance {
    shared: Arc<TimerShared>,
    scheduler: Arc<dyn TickScheduler>,
    /// The armed schedule for the current run, if any. Also serializes
    /// command handling; tick callbacks never take this lock.
    armed: Mutex<Option<TickHandle>>,
}

impl TimerInstance {
    /// Creates an instance in `Uninitialized` for the given key.
    pub fn new(key: impl Into<String>, scheduler: Arc<dyn TickScheduler>) -> Self {
        let (state_tx, _) = watch::channel(TimerState::Uninitialized);
        Self {
            shared: Arc::new(TimerShared {
                key: key.into(),
                state_tx,
                generation: AtomicU64::new(0),
            }),
            scheduler,
            armed: Mutex::new(None),
        }
    }

    /// The key this instance is registered under.
    pub fn key(&self) -> &str {
        &self.shared.key
    }

    /// Subscribes to the state stream. The receiver observes the current
    /// state immediately and every subsequent transition after that.
    pub fn watch(&self) -> watch::Receiver<TimerState> {
        self.shared.state_tx.subscribe()
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> TimerState {
        self.shared.state_tx.borrow().clone()
    }

    /// Unconditionally re-arms the timer: cancels any in-flight ticking and
    /// moves to `Ready { total, tick_interval }` from any state.
    pub fn reset(&self, total: Duration, tick_interval: Duration) -> TimerState {
        let mut armed = self.lock_armed();
        self.invalidate_run(&mut armed);

        let next = TimerState::Ready {
            total,
            tick_interval,
        };
        self.shared.state_tx.send_replace(next.clone());
        next
    }

    /// Starts the countdown. Valid only from `Ready`; otherwise a warning is
    /// logged and the state is returned unchanged.
    pub fn start(&self) -> TimerState {
        let mut armed = self.lock_armed();

        let mut result = TimerState::Uninitialized;
        let mut to_arm = None;
        self.shared.state_tx.send_if_modified(|state| {
            // All payload fields are Copy, so matching by value copies them
            // out before the state is overwritten.
            match *state {
                TimerState::Ready {
                    total,
                    tick_interval,
                } => {
                    to_arm = Some((total, total, tick_interval));
                    *state = TimerState::Running {
                        started_at: Utc::now(),
                        remaining: total,
                        total,
                        tick_interval,
                    };
                    result = state.clone();
                    true
                }
                TimerState::Uninitialized
                | TimerState::Running { .. }
                | TimerState::Paused { .. }
                | TimerState::Completed { .. } => {
                    result = state.clone();
                    false
                }
            }
        });

        match to_arm {
            Some((seed, run_total, tick_interval)) => {
                *armed = Some(self.arm(seed, run_total, tick_interval));
            }
            None => {
                warn!(
                    key = %self.shared.key,
                    state = result.phase_name(),
                    "start ignored: timer is not ready"
                );
            }
        }
        result
    }

    /// Suspends a running countdown, freezing `remaining` as of the last
    /// tick. Valid only from `Running`; otherwise no-op plus warning.
    pub fn pause(&self) -> TimerState {
        let mut armed = self.lock_armed();
        self.invalidate_run(&mut armed);

        let mut result = TimerState::Uninitialized;
        let changed = self.shared.state_tx.send_if_modified(|state| match *state {
            TimerState::Running {
                started_at,
                remaining,
                total,
                tick_interval,
            } => {
                *state = TimerState::Paused {
                    started_at,
                    remaining,
                    total,
                    tick_interval,
                };
                result = state.clone();
                true
            }
            TimerState::Uninitialized
            | TimerState::Ready { .. }
            | TimerState::Paused { .. }
            | TimerState::Completed { .. } => {
                result = state.clone();
                false
            }
        });

        if !changed {
            warn!(
                key = %self.shared.key,
                state = result.phase_name(),
                "pause ignored: timer is not running"
            );
        }
        result
    }

    /// Resumes a paused countdown from the preserved `remaining`, keeping
    /// `started_at` and `total` from the paused run. Valid only from
    /// `Paused`; otherwise no-op plus warning.
    pub fn resume(&self) -> TimerState {
        let mut armed = self.lock_armed();

        let mut result = TimerState::Uninitialized;
        let mut to_arm = None;
        self.shared.state_tx.send_if_modified(|state| match *state {
            TimerState::Paused {
                started_at,
                remaining,
                total,
                tick_interval,
            } => {
                to_arm = Some((remaining, total, tick_interval));
                *state = TimerState::Running {
                    started_at,
                    remaining,
                    total,
                    tick_interval,
                };
                result = state.clone();
                true
            }
            TimerState::Uninitialized
            | TimerState::Ready { .. }
            | TimerState::Running { .. }
            | TimerState::Completed { .. } => {
                result = state.clone();
                false
            }
        });

        match to_arm {
            Some((seed, run_total, tick_interval)) => {
                *armed = Some(self.arm(seed, run_total, tick_interval));
            }
            None => {
                warn!(
                    key = %self.shared.key,
                    state = result.phase_name(),
                    "resume ignored: timer is not paused"
                );
            }
        }
        result
    }

    /// Stops a running or paused countdown, re-arming the full original
    /// duration: the result is `Ready { total, tick_interval }`, not the
    /// remaining time. Otherwise no-op plus warning.
    pub fn stop(&self) -> TimerState {
        let mut armed = self.lock_armed();
        self.invalidate_run(&mut armed);

        let mut result = TimerState::Uninitialized;
        let changed = self.shared.state_tx.send_if_modified(|state| match *state {
            TimerState::Running {
                total,
                tick_interval,
                ..
            }
            | TimerState::Paused {
                total,
                tick_interval,
                ..
            } => {
                *state = TimerState::Ready {
                    total,
                    tick_interval,
                };
                result = state.clone();
                true
            }
            TimerState::Uninitialized
            | TimerState::Ready { .. }
            | TimerState::Completed { .. } => {
                result = state.clone();
                false
            }
        });

        if !changed {
            warn!(
                key = %self.shared.key,
                state = result.phase_name(),
                "stop ignored: timer is not running or paused"
            );
        }
        result
    }

    // ------------------------------------------------------------------------
    // Internal
    // ------------------------------------------------------------------------

    fn lock_armed(&self) -> MutexGuard<'_, Option<TickHandle>> {
        // A poisoned lock only means a panicking thread held it; the handle
        // inside is still valid, so recover rather than propagate.
        self.armed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Invalidates in-flight ticks and cancels the armed schedule, if any.
    fn invalidate_run(&self, armed: &mut MutexGuard<'_, Option<TickHandle>>) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = armed.take() {
            handle.cancel();
        }
    }

    /// Arms a schedule counting down from `seed` and wires its ticks back
    /// into this instance under a fresh generation.
    fn arm(&self, seed: Duration, run_total: Duration, tick_interval: Duration) -> TickHandle {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let shared = Arc::clone(&self.shared);
        let on_tick: TickFn = Arc::new(move |tick| {
            apply_tick(&shared, generation, run_total, tick_interval, tick);
        });
        self.scheduler.schedule(seed, tick_interval, on_tick)
    }

    /// Test hook: applies a tick against the current generation, bypassing
    /// the scheduler. Used to exercise the recovery path.
    #[cfg(test)]
    fn apply_tick_now(&self, run_total: Duration, tick_interval: Duration, tick: Tick) {
        let generation = self.shared.generation.load(Ordering::SeqCst);
        apply_tick(&self.shared, generation, run_total, tick_interval, tick);
    }
}

/// Applies one tick from the schedule armed under `generation`.
fn apply_tick(
    shared: &TimerShared,
    generation: u64,
    run_total: Duration,
    tick_interval: Duration,
    tick: Tick,
) {
    if shared.generation.load(Ordering::SeqCst) != generation {
        return;
    }

    let mut recovered_from = None;
    shared.state_tx.send_if_modified(|state| {
        // Re-check under the channel lock: a command may have invalidated
        // this run after the check above.
        if shared.generation.load(Ordering::SeqCst) != generation {
            return false;
        }

        match *state {
            TimerState::Running {
                started_at, total, ..
            } => {
                match tick {
                    Tick::Progress { remaining } => {
                        *state = TimerState::Running {
                            started_at,
                            remaining: remaining.min(total),
                            total,
                            tick_interval,
                        };
                    }
                    Tick::Finished => {
                        *state = TimerState::Completed { started_at, total };
                    }
                }
                true
            }
            TimerState::Paused { .. } | TimerState::Completed { .. } => {
                // A current-generation tick cannot normally observe these;
                // drop it without publishing.
                debug!(key = %shared.key, state = state.phase_name(), "dropping tick");
                false
            }
            TimerState::Ready { .. } | TimerState::Uninitialized => {
                // The tick outlived the state it was armed against. Rebuild
                // a plausible run from the time-left signal instead of
                // dropping it: best effort, not a correctness guarantee.
                recovered_from = Some(state.phase_name());
                match tick {
                    Tick::Progress { remaining } => {
                        let remaining = remaining.min(run_total);
                        let elapsed = run_total - remaining;
                        let started_at = Utc::now()
                            - chrono::Duration::from_std(elapsed)
                                .unwrap_or_else(|_| chrono::Duration::zero());
                        *state = TimerState::Running {
                            started_at,
                            remaining,
                            total: run_total,
                            tick_interval,
                        };
                    }
                    Tick::Finished => {
                        let started_at = Utc::now()
                            - chrono::Duration::from_std(run_total)
                                .unwrap_or_else(|_| chrono::Duration::zero());
                        *state = TimerState::Completed {
                            started_at,
                            total: run_total,
                        };
                    }
                }
                true
            }
        }
    });

    if let Some(phase) = recovered_from {
        warn!(
            key = %shared.key,
            state = phase,
            "tick fired against an inactive timer; estimated run start"
        );
    }
}

// ============================================================================
// Tests
// ============================================================================
