//! Tick scheduling for countdown timers.
//!
//! A `TickScheduler` arms a countdown: it invokes a callback with the time
//! left every interval until the countdown reaches zero or the returned
//! handle is cancelled. The production implementation drives ticks from a
//! tokio task; `ManualTickScheduler` is a deterministic double advanced
//! explicitly by tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::MissedTickBehavior;

// ============================================================================
// Tick
// ============================================================================

/// One update from an armed countdown schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The countdown is still in flight with `remaining` time left.
    Progress {
        /// Time left on this schedule.
        remaining: Duration,
    },
    /// The countdown reached zero. No further ticks are delivered.
    Finished,
}

/// Callback invoked for every tick of an armed schedule.
pub type TickFn = Arc<dyn Fn(Tick) + Send + Sync>;

// ============================================================================
// TickHandle
// ============================================================================

/// Cancellation handle for an armed schedule.
///
/// Dropping the handle cancels the schedule as well, so a replaced schedule
/// can never keep ticking unnoticed.
pub struct TickHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TickHandle {
    /// Wraps a cancellation action.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Cancels the schedule. No ticks with stale payloads are applied after
    /// cancellation (callers invalidate their run generation first).
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for TickHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

// ============================================================================
// TickScheduler
// ============================================================================

/// Capability to drive periodic countdown ticks.
pub trait TickScheduler: Send + Sync {
    /// Arms a countdown of `total` reporting progress every `interval`.
    ///
    /// The callback receives `Tick::Progress { remaining }` at each interval
    /// boundary and a single `Tick::Finished` once the countdown elapses.
    /// Cancelling the returned handle stops further callbacks.
    fn schedule(&self, total: Duration, interval: Duration, on_tick: TickFn) -> TickHandle;
}

// ============================================================================
// TokioTickScheduler
// ============================================================================

/// Production scheduler backed by a spawned tokio task.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioTickScheduler;

impl TokioTickScheduler {
    /// Creates a new tokio-backed scheduler.
    pub fn new() -> Self {
        Self
    }
}

impl TickScheduler for TokioTickScheduler {
    fn schedule(&self, total: Duration, interval: Duration, on_tick: TickFn) -> TickHandle {
        // A zero interval would busy-loop the ticker task.
        let interval = interval.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let started = tokio::time::Instant::now();
            let mut ticker = tokio::time::interval_at(started + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                let elapsed = started.elapsed();
                if elapsed >= total {
                    on_tick(Tick::Finished);
                    break;
                }
                on_tick(Tick::Progress {
                    remaining: total - elapsed,
                });
            }
        });

        TickHandle::new(move || handle.abort())
    }
}

// ============================================================================
// ManualTickScheduler
// ============================================================================

struct ManualCountdown {
    total: Duration,
    interval: Duration,
    elapsed: Duration,
    /// Time advanced past the last interval boundary.
    carry: Duration,
    finished: bool,
    cancelled: Arc<AtomicBool>,
    on_tick: TickFn,
}

/// Deterministic scheduler for tests: time only moves when `advance` is
/// called, and ticks fire synchronously inside that call.
#[derive(Default)]
pub struct ManualTickScheduler {
    countdowns: Mutex<Vec<ManualCountdown>>,
}

impl ManualTickScheduler {
    /// Creates an empty manual scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances virtual time by `step`, firing every due tick synchronously.
    pub fn advance(&self, step: Duration) {
        let mut countdowns = self
            .countdowns
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        for countdown in countdowns.iter_mut() {
            if countdown.finished || countdown.cancelled.load(Ordering::SeqCst) {
                continue;
            }

            countdown.carry += step;
            while countdown.carry >= countdown.interval {
                if countdown.cancelled.load(Ordering::SeqCst) {
                    break;
                }
                countdown.carry -= countdown.interval;
                countdown.elapsed += countdown.interval;

                if countdown.elapsed >= countdown.total {
                    countdown.finished = true;
                    (countdown.on_tick)(Tick::Finished);
                    break;
                }
                (countdown.on_tick)(Tick::Progress {
                    remaining: countdown.total - countdown.elapsed,
                });
            }
        }

        countdowns.retain(|c| !c.finished && !c.cancelled.load(Ordering::SeqCst));
    }

    /// Number of schedules still armed (neither finished nor cancelled).
    pub fn active_count(&self) -> usize {
        let countdowns = self
            .countdowns
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        countdowns
            .iter()
            .filter(|c| !c.finished && !c.cancelled.load(Ordering::SeqCst))
            .count()
    }
}

impl TickScheduler for ManualTickScheduler {
    fn schedule(&self, total: Duration, interval: Duration, on_tick: TickFn) -> TickHandle {
        let interval = interval.max(Duration::from_millis(1));
        let cancelled = Arc::new(AtomicBool::new(false));

        let mut countdowns = self
            .countdowns
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        countdowns.push(ManualCountdown {
            total,
            interval,
            elapsed: Duration::ZERO,
            carry: Duration::ZERO,
            finished: false,
            cancelled: Arc::clone(&cancelled),
            on_tick,
        });

        TickHandle::new(move || cancelled.store(true, Ordering::SeqCst))
    }
}

// ============================================================================
// Tests
// ============================================================================
