//! Session service: the daemon-side consumer of the well-known session key.
//!
//! The service subscribes to the session timer's state stream and reacts to
//! transitions: it emits user-facing notices and appends a history record
//! on each completion. All reactions live here, outside the timer core.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::history::{HistoryStore, SessionRecord};
use crate::timer::{TimerRegistry, TimerState};

use super::notify::{Notifier, SessionNotice};
use super::SESSION_KEY;

// ============================================================================
// SessionService
// ============================================================================

/// Watches the session timer and turns its transitions into notices and
/// persisted completion records.
pub struct SessionService {
    registry: Arc<TimerRegistry>,
    history: HistoryStore,
    notifier: Arc<dyn Notifier>,
    last: TimerState,
}

impl SessionService {
    /// Creates a service bound to the well-known session key.
    pub fn new(
        registry: Arc<TimerRegistry>,
        history: HistoryStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            registry,
            history,
            notifier,
            last: TimerState::Uninitialized,
        }
    }

    /// Runs until the watched timer's channel closes.
    ///
    /// Should be spawned as a separate tokio task.
    pub async fn run(mut self) {
        let mut rx = self.registry.watch_timer(SESSION_KEY);
        self.last = rx.borrow_and_update().clone();

        loop {
            if rx.changed().await.is_err() {
                debug!("session state stream closed; service exiting");
                break;
            }
            let state = rx.borrow_and_update().clone();
            self.observe(state);
        }
    }

    /// Applies one observed transition.
    fn observe(&mut self, state: TimerState) {
        let prev = std::mem::replace(&mut self.last, state.clone());

        match (&prev, &state) {
            (p, TimerState::Completed { started_at, total })
                if !matches!(p, TimerState::Completed { .. }) =>
            {
                self.notifier
                    .notify(&SessionNotice::Completed { total: *total });
                let record = SessionRecord::completed_now(*total, *started_at);
                if let Err(e) = self.history.append(&record) {
                    warn!(error = %e, "failed to persist completed session");
                }
            }
            (
                TimerState::Ready { .. } | TimerState::Uninitialized,
                TimerState::Running { total, .. },
            ) => {
                self.notifier
                    .notify(&SessionNotice::Started { total: *total });
            }
            (TimerState::Running { .. }, TimerState::Paused { remaining, .. }) => {
                self.notifier.notify(&SessionNotice::Paused {
                    remaining: *remaining,
                });
            }
            (TimerState::Paused { .. }, TimerState::Running { remaining, .. }) => {
                self.notifier.notify(&SessionNotice::Resumed {
                    remaining: *remaining,
                });
            }
            (
                TimerState::Running { .. } | TimerState::Paused { .. },
                TimerState::Ready { .. },
            ) => {
                self.notifier.notify(&SessionNotice::Stopped);
            }
            // Per-tick Running updates and re-arms carry no notice.
            _ => {}
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
