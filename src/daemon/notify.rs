//! User-facing notices for session transitions.
//!
//! The timer core's contract ends at emitting state values; how a transition
//! is surfaced to the user is pluggable behind the `Notifier` trait. The
//! default implementation writes structured log lines; tests install
//! `MockNotifier` to capture notices.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::info;

// ============================================================================
// SessionNotice
// ============================================================================

/// A user-visible session event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// A session run began
    Started {
        /// Full session duration
        total: Duration,
    },
    /// The running session was paused
    Paused {
        /// Time left at pause
        remaining: Duration,
    },
    /// The paused session resumed
    Resumed {
        /// Time left at resume
        remaining: Duration,
    },
    /// The session was stopped and re-armed at full duration
    Stopped,
    /// The countdown reached zero
    Completed {
        /// Full duration of the completed session
        total: Duration,
    },
}

// ============================================================================
// Notifier
// ============================================================================

/// Sink for session notices.
pub trait Notifier: Send + Sync {
    /// Delivers one notice.
    fn notify(&self, notice: &SessionNotice);
}

/// Notifier that writes notices to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &SessionNotice) {
        match notice {
            SessionNotice::Started { total } => {
                info!(minutes = total.as_secs() / 60, "session started");
            }
            SessionNotice::Paused { remaining } => {
                info!(remaining_secs = remaining.as_secs(), "session paused");
            }
            SessionNotice::Resumed { remaining } => {
                info!(remaining_secs = remaining.as_secs(), "session resumed");
            }
            SessionNotice::Stopped => {
                info!("session stopped");
            }
            SessionNotice::Completed { total } => {
                info!(minutes = total.as_secs() / 60, "session completed");
            }
        }
    }
}

/// Notifier that records notices for assertions in tests.
#[derive(Debug, Default)]
pub struct MockNotifier {
    notices: Mutex<Vec<SessionNotice>>,
}

impl MockNotifier {
    /// Creates an empty mock notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all notices delivered so far.
    pub fn notices(&self) -> Vec<SessionNotice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for MockNotifier {
    fn notify(&self, notice: &SessionNotice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice.clone());
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_notifier_records_in_order() {
        let notifier = MockNotifier::new();
        notifier.notify(&SessionNotice::Started {
            total: Duration::from_secs(1500),
        });
        notifier.notify(&SessionNotice::Stopped);

        assert_eq!(
            notifier.notices(),
            vec![
                SessionNotice::Started {
                    total: Duration::from_secs(1500)
                },
                SessionNotice::Stopped,
            ]
        );
    }

    #[test]
    fn test_log_notifier_accepts_all_notices() {
        let notifier = LogNotifier;
        for notice in [
            SessionNotice::Started {
                total: Duration::from_secs(60),
            },
            SessionNotice::Paused {
                remaining: Duration::from_secs(30),
            },
            SessionNotice::Resumed {
                remaining: Duration::from_secs(30),
            },
            SessionNotice::Stopped,
            SessionNotice::Completed {
                total: Duration::from_secs(60),
            },
        ] {
            notifier.notify(&notice);
        }
    }
}
