//! Completed-session history.
//!
//! The daemon appends one record per completed countdown to a JSON-lines
//! file under the platform data directory. Records are purely for historical
//! reporting; a write failure never interrupts a session.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// File name of the history file inside the data directory.
const HISTORY_FILE: &str = "history.jsonl";

/// Application directory under the platform data dir.
const APP_DIR: &str = "pomidor";

// ============================================================================
// HistoryError
// ============================================================================

/// History store error types.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Platform data directory could not be determined
    #[error("no data directory available on this platform")]
    NoDataDir,

    /// Filesystem error
    #[error("history file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Record (de)serialization error
    #[error("history record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ============================================================================
// SessionRecord
// ============================================================================

/// One completed countdown session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Record identifier
    pub id: Uuid,
    /// Session duration in milliseconds
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    /// When the session run began
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
    /// When the countdown reached zero
    #[serde(rename = "completedAt")]
    pub completed_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Creates a record for a session that just completed.
    pub fn completed_now(duration: Duration, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            duration_ms: duration.as_millis() as u64,
            started_at,
            completed_at: Utc::now(),
        }
    }
}

// ============================================================================
// HistoryStore
// ============================================================================

/// Append-only JSON-lines store for completed sessions.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Creates a store writing to the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at the default platform location
    /// (`<data_dir>/pomidor/history.jsonl`).
    pub fn open_default() -> Result<Self, HistoryError> {
        Ok(Self::new(Self::default_path()?))
    }

    /// Returns the default history file path.
    pub fn default_path() -> Result<PathBuf, HistoryError> {
        let data_dir = dirs::data_dir().ok_or(HistoryError::NoDataDir)?;
        Ok(data_dir.join(APP_DIR).join(HISTORY_FILE))
    }

    /// Returns the file path this store writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record, creating the file and its parent directory on
    /// first use.
    pub fn append(&self, record: &SessionRecord) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(record)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Loads all records in append order. A missing file yields an empty
    /// history; a corrupt line fails the load.
    pub fn load(&self) -> Result<Vec<SessionRecord>, HistoryError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let reader = BufReader::new(file);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

// ============================================================================
// Tests
// ============================================================================
