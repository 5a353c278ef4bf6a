//! Change history, newest entry first.
//!
//! View events and events flagged as telemetry are acknowledged but never
//! stored. The list is capped; the oldest entries fall off the end.

use std::collections::VecDeque;
use std::path::PathBuf;

use chrono::Local;
use ganttboard_proto::event::{HistoryEntry, LogRequest};
use tokio::sync::RwLock;

use crate::{StoreError, read_json, write_json};

/// Default number of entries kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// User recorded when an event carries none.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Format of the server-side receipt timestamp.
pub const DATE_TIME_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

/// What happened to a submitted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// The event was added to the history.
    Stored,
    /// The event was a view or telemetry event and was dropped.
    Skipped,
}

/// Capped change history.
pub struct ChangeHistory {
    path: Option<PathBuf>,
    limit: usize,
    entries: RwLock<VecDeque<HistoryEntry>>,
}

impl Default for ChangeHistory {
    fn default() -> Self {
        Self::in_memory(DEFAULT_HISTORY_LIMIT)
    }
}

impl ChangeHistory {
    /// Creates an empty history that is never written to disk.
    #[must_use]
    pub fn in_memory(limit: usize) -> Self {
        Self {
            path: None,
            limit,
            entries: RwLock::new(VecDeque::new()),
        }
    }

    /// Opens the history stored at `path`, trimming it to `limit`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read or parsed.
    pub async fn open(path: PathBuf, limit: usize) -> Result<Self, StoreError> {
        let mut entries: VecDeque<HistoryEntry> = read_json::<Vec<HistoryEntry>>(&path).await?.into();
        entries.truncate(limit);
        Ok(Self {
            path: Some(path),
            limit,
            entries: RwLock::new(entries),
        })
    }

    /// Stamps and prepends a submitted event.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if writing the history fails.
    pub async fn record(&self, request: LogRequest) -> Result<Recorded, StoreError> {
        if !request.is_persistable() {
            tracing::debug!(task_id = %request.event.task_id, "view event skipped");
            return Ok(Recorded::Skipped);
        }
        let mut event = request.event;
        if event.user.as_deref().is_none_or(|u| u.trim().is_empty()) {
            event.user = Some(ANONYMOUS_USER.to_string());
        }
        let entry = HistoryEntry {
            event,
            date_time: Local::now().format(DATE_TIME_FORMAT).to_string(),
        };

        let mut entries = self.entries.write().await;
        entries.push_front(entry);
        entries.truncate(self.limit);
        if let Some(path) = &self.path {
            write_json(path, &*entries).await?;
        }
        Ok(Recorded::Stored)
    }

    /// Stored entries, newest first.
    pub async fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.read().await.iter().cloned().collect()
    }
}
