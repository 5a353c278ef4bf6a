//! File-backed task table.
//!
//! Tasks are held in memory behind a [`RwLock`] and written back to a JSON
//! file after every change. Listing prunes tasks that started before the
//! retention cutoff and persists the removal.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use ganttboard_proto::task::{Task, TaskId};
use tokio::sync::RwLock;

use crate::{StoreError, read_json, write_json};

/// Task table keyed by id.
pub struct TaskDb {
    path: Option<PathBuf>,
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl Default for TaskDb {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl TaskDb {
    /// Creates an empty table that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            tasks: RwLock::new(HashMap::new()),
        }
    }

    /// Opens the table stored at `path`. A missing file is an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read or parsed.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        let stored: Vec<Task> = read_json(&path).await?;
        tracing::info!(path = %path.display(), tasks = stored.len(), "task table loaded");
        Ok(Self {
            tasks: RwLock::new(stored.into_iter().map(|t| (t.id.clone(), t)).collect()),
            path: Some(path),
        })
    }

    /// Every task starting on or after `cutoff`, ordered by row then start.
    ///
    /// Older tasks are deleted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if writing the pruned table fails.
    pub async fn list(&self, cutoff: NaiveDate) -> Result<Vec<Task>, StoreError> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, task| task.start >= cutoff);
        let pruned = before - tasks.len();
        if pruned > 0 {
            tracing::info!(pruned, %cutoff, "expired tasks removed");
            self.flush(&tasks).await?;
        }
        let mut listed: Vec<Task> = tasks.values().cloned().collect();
        drop(tasks);
        listed.sort_by(|a, b| a.row.cmp(&b.row).then(a.start.cmp(&b.start)));
        Ok(listed)
    }

    /// Stores `task`, replacing any task with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if writing the table fails.
    pub async fn insert(&self, task: Task) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        tracing::debug!(task_id = %task.id, "task created");
        tasks.insert(task.id.clone(), task);
        self.flush(&tasks).await
    }

    /// Replaces an existing task. Returns `false` if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if writing the table fails.
    pub async fn replace(&self, task: Task) -> Result<bool, StoreError> {
        let mut tasks = self.tasks.write().await;
        let Some(slot) = tasks.get_mut(&task.id) else {
            return Ok(false);
        };
        *slot = task;
        self.flush(&tasks).await?;
        Ok(true)
    }

    /// Deletes a task. Returns `false` if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if writing the table fails.
    pub async fn remove(&self, id: &TaskId) -> Result<bool, StoreError> {
        let mut tasks = self.tasks.write().await;
        if tasks.remove(id).is_none() {
            return Ok(false);
        }
        self.flush(&tasks).await?;
        Ok(true)
    }

    /// Number of stored tasks, expired ones included.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Whether the table is empty.
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    async fn flush(&self, tasks: &HashMap<TaskId, Task>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut rows: Vec<&Task> = tasks.values().collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        write_json(path, &rows).await
    }
}
