//! In-process backend.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use ganttboard_proto::catalog::Catalog;
use ganttboard_proto::event::ChangeEvent;
use ganttboard_proto::task::{Task, TaskId};

use super::{BackendError, ChangeLog, GoodsCatalog, TaskRepository, WarehouseDirectory};

/// Entries kept in the change history.
pub const HISTORY_LIMIT: usize = 100;

#[derive(Debug, Default)]
struct State {
    tasks: HashMap<TaskId, Task>,
    history: VecDeque<ChangeEvent>,
    observed: usize,
    catalog: Catalog,
    warehouses: Vec<String>,
}

/// Implements every collaborator in memory.
///
/// Clones share state, so a test can hand one clone to the board and
/// inspect another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the goods catalog.
    #[must_use]
    pub fn with_catalog(self, catalog: Catalog) -> Self {
        self.state.lock().catalog = catalog;
        self
    }

    /// Replaces the warehouse directory.
    #[must_use]
    pub fn with_warehouses<I, S>(self, warehouses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.lock().warehouses = warehouses.into_iter().map(Into::into).collect();
        self
    }

    /// Stored change history, newest first.
    #[must_use]
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.state.lock().history.iter().cloned().collect()
    }

    /// Number of events seen, stored or not.
    #[must_use]
    pub fn observed_events(&self) -> usize {
        self.state.lock().observed
    }

    /// Stored copy of a task.
    #[must_use]
    pub fn stored(&self, id: &TaskId) -> Option<Task> {
        self.state.lock().tasks.get(id).cloned()
    }
}

impl TaskRepository for InMemoryBackend {
    async fn create(&self, task: &Task) -> Result<(), BackendError> {
        self.state.lock().tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        match state.tasks.get_mut(&task.id) {
            Some(stored) => {
                *stored = task.clone();
                Ok(())
            }
            None => Err(BackendError::NotFound(format!("task {}", task.id))),
        }
    }

    async fn delete(&self, id: &TaskId) -> Result<(), BackendError> {
        self.state
            .lock()
            .tasks
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(format!("task {id}")))
    }

    async fn list_all(&self) -> Result<Vec<Task>, BackendError> {
        let mut tasks: Vec<Task> = self.state.lock().tasks.values().cloned().collect();
        tasks.sort_by(|a, b| a.row.cmp(&b.row).then(a.start.cmp(&b.start)));
        Ok(tasks)
    }
}

impl ChangeLog for InMemoryBackend {
    async fn record(&self, event: &ChangeEvent, skip_persist: bool) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        state.observed += 1;
        if skip_persist || event.is_view() {
            return Ok(());
        }
        state.history.push_front(event.clone());
        state.history.truncate(HISTORY_LIMIT);
        Ok(())
    }
}

impl GoodsCatalog for InMemoryBackend {
    async fn list_categorized(&self) -> Result<Catalog, BackendError> {
        Ok(self.state.lock().catalog.clone())
    }
}

impl WarehouseDirectory for InMemoryBackend {
    async fn list_warehouses(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.state.lock().warehouses.clone())
    }
}
