//! In-memory task store with per-task interaction state.

use std::collections::HashMap;

use ganttboard_proto::task::{Placement, Task, TaskId};

use super::BoardError;
use crate::geometry::Timeline;
use crate::interaction::GestureTracker;
use crate::reconcile::OrderSession;
use crate::warehouse::{AllocationDraft, WarehouseCountTracker};

/// A task plus everything the board tracks about it between interactions.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    /// The task as currently shown.
    pub task: Task,
    /// Placement the backend last acknowledged.
    pub last_good: Placement,
    /// Comment the backend last acknowledged.
    pub last_good_comment: String,
    /// Drag/resize state of the bar.
    pub gesture: GestureTracker,
    /// Order tooltip state.
    pub session: OrderSession,
    /// Open warehouse allocation table, if any.
    pub allocation: Option<AllocationDraft>,
    /// Warehouses-holding-items counter.
    pub warehouse_count: WarehouseCountTracker,
    /// Whether the backend has acknowledged the task at least once.
    pub stored: bool,
}

impl TaskRecord {
    pub(crate) fn new(task: Task, timeline: &Timeline, stored: bool) -> Self {
        Self {
            last_good: task.placement(),
            last_good_comment: task.comment.clone(),
            stored,
            gesture: GestureTracker::new(&task, timeline),
            session: OrderSession::new(),
            allocation: None,
            warehouse_count: WarehouseCountTracker::new(),
            task,
        }
    }
}

/// Tasks on the board, keyed by id.
///
/// At most one task is highlighted; removing it clears the highlight.
#[derive(Debug, Default)]
pub struct TaskStore {
    records: HashMap<TaskId, TaskRecord>,
    highlighted: Option<TaskId>,
}

impl TaskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task the backend has not stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::DuplicateTask`] if the id is taken.
    pub fn insert(&mut self, task: Task, timeline: &Timeline) -> Result<&mut TaskRecord, BoardError> {
        if self.records.contains_key(&task.id) {
            return Err(BoardError::DuplicateTask(task.id));
        }
        let id = task.id.clone();
        Ok(self
            .records
            .entry(id)
            .or_insert_with(|| TaskRecord::new(task, timeline, false)))
    }

    /// Replaces the whole store with tasks loaded from the backend. Later
    /// duplicates win.
    pub fn restore(&mut self, tasks: Vec<Task>, timeline: &Timeline) {
        self.records = tasks
            .into_iter()
            .map(|task| (task.id.clone(), TaskRecord::new(task, timeline, true)))
            .collect();
        self.highlighted = None;
    }

    /// Looks a task up.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for unknown ids.
    pub fn get(&self, id: &TaskId) -> Result<&TaskRecord, BoardError> {
        self.records
            .get(id)
            .ok_or_else(|| BoardError::TaskNotFound(id.clone()))
    }

    /// Looks a task up for mutation.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for unknown ids.
    pub fn get_mut(&mut self, id: &TaskId) -> Result<&mut TaskRecord, BoardError> {
        self.records
            .get_mut(id)
            .ok_or_else(|| BoardError::TaskNotFound(id.clone()))
    }

    /// Removes a task and returns its record.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for unknown ids.
    pub fn remove(&mut self, id: &TaskId) -> Result<TaskRecord, BoardError> {
        let record = self
            .records
            .remove(id)
            .ok_or_else(|| BoardError::TaskNotFound(id.clone()))?;
        if self.highlighted.as_ref() == Some(id) {
            self.highlighted = None;
        }
        Ok(record)
    }

    /// Highlights `id`, replacing any previous highlight.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for unknown ids.
    pub fn highlight(&mut self, id: &TaskId) -> Result<(), BoardError> {
        self.get(id)?;
        self.highlighted = Some(id.clone());
        Ok(())
    }

    /// Currently highlighted task.
    #[must_use]
    pub const fn highlighted(&self) -> Option<&TaskId> {
        self.highlighted.as_ref()
    }

    /// Records sorted by row, then start date.
    #[must_use]
    pub fn iter_sorted(&self) -> Vec<&TaskRecord> {
        let mut records: Vec<&TaskRecord> = self.records.values().collect();
        records.sort_by(|a, b| {
            a.task
                .row
                .cmp(&b.task.row)
                .then(a.task.start.cmp(&b.task.start))
                .then(a.task.id.cmp(&b.task.id))
        });
        records
    }

    /// Number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the board is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
