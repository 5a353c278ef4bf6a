//! The [`Board`] and its operations.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use tokio::sync::mpsc;

use ganttboard_proto::catalog::GoodsItem;
use ganttboard_proto::codec::BoardSnapshot;
use ganttboard_proto::event::{ChangeEvent, EventKind};
use ganttboard_proto::palette::StatusColor;
use ganttboard_proto::task::{OrderMap, Task, TaskId};

use super::store::{TaskRecord, TaskStore};
use super::{BoardError, BoardSettings, BoardWarning};
use crate::backend::{ChangeLog, TaskRepository};
use crate::geometry::Timeline;
use crate::interaction::commit::EVENT_DATE_FORMAT;
use crate::interaction::{CommitKind, ResizePreview, is_noop, placement_events};
use crate::reconcile::{self, DisplayMode, OrderView, SaveOutcome, apply_catalog_selection};
use crate::warehouse::{self, AllocationRow, AllocationSaved, WarehouseSummary};

/// Placeholder for an empty value in change-log text.
const EMPTY_VALUE: &str = "—";

/// How a commit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Nothing changed since the last acknowledged state; nothing was sent.
    Unchanged,
    /// The backend acknowledged the task.
    Persisted,
    /// The save failed; the board kept its local state.
    Failed,
}

impl CommitOutcome {
    const fn from_saved(saved: bool) -> Self {
        if saved { Self::Persisted } else { Self::Failed }
    }
}

/// Backend handles plus the warning channel.
///
/// Kept apart from the store so a task record can stay borrowed while a
/// save is awaited.
struct Collaborators<R, L> {
    repo: R,
    log: L,
    user: Option<String>,
    warning_tx: mpsc::Sender<BoardWarning>,
}

impl<R: TaskRepository, L: ChangeLog> Collaborators<R, L> {
    /// Saves the full task. On acknowledgment the record's placement and
    /// comment become the new last known good.
    async fn persist(&self, record: &mut TaskRecord) -> bool {
        let result = if record.stored {
            self.repo.update(&record.task).await
        } else {
            self.repo.create(&record.task).await
        };
        match result {
            Ok(()) => {
                record.stored = true;
                record.last_good = record.task.placement();
                record.last_good_comment.clone_from(&record.task.comment);
                true
            }
            Err(err) => {
                tracing::warn!(
                    task_id = %record.task.id,
                    error = %err,
                    "task save failed, keeping local state"
                );
                // Best-effort: a full channel drops the warning.
                let _ = self.warning_tx.try_send(BoardWarning::SaveFailed {
                    task_id: record.task.id.clone(),
                    reason: err.to_string(),
                });
                false
            }
        }
    }

    async fn emit(&self, event: ChangeEvent, skip_persist: bool) {
        let event = match &self.user {
            Some(user) => event.with_user(user.clone()),
            None => event,
        };
        if let Err(err) = self.log.record(&event, skip_persist).await {
            tracing::warn!(
                task_id = %event.task_id,
                kind = %event.kind,
                error = %err,
                "change-log event lost"
            );
            let _ = self.warning_tx.try_send(BoardWarning::LogFailed {
                task_id: event.task_id.clone(),
                reason: err.to_string(),
            });
        }
    }

    async fn emit_all(&self, events: Vec<ChangeEvent>) {
        for event in events {
            self.emit(event, false).await;
        }
    }
}

/// A scheduling board bound to a task repository and a change log.
///
/// Operations take `&mut self` and await their saves, so saves issued
/// through one board never overlap.
pub struct Board<R: TaskRepository, L: ChangeLog> {
    settings: BoardSettings,
    timeline: Timeline,
    store: TaskStore,
    io: Collaborators<R, L>,
}

impl<R: TaskRepository, L: ChangeLog> Board<R, L> {
    /// Creates an empty board whose window is centred on `today`.
    ///
    /// Returns the board and a receiver for [`BoardWarning`]s.
    #[must_use]
    pub fn new(
        settings: BoardSettings,
        today: NaiveDate,
        repo: R,
        log: L,
    ) -> (Self, mpsc::Receiver<BoardWarning>) {
        let (warning_tx, warning_rx) = mpsc::channel(settings.warning_buffer.max(1));
        let timeline = Timeline::around(
            today,
            settings.history_days,
            settings.forward_days,
            settings.column_width,
        );
        let board = Self {
            io: Collaborators {
                repo,
                log,
                user: settings.user.clone(),
                warning_tx,
            },
            settings,
            timeline,
            store: TaskStore::new(),
        };
        (board, warning_rx)
    }

    /// Returns the current timestamp in milliseconds since epoch.
    fn now_ms() -> u64 {
        u64::try_from(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis(),
        )
        .unwrap_or(u64::MAX)
    }

    fn event(kind: EventKind, id: &TaskId) -> ChangeEvent {
        ChangeEvent::new(kind, id.clone(), Self::now_ms())
    }

    /// Construction settings.
    #[must_use]
    pub const fn settings(&self) -> &BoardSettings {
        &self.settings
    }

    /// Day grid of the board.
    #[must_use]
    pub const fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Tasks sorted by row, then start date.
    #[must_use]
    pub fn tasks(&self) -> Vec<&Task> {
        self.store.iter_sorted().into_iter().map(|r| &r.task).collect()
    }

    /// Looks a task up.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for unknown ids.
    pub fn task(&self, id: &TaskId) -> Result<&Task, BoardError> {
        self.store.get(id).map(|r| &r.task)
    }

    /// Looks a task's full record up.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for unknown ids.
    pub fn record(&self, id: &TaskId) -> Result<&TaskRecord, BoardError> {
        self.store.get(id)
    }

    // -----------------------------------------------------------------------
    // Task lifecycle
    // -----------------------------------------------------------------------

    /// Replaces the board's tasks with what the repository holds.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Backend`] if the repository cannot be read;
    /// the board is left unchanged.
    pub async fn load(&mut self) -> Result<usize, BoardError> {
        let tasks = self.io.repo.list_all().await?;
        let count = tasks.len();
        self.store.restore(tasks, &self.timeline);
        tracing::info!(count, "board loaded");
        Ok(count)
    }

    /// Adds a task of the default duration at `row` starting on `start`.
    ///
    /// The task stays on the board even if the backend rejects it; the next
    /// successful save stores it.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::RowOutOfRange`] if `row` is not on the board.
    pub async fn create_task(&mut self, row: u32, start: NaiveDate) -> Result<TaskId, BoardError> {
        if row >= self.settings.rows {
            return Err(BoardError::RowOutOfRange {
                row,
                rows: self.settings.rows,
            });
        }
        let task = Task::new(row, start, self.settings.default_task_days);
        let id = task.id.clone();
        let record = self.store.insert(task, &self.timeline)?;
        self.io
            .emit(
                Self::event(EventKind::Create, &id)
                    .with_values(EMPTY_VALUE, start.format(EVENT_DATE_FORMAT).to_string())
                    .with_comment("task created"),
                false,
            )
            .await;
        self.io.persist(record).await;
        tracing::debug!(task_id = %id, row, %start, "task created");
        Ok(id)
    }

    /// Removes a task from the board and the backend.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for unknown ids.
    pub async fn delete_task(&mut self, id: &TaskId) -> Result<(), BoardError> {
        let record = self.store.remove(id)?;
        self.io
            .emit(
                Self::event(EventKind::Delete, id)
                    .with_values(
                        record.task.start.format(EVENT_DATE_FORMAT).to_string(),
                        EMPTY_VALUE,
                    )
                    .with_comment("task deleted"),
                false,
            )
            .await;
        if record.stored
            && let Err(err) = self.io.repo.delete(id).await
        {
            tracing::warn!(task_id = %id, error = %err, "task delete failed");
            let _ = self.io.warning_tx.try_send(BoardWarning::DeleteFailed {
                task_id: id.clone(),
                reason: err.to_string(),
            });
        }
        Ok(())
    }

    /// Highlights a task.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for unknown ids.
    pub fn highlight(&mut self, id: &TaskId) -> Result<(), BoardError> {
        self.store.highlight(id)
    }

    /// Currently highlighted task.
    #[must_use]
    pub const fn highlighted(&self) -> Option<&TaskId> {
        self.store.highlighted()
    }

    // -----------------------------------------------------------------------
    // Gestures
    // -----------------------------------------------------------------------

    /// Starts dragging a bar.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] or a gesture error.
    pub fn begin_drag(&mut self, id: &TaskId) -> Result<(), BoardError> {
        Ok(self.store.get_mut(id)?.gesture.begin_drag()?)
    }

    /// Moves a dragged bar by `dx` pixels; returns its drawn left edge.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] or a gesture error.
    pub fn drag_by(&mut self, id: &TaskId, dx: f64) -> Result<f64, BoardError> {
        Ok(self.store.get_mut(id)?.gesture.drag_by(dx)?)
    }

    /// Starts resizing a bar's trailing edge.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] or a gesture error.
    pub fn begin_resize(&mut self, id: &TaskId) -> Result<(), BoardError> {
        let record = self.store.get_mut(id)?;
        Ok(record.gesture.begin_resize(&record.task, &self.timeline)?)
    }

    /// Moves the trailing edge so the bar is `width` pixels wide.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] or a gesture error.
    pub fn resize_to(&mut self, id: &TaskId, width: f64) -> Result<ResizePreview, BoardError> {
        let record = self.store.get_mut(id)?;
        Ok(record
            .gesture
            .resize_to(&mut record.task, &self.timeline, width)?)
    }

    /// Releases a drag or resize and commits the result.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] or a gesture error. A failed
    /// save is not an error; see [`CommitOutcome::Failed`].
    pub async fn end_gesture(&mut self, id: &TaskId) -> Result<CommitOutcome, BoardError> {
        let timeline = self.timeline;
        let record = self.store.get_mut(id)?;
        let kind = record.gesture.end(&mut record.task, &timeline)?;
        let current = record.task.placement();

        if is_noop(&record.last_good, &current) {
            tracing::debug!(task_id = %id, ?kind, "placement unchanged, nothing to commit");
            record.gesture.finish(&record.task, &timeline, true);
            return Ok(CommitOutcome::Unchanged);
        }

        let events = placement_events(id, &record.last_good, &current, Self::now_ms());
        self.io.emit_all(events).await;
        let saved = self.io.persist(record).await;
        record.gesture.finish(&record.task, &timeline, saved);
        Ok(CommitOutcome::from_saved(saved))
    }

    /// Replaces a task's comment and commits it. A comment the backend
    /// already holds is not sent again; one whose save failed is.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for unknown ids.
    pub async fn edit_comment(&mut self, id: &TaskId, comment: &str) -> Result<CommitOutcome, BoardError> {
        let timeline = self.timeline;
        let record = self.store.get_mut(id)?;
        if record.last_good_comment == comment {
            record.task.comment = comment.to_string();
            return Ok(CommitOutcome::Unchanged);
        }
        let shown = |text: &str| {
            if text.is_empty() {
                EMPTY_VALUE.to_string()
            } else {
                text.to_string()
            }
        };
        let event = Self::event(EventKind::Edit, id)
            .with_values(shown(&record.last_good_comment), shown(comment))
            .with_comment("comment changed");
        record.task.comment = comment.to_string();
        record.gesture.begin_commit(CommitKind::Comment);

        self.io.emit(event, false).await;
        let saved = self.io.persist(record).await;
        record.gesture.finish(&record.task, &timeline, saved);
        Ok(CommitOutcome::from_saved(saved))
    }

    // -----------------------------------------------------------------------
    // Orders
    // -----------------------------------------------------------------------

    /// Opens the order for editing against its current state.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for unknown ids.
    pub fn begin_order_edit(&mut self, id: &TaskId) -> Result<DisplayMode, BoardError> {
        let record = self.store.get_mut(id)?;
        Ok(record.session.begin_edit(&record.task))
    }

    /// Opens the order for editing against an explicit snapshot. Without
    /// one the tooltip stays in View.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for unknown ids.
    pub fn enter_order_edit(
        &mut self,
        id: &TaskId,
        snapshot: Option<OrderMap>,
    ) -> Result<DisplayMode, BoardError> {
        let record = self.store.get_mut(id)?;
        Ok(record.session.enter_edit(snapshot, &record.task))
    }

    /// Sets an item's working quantity; returns the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`], or
    /// [`BoardError::Reconcile`] outside Edit.
    pub fn set_item_quantity(&mut self, id: &TaskId, item: &str, quantity: i64) -> Result<u32, BoardError> {
        Ok(self.store.get_mut(id)?.session.set_quantity(item, quantity)?)
    }

    /// Adds `delta` to an item's working quantity; returns the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`], or
    /// [`BoardError::Reconcile`] outside Edit.
    pub fn adjust_item_quantity(&mut self, id: &TaskId, item: &str, delta: i64) -> Result<u32, BoardError> {
        Ok(self.store.get_mut(id)?.session.adjust_quantity(item, delta)?)
    }

    /// Saves the working order, logs the changes and persists the task.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`], or
    /// [`BoardError::Reconcile`] outside Edit.
    pub async fn save_order(&mut self, id: &TaskId) -> Result<SaveOutcome, BoardError> {
        let record = self.store.get_mut(id)?;
        let outcome = record.session.save(&mut record.task, Self::now_ms())?;
        self.io.emit_all(outcome.events.clone()).await;
        self.io.persist(record).await;
        Ok(outcome)
    }

    /// Discards the working order and returns to View.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`], or
    /// [`BoardError::Reconcile`] outside Edit.
    pub fn cancel_order_edit(&mut self, id: &TaskId) -> Result<(), BoardError> {
        let record = self.store.get_mut(id)?;
        Ok(record.session.cancel(&mut record.task)?)
    }

    /// Closes a Post-Save Diff (or an edit, discarding it).
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for unknown ids.
    pub fn close_order_view(&mut self, id: &TaskId) -> Result<(), BoardError> {
        self.store.get_mut(id)?.session.close();
        Ok(())
    }

    /// Order tooltip in its current mode; `None` when hidden.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for unknown ids.
    pub fn order_view(&self, id: &TaskId) -> Result<Option<OrderView>, BoardError> {
        let record = self.store.get(id)?;
        Ok(record.session.render(&record.task))
    }

    /// Replaces the order from a catalog selection and saves it.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for unknown ids.
    pub async fn apply_catalog_order(
        &mut self,
        id: &TaskId,
        selection: &[(GoodsItem, i64)],
    ) -> Result<SaveOutcome, BoardError> {
        let record = self.store.get_mut(id)?;
        let order = apply_catalog_selection(&mut record.task, selection);
        record.session.begin_edit(&record.task);
        record.session.replace_working(order)?;
        let outcome = record.session.save(&mut record.task, Self::now_ms())?;
        self.io.emit_all(outcome.events.clone()).await;
        self.io.persist(record).await;
        Ok(outcome)
    }

    /// Advances an order item's status color; returns the new color.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for unknown ids.
    pub async fn cycle_item_status(&mut self, id: &TaskId, item: &str) -> Result<StatusColor, BoardError> {
        let record = self.store.get_mut(id)?;
        let (old, new) = reconcile::cycle_item_status(&mut record.task, item);
        self.io
            .emit(
                Self::event(EventKind::Edit, id)
                    .with_item(item)
                    .with_values(old.css(), new.css())
                    .with_color(new.css())
                    .with_comment("item status changed"),
                false,
            )
            .await;
        self.io.persist(record).await;
        Ok(new)
    }

    // -----------------------------------------------------------------------
    // Warehouses
    // -----------------------------------------------------------------------

    /// Opens `warehouse`'s allocation table and highlights the task.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for unknown ids.
    pub async fn open_allocation(&mut self, id: &TaskId, warehouse: &str) -> Result<Vec<AllocationRow>, BoardError> {
        let record = self.store.get_mut(id)?;
        let draft = warehouse::AllocationDraft::open(&record.task, warehouse);
        let rows = draft.rows(&record.task);
        record.allocation = Some(draft);
        self.store.highlight(id)?;
        self.io
            .emit(
                Self::event(EventKind::View, id)
                    .with_warehouse(warehouse)
                    .with_comment("warehouse allocation opened"),
                true,
            )
            .await;
        Ok(rows)
    }

    /// Enters a quantity in the open allocation table; returns the clamped
    /// value.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] or
    /// [`BoardError::NoAllocationOpen`].
    pub fn allocate(&mut self, id: &TaskId, item: &str, quantity: i64) -> Result<u32, BoardError> {
        let record = self.store.get_mut(id)?;
        let draft = record
            .allocation
            .as_mut()
            .ok_or_else(|| BoardError::NoAllocationOpen(id.clone()))?;
        Ok(draft.assign(&record.task, item, quantity))
    }

    /// Rows of the open allocation table.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] or
    /// [`BoardError::NoAllocationOpen`].
    pub fn allocation_rows(&self, id: &TaskId) -> Result<Vec<AllocationRow>, BoardError> {
        let record = self.store.get(id)?;
        let draft = record
            .allocation
            .as_ref()
            .ok_or_else(|| BoardError::NoAllocationOpen(id.clone()))?;
        Ok(draft.rows(&record.task))
    }

    /// Closes the open allocation table without saving.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for unknown ids.
    pub fn close_allocation(&mut self, id: &TaskId) -> Result<(), BoardError> {
        self.store.get_mut(id)?.allocation = None;
        Ok(())
    }

    /// Largest quantity of `item` that `warehouse` may hold right now.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for unknown ids.
    pub fn available_for(&self, id: &TaskId, item: &str, warehouse: &str) -> Result<u32, BoardError> {
        Ok(warehouse::available_for(&self.store.get(id)?.task, item, warehouse))
    }

    /// Saves the open allocation table into the task and persists it.
    ///
    /// Item changes are always logged. A change in the number of
    /// warehouses holding items is logged unless `skip_count_logging`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] or
    /// [`BoardError::NoAllocationOpen`].
    pub async fn save_allocation(
        &mut self,
        id: &TaskId,
        skip_count_logging: bool,
    ) -> Result<AllocationSaved, BoardError> {
        let record = self.store.get_mut(id)?;
        let draft = record
            .allocation
            .take()
            .ok_or_else(|| BoardError::NoAllocationOpen(id.clone()))?;
        let saved = warehouse::save_allocation(&mut record.task, draft);

        let timestamp = Self::now_ms();
        let mut events: Vec<ChangeEvent> = saved
            .changes
            .iter()
            .map(|(item, old, new)| {
                ChangeEvent::new(EventKind::Edit, id.clone(), timestamp)
                    .with_warehouse(&saved.warehouse)
                    .with_item(item)
                    .with_values(old.to_string(), new.to_string())
                    .with_comment("warehouse quantity changed")
            })
            .collect();

        if record.warehouse_count.last().is_none() {
            record.warehouse_count.observe(saved.holding_before);
        }
        if let Some((old, new)) = record.warehouse_count.observe(saved.holding_after)
            && !skip_count_logging
        {
            events.push(
                ChangeEvent::new(EventKind::Edit, id.clone(), timestamp)
                    .with_values(old.to_string(), new.to_string())
                    .with_comment("number of warehouses changed"),
            );
        }

        self.io.emit_all(events).await;
        self.io.persist(record).await;
        Ok(saved)
    }

    /// Advances a warehouse tab's status color; returns the new color.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for unknown ids.
    pub async fn cycle_warehouse_status(
        &mut self,
        id: &TaskId,
        warehouse: &str,
    ) -> Result<StatusColor, BoardError> {
        let record = self.store.get_mut(id)?;
        let (old, new) = warehouse::cycle_warehouse_status(&mut record.task, warehouse);
        self.io
            .emit(
                Self::event(EventKind::Edit, id)
                    .with_warehouse(warehouse)
                    .with_values(old.css(), new.css())
                    .with_color(new.css())
                    .with_comment("warehouse status changed"),
                false,
            )
            .await;
        self.io.persist(record).await;
        Ok(new)
    }

    /// Compact warehouse summary of a task.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for unknown ids.
    pub fn warehouse_summary(&self, id: &TaskId) -> Result<WarehouseSummary, BoardError> {
        Ok(warehouse::summarize(&self.store.get(id)?.task))
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    /// Every task, for export.
    #[must_use]
    pub fn export_snapshot(&self) -> BoardSnapshot {
        let tasks = self.tasks().into_iter().cloned().collect();
        BoardSnapshot::new(tasks, Self::now_ms())
    }

    /// Adds or replaces tasks from a snapshot and saves each one.
    /// Returns how many the backend acknowledged.
    pub async fn import_snapshot(&mut self, snapshot: BoardSnapshot) -> usize {
        let mut acknowledged = 0;
        for task in snapshot.tasks {
            let id = task.id.clone();
            let existing = self.store.get(&id).map(|r| r.stored).ok();
            let placed = match existing {
                Some(stored) => self.store.get_mut(&id).map(|record| {
                    *record = TaskRecord::new(task, &self.timeline, stored);
                    record
                }),
                None => self.store.insert(task, &self.timeline),
            };
            let record = match placed {
                Ok(record) => record,
                Err(err) => {
                    tracing::warn!(task_id = %id, error = %err, "snapshot task skipped");
                    continue;
                }
            };
            if self.io.persist(record).await {
                acknowledged += 1;
            }
        }
        tracing::info!(acknowledged, "snapshot imported");
        acknowledged
    }
}
