//! Order edit sessions and the save algorithm.

use std::collections::BTreeSet;

use ganttboard_proto::event::{ChangeEvent, EventKind};
use ganttboard_proto::task::{OrderChange, OrderMap, QuantityTrend, Task};

use super::ReconcileError;
use super::view::{self, OrderView};

/// Which face of the order tooltip is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Read-only, compared against the baseline.
    View,
    /// Quantities are being adjusted in a working copy.
    Edit,
    /// Read-only, compared against the order as it was before the last save.
    PostSaveDiff,
}

#[derive(Debug, Clone, Default, PartialEq)]
enum SessionMode {
    #[default]
    View,
    Edit {
        snapshot: OrderMap,
        working: OrderMap,
    },
    PostSaveDiff {
        baseline: OrderMap,
    },
}

/// What a save changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Change-log events for the save, without user stamps.
    pub events: Vec<ChangeEvent>,
    /// Items whose quantity changed.
    pub changed_items: Vec<String>,
    /// Whether this save established the baseline.
    pub established_baseline: bool,
}

/// Per-task order tooltip state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderSession {
    mode: SessionMode,
}

impl OrderSession {
    /// Creates a session in View mode.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current display mode.
    #[must_use]
    pub const fn mode(&self) -> DisplayMode {
        match self.mode {
            SessionMode::View => DisplayMode::View,
            SessionMode::Edit { .. } => DisplayMode::Edit,
            SessionMode::PostSaveDiff { .. } => DisplayMode::PostSaveDiff,
        }
    }

    /// Order captured when editing started.
    #[must_use]
    pub const fn snapshot(&self) -> Option<&OrderMap> {
        match &self.mode {
            SessionMode::Edit { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }

    /// Working copy being edited.
    #[must_use]
    pub const fn working(&self) -> Option<&OrderMap> {
        match &self.mode {
            SessionMode::Edit { working, .. } => Some(working),
            _ => None,
        }
    }

    /// Comparison baseline of a Post-Save Diff.
    #[must_use]
    pub const fn diff_baseline(&self) -> Option<&OrderMap> {
        match &self.mode {
            SessionMode::PostSaveDiff { baseline } => Some(baseline),
            _ => None,
        }
    }

    /// Enters Edit with an explicit comparison snapshot.
    ///
    /// Without a snapshot the session stays in (or returns to) View and a
    /// warning is logged.
    pub fn enter_edit(&mut self, snapshot: Option<OrderMap>, task: &Task) -> DisplayMode {
        match snapshot {
            Some(snapshot) => {
                self.mode = SessionMode::Edit {
                    snapshot,
                    working: task.order.clone(),
                };
            }
            None => {
                tracing::warn!(task_id = %task.id, "edit requested without a snapshot, showing view");
                self.mode = SessionMode::View;
            }
        }
        self.mode()
    }

    /// Enters Edit using the task's current order as the snapshot.
    pub fn begin_edit(&mut self, task: &Task) -> DisplayMode {
        self.enter_edit(Some(task.order.clone()), task)
    }

    fn working_mut(&mut self) -> Result<&mut OrderMap, ReconcileError> {
        match &mut self.mode {
            SessionMode::Edit { working, .. } => Ok(working),
            _ => Err(ReconcileError::NotEditing),
        }
    }

    /// Sets the working quantity of `item`, clamped at zero. A zero
    /// quantity removes the item from the working copy.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::NotEditing`] outside Edit mode.
    pub fn set_quantity(&mut self, item: &str, quantity: i64) -> Result<u32, ReconcileError> {
        let working = self.working_mut()?;
        let clamped = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);
        if clamped == 0 {
            working.remove(item);
        } else {
            working.insert(item.to_string(), clamped);
        }
        Ok(clamped)
    }

    /// Adds `delta` to the working quantity of `item`, clamped at zero.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::NotEditing`] outside Edit mode.
    pub fn adjust_quantity(&mut self, item: &str, delta: i64) -> Result<u32, ReconcileError> {
        let current = self.working_mut()?.get(item).copied().unwrap_or(0);
        self.set_quantity(item, i64::from(current).saturating_add(delta))
    }

    /// Replaces the whole working copy, dropping zero entries.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::NotEditing`] outside Edit mode.
    pub fn replace_working(&mut self, order: OrderMap) -> Result<(), ReconcileError> {
        let working = self.working_mut()?;
        *working = order.into_iter().filter(|&(_, qty)| qty > 0).collect();
        Ok(())
    }

    /// Folds the working copy into `task` and switches to Post-Save Diff.
    ///
    /// Persisting the task is left to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::NotEditing`] outside Edit mode.
    pub fn save(&mut self, task: &mut Task, timestamp: u64) -> Result<SaveOutcome, ReconcileError> {
        let SessionMode::Edit { snapshot, working } = std::mem::take(&mut self.mode) else {
            return Err(ReconcileError::NotEditing);
        };
        let outcome = apply_save(task, &snapshot, working, timestamp);
        self.mode = SessionMode::PostSaveDiff { baseline: snapshot };
        Ok(outcome)
    }

    /// Restores the snapshot and returns to View without saving.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::NotEditing`] outside Edit mode.
    pub fn cancel(&mut self, task: &mut Task) -> Result<(), ReconcileError> {
        let SessionMode::Edit { snapshot, .. } = std::mem::take(&mut self.mode) else {
            return Err(ReconcileError::NotEditing);
        };
        task.order = snapshot;
        Ok(())
    }

    /// Leaves Post-Save Diff (or Edit, discarding the working copy) for View.
    pub fn close(&mut self) {
        self.mode = SessionMode::View;
    }

    /// Builds the tooltip for the current mode; `None` hides it.
    #[must_use]
    pub fn render(&self, task: &Task) -> Option<OrderView> {
        match &self.mode {
            SessionMode::View => view::render_view(task),
            SessionMode::Edit { snapshot, working } => Some(view::render_edit(task, snapshot, working)),
            SessionMode::PostSaveDiff { baseline } => view::render_diff(task, baseline),
        }
    }
}

fn item_union<'a>(a: &'a OrderMap, b: &'a OrderMap) -> BTreeSet<&'a str> {
    a.keys().chain(b.keys()).map(String::as_str).collect()
}

fn format_order(order: &OrderMap) -> String {
    order
        .iter()
        .map(|(item, qty)| format!("{item}: {qty}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The save algorithm: baseline, previous order, change trail, colors,
/// then the order itself.
fn apply_save(task: &mut Task, snapshot: &OrderMap, working: OrderMap, timestamp: u64) -> SaveOutcome {
    let established_baseline = task.initial_order.is_empty();
    if established_baseline {
        task.initial_order = working.clone();
    }

    task.previous_order = snapshot.clone();

    let mut changed_items = Vec::new();
    let mut events = Vec::new();
    let created = snapshot.is_empty() && !working.is_empty();
    if created {
        events.push(
            ChangeEvent::new(EventKind::Create, task.id.clone(), timestamp)
                .with_values("—", format_order(&working))
                .with_comment("order created"),
        );
    }
    for item in item_union(&working, snapshot) {
        let old_qty = snapshot.get(item).copied().unwrap_or(0);
        let new_qty = working.get(item).copied().unwrap_or(0);
        if old_qty == new_qty {
            continue;
        }
        changed_items.push(item.to_string());

        // The trail starts at the first saved quantity.
        if !created {
            task.order_changes
                .entry(item.to_string())
                .or_default()
                .push(OrderChange {
                    old_qty,
                    new_qty,
                    timestamp,
                });
        }

        let (kind, comment) = if new_qty > old_qty {
            (EventKind::Edit, "quantity increased")
        } else if new_qty == 0 {
            (EventKind::Delete, "item removed from order")
        } else {
            (EventKind::Edit, "quantity decreased")
        };
        events.push(
            ChangeEvent::new(kind, task.id.clone(), timestamp)
                .with_item(item)
                .with_values(old_qty.to_string(), new_qty.to_string())
                .with_comment(comment),
        );
    }

    let colored: Vec<String> = item_union(&working, &task.initial_order)
        .into_iter()
        .map(str::to_string)
        .collect();
    for item in colored {
        let baseline = task.initial_order.get(&item).copied().unwrap_or(0);
        let current = working.get(&item).copied().unwrap_or(0);
        match QuantityTrend::between(baseline, current) {
            Some(trend) => {
                task.order_colors.insert(item, trend);
            }
            None => {
                task.order_colors.remove(&item);
            }
        }
    }

    task.order = working;

    SaveOutcome {
        events,
        changed_items,
        established_baseline,
    }
}
