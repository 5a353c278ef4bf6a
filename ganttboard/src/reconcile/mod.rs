//! Order reconciliation.
//!
//! An [`OrderSession`] drives a task's order through View, Edit and
//! Post-Save Diff. Saving folds the working copy back into the task:
//! baseline, previous order, the per-item change trail and the
//! increase/decrease colors are all derived here. [`view`] turns the
//! result into display lines.

pub mod catalog;
pub mod session;
pub mod view;

pub use catalog::apply_catalog_selection;
pub use session::{DisplayMode, OrderSession, SaveOutcome};
pub use view::{LineMark, OrderLine, OrderView, QuantityStep};

use ganttboard_proto::palette::{StatusColor, cycle_color};
use ganttboard_proto::task::Task;
use thiserror::Error;

/// Errors from order session transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// The operation needs an open edit session.
    #[error("order is not being edited")]
    NotEditing,
}

/// Advances the status color of `item` and returns `(old, new)`.
///
/// Items without a stored color count as neutral.
pub fn cycle_item_status(task: &mut Task, item: &str) -> (StatusColor, StatusColor) {
    let old = task
        .order_status_colors
        .get(item)
        .copied()
        .unwrap_or_default();
    let new = cycle_color(old);
    task.order_status_colors.insert(item.to_string(), new);
    (old, new)
}
