//! The board facade.
//!
//! [`Board`] owns the [`TaskStore`] and wires gestures, order sessions and
//! allocation tables to the collaborators. Every operation that changes a
//! task persists it before returning; a failed save is logged and reported
//! once on the warning channel but never surfaces as an `Err`.

pub mod engine;
pub mod store;

pub use engine::{Board, CommitOutcome};
pub use store::{TaskRecord, TaskStore};

use ganttboard_proto::task::{DEFAULT_TASK_DAYS, TaskId};

use crate::backend::BackendError;
use crate::geometry::{DEFAULT_COLUMN_WIDTH, DEFAULT_FORWARD_DAYS, DEFAULT_HISTORY_DAYS};
use crate::interaction::InteractionError;
use crate::reconcile::ReconcileError;

/// Rows on a default board.
pub const DEFAULT_ROWS: u32 = 25;

/// Errors returned by board operations. None of them change state.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// No task with this id is on the board.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// A task with this id is already on the board.
    #[error("task already exists: {0}")]
    DuplicateTask(TaskId),

    /// The requested row is outside the board.
    #[error("row {row} is outside the board ({rows} rows)")]
    RowOutOfRange {
        /// Requested row.
        row: u32,
        /// Rows on the board.
        rows: u32,
    },

    /// Order session misuse.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// Gesture misuse.
    #[error(transparent)]
    Interaction(#[from] InteractionError),

    /// Allocation input arrived without an open table.
    #[error("no warehouse allocation is open for task {0}")]
    NoAllocationOpen(TaskId),

    /// A collaborator call whose result the operation depends on failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Non-fatal failure reported on the board's warning channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardWarning {
    /// A task could not be saved; the board keeps its local state.
    SaveFailed {
        /// Task that was not saved.
        task_id: TaskId,
        /// Description of the error.
        reason: String,
    },
    /// A deleted task could not be removed from the backend.
    DeleteFailed {
        /// Task that was removed locally.
        task_id: TaskId,
        /// Description of the error.
        reason: String,
    },
    /// A change-log event was lost.
    LogFailed {
        /// Task the event belonged to.
        task_id: TaskId,
        /// Description of the error.
        reason: String,
    },
}

impl BoardWarning {
    /// Task the warning is about.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        match self {
            Self::SaveFailed { task_id, .. }
            | Self::DeleteFailed { task_id, .. }
            | Self::LogFailed { task_id, .. } => task_id,
        }
    }
}

/// Construction parameters of a [`Board`].
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSettings {
    /// Name stamped on change-log events.
    pub user: Option<String>,
    /// Width of one day column in pixels.
    pub column_width: f64,
    /// Days shown before today.
    pub history_days: u32,
    /// Days shown after today.
    pub forward_days: u32,
    /// Number of board rows.
    pub rows: u32,
    /// Duration of a new task in days.
    pub default_task_days: f64,
    /// Capacity of the warning channel.
    pub warning_buffer: usize,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            user: None,
            column_width: DEFAULT_COLUMN_WIDTH,
            history_days: DEFAULT_HISTORY_DAYS,
            forward_days: DEFAULT_FORWARD_DAYS,
            rows: DEFAULT_ROWS,
            default_task_days: DEFAULT_TASK_DAYS,
            warning_buffer: 64,
        }
    }
}
