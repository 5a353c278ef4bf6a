//! Pointer gestures on task bars.
//!
//! A [`GestureTracker`] follows one bar through `Idle → Dragging →
//! Committing → Idle` (or the same path through `Resizing`). It only
//! touches geometry; persisting the result is the caller's job, reported
//! back through [`GestureTracker::finish`].

pub mod commit;
pub mod gesture;

pub use commit::{is_noop, placement_events};
pub use gesture::{CommitKind, GestureState, GestureTracker, ResizeIndicator, ResizePreview};

use thiserror::Error;

/// Rows sharing one stacking band.
pub const ROWS_PER_BAND: u32 = 25;

/// Stacking value of a bar while it is being dragged.
pub const ELEVATED_STACKING: i32 = 1000;

/// Resting stacking value of a bar in `row`; lower rows paint on top.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn row_stacking(row: u32) -> i32 {
    100 - (row % ROWS_PER_BAND) as i32
}

/// Errors from gesture transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InteractionError {
    /// A drag or resize is already running on this bar.
    #[error("a gesture is already in progress")]
    GestureInProgress,
    /// Movement or release arrived without a matching start.
    #[error("no gesture in progress")]
    NoGesture,
}
