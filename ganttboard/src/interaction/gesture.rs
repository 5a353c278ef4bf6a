//! Drag and resize state machine for a single bar.

use ganttboard_proto::task::Task;

use super::{ELEVATED_STACKING, InteractionError, row_stacking};
use crate::geometry::Timeline;

/// What a pending commit was triggered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    /// End of a horizontal drag.
    Drag,
    /// End of a trailing-edge resize.
    Resize,
    /// A comment edit.
    Comment,
}

/// Where a bar is in its gesture lifecycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    /// No gesture and no commit in flight.
    Idle,
    /// The bar follows the pointer horizontally.
    Dragging,
    /// The trailing edge follows the pointer; `width` is the last edge position.
    Resizing {
        /// Bar width in pixels at the last movement.
        width: f64,
    },
    /// Waiting for the persistence acknowledgment.
    Committing(CommitKind),
}

/// Overlay shown while resizing, in pixels relative to the bar's left edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeIndicator {
    /// The bar grew: committed boundary → new edge.
    Extend {
        /// Committed boundary.
        from: f64,
        /// New trailing edge.
        to: f64,
    },
    /// The bar shrank: new edge → committed boundary.
    Shrink {
        /// New trailing edge.
        from: f64,
        /// Committed boundary.
        to: f64,
    },
}

/// Result of one resize movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizePreview {
    /// New pending delta written to the task.
    pub pending_delta: f64,
    /// Duration the bar is now drawn with.
    pub visible_days: f64,
    /// Extend/shrink overlay, absent when the edge sits on the committed boundary.
    pub indicator: Option<ResizeIndicator>,
}

/// Tracks the on-screen position and gesture state of one bar.
///
/// The bar is drawn at `left + offset`: `left` is the column position of
/// the last acknowledged start date, `offset` the unsnapped drag distance
/// accumulated since. A failed commit keeps both, so the bar stays where
/// the user dropped it.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureTracker {
    state: GestureState,
    left: f64,
    offset: f64,
    stacking: i32,
}

impl GestureTracker {
    /// Creates an idle tracker for `task` at its current start date.
    #[must_use]
    pub fn new(task: &Task, timeline: &Timeline) -> Self {
        Self {
            state: GestureState::Idle,
            left: timeline.date_to_offset(task.start),
            offset: 0.0,
            stacking: row_stacking(task.row),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> GestureState {
        self.state
    }

    /// Current stacking value.
    #[must_use]
    pub const fn stacking(&self) -> i32 {
        self.stacking
    }

    /// Unsnapped drag distance not yet absorbed by an acknowledged commit.
    #[must_use]
    pub const fn drag_offset(&self) -> f64 {
        self.offset
    }

    /// Pixel position the bar is drawn at.
    #[must_use]
    pub fn visual_left(&self) -> f64 {
        self.left + self.offset
    }

    fn ensure_free(&self) -> Result<(), InteractionError> {
        match self.state {
            GestureState::Dragging | GestureState::Resizing { .. } => {
                Err(InteractionError::GestureInProgress)
            }
            GestureState::Idle | GestureState::Committing(_) => Ok(()),
        }
    }

    /// Starts a drag and lifts the bar above its neighbours.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::GestureInProgress`] if another gesture
    /// is running.
    pub fn begin_drag(&mut self) -> Result<(), InteractionError> {
        self.ensure_free()?;
        self.state = GestureState::Dragging;
        self.stacking = ELEVATED_STACKING;
        Ok(())
    }

    /// Moves the bar by `dx` pixels. No date is computed until release.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::NoGesture`] if no drag is running.
    pub fn drag_by(&mut self, dx: f64) -> Result<f64, InteractionError> {
        if self.state != GestureState::Dragging {
            return Err(InteractionError::NoGesture);
        }
        self.offset += dx;
        Ok(self.visual_left())
    }

    /// Starts a trailing-edge resize.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::GestureInProgress`] if another gesture
    /// is running.
    pub fn begin_resize(&mut self, task: &Task, timeline: &Timeline) -> Result<(), InteractionError> {
        self.ensure_free()?;
        self.state = GestureState::Resizing {
            width: timeline.days_to_width(task.visible_days()),
        };
        Ok(())
    }

    /// Moves the trailing edge so the bar is `width` pixels wide and
    /// rewrites the task's pending delta.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::NoGesture`] if no resize is running.
    pub fn resize_to(
        &mut self,
        task: &mut Task,
        timeline: &Timeline,
        width: f64,
    ) -> Result<ResizePreview, InteractionError> {
        let GestureState::Resizing { .. } = self.state else {
            return Err(InteractionError::NoGesture);
        };
        let committed = task.effective_days();
        task.pending_delta = timeline.resize_delta(width, committed);
        let visible_days = task.visible_days();
        self.state = GestureState::Resizing {
            width: timeline.days_to_width(visible_days),
        };

        let boundary = timeline.days_to_width(committed);
        let edge = timeline.days_to_width(visible_days);
        let indicator = if task.pending_delta > 0.0 {
            Some(ResizeIndicator::Extend {
                from: boundary,
                to: edge,
            })
        } else if task.pending_delta < 0.0 {
            Some(ResizeIndicator::Shrink {
                from: edge,
                to: boundary,
            })
        } else {
            None
        };

        Ok(ResizePreview {
            pending_delta: task.pending_delta,
            visible_days,
            indicator,
        })
    }

    /// Releases the pointer. A drag snaps the dropped position to the
    /// nearest column and writes the new start date into the task.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::NoGesture`] if no gesture is running.
    pub fn end(&mut self, task: &mut Task, timeline: &Timeline) -> Result<CommitKind, InteractionError> {
        let kind = match self.state {
            GestureState::Dragging => {
                task.start = timeline.offset_to_date(self.visual_left());
                CommitKind::Drag
            }
            GestureState::Resizing { .. } => CommitKind::Resize,
            GestureState::Idle | GestureState::Committing(_) => {
                return Err(InteractionError::NoGesture);
            }
        };
        self.state = GestureState::Committing(kind);
        Ok(kind)
    }

    /// Marks a non-gesture commit (comment edit) as in flight.
    pub const fn begin_commit(&mut self, kind: CommitKind) {
        self.state = GestureState::Committing(kind);
    }

    /// Applies the persistence outcome.
    ///
    /// Stacking always returns to the row value. On success the bar snaps
    /// to its start column; on failure it stays where it was dropped.
    pub fn finish(&mut self, task: &Task, timeline: &Timeline, succeeded: bool) {
        self.stacking = row_stacking(task.row);
        self.state = GestureState::Idle;
        if succeeded {
            self.left = timeline.date_to_offset(task.start);
            self.offset = 0.0;
        }
    }
}
