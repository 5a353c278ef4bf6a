//! Drag and resize commits: snapping, change events, no-op detection and
//! behaviour when the repository rejects the save.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use ganttboard::backend::{BackendError, InMemoryBackend, TaskRepository};
use ganttboard::board::{Board, BoardError, BoardSettings, BoardWarning, CommitOutcome};
use ganttboard::geometry::add_days;
use ganttboard::interaction::{GestureState, InteractionError, ResizeIndicator, row_stacking};
use ganttboard_proto::task::{Task, TaskId};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Repository that accepts or rejects every call depending on a shared switch.
#[derive(Clone)]
struct SwitchableRepository {
    inner: InMemoryBackend,
    failing: Arc<AtomicBool>,
}

impl SwitchableRepository {
    fn check(&self) -> Result<(), BackendError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(BackendError::Unavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

impl TaskRepository for SwitchableRepository {
    async fn create(&self, task: &Task) -> Result<(), BackendError> {
        self.check()?;
        self.inner.create(task).await
    }

    async fn update(&self, task: &Task) -> Result<(), BackendError> {
        self.check()?;
        self.inner.update(task).await
    }

    async fn delete(&self, id: &TaskId) -> Result<(), BackendError> {
        self.check()?;
        self.inner.delete(id).await
    }

    async fn list_all(&self) -> Result<Vec<Task>, BackendError> {
        self.check()?;
        self.inner.list_all().await
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn memory_board() -> (Board<InMemoryBackend, InMemoryBackend>, InMemoryBackend) {
    let backend = InMemoryBackend::new();
    let (board, _rx) = Board::new(
        BoardSettings::default(),
        today(),
        backend.clone(),
        backend.clone(),
    );
    (board, backend)
}

// ---------------------------------------------------------------------------
// Drag
// ---------------------------------------------------------------------------

#[tokio::test]
async fn drag_three_columns_moves_start_three_days() {
    let (mut board, backend) = memory_board();
    let epoch = board.timeline().epoch();
    let id = board.create_task(4, add_days(epoch, 10)).await.unwrap();
    let width = board.timeline().column_width();

    board.begin_drag(&id).unwrap();
    let left = board.drag_by(&id, 3.0 * width).unwrap();
    assert_eq!(board.timeline().offset_to_date(left), add_days(epoch, 13));
    assert_eq!(board.end_gesture(&id).await.unwrap(), CommitOutcome::Persisted);

    assert_eq!(board.task(&id).unwrap().start, add_days(epoch, 13));
    assert_eq!(backend.stored(&id).unwrap().start, add_days(epoch, 13));
    let event = &backend.events()[0];
    assert_eq!(event.comment.as_deref(), Some("start date changed (drag)"));
    assert_eq!(
        event.new_value,
        Some(add_days(epoch, 13).format("%d.%m.%Y").to_string())
    );
}

#[tokio::test]
async fn partial_columns_snap_to_nearest_day() {
    let (mut board, _backend) = memory_board();
    let id = board.create_task(0, today()).await.unwrap();
    let width = board.timeline().column_width();

    board.begin_drag(&id).unwrap();
    board.drag_by(&id, 0.8 * width).unwrap();
    board.drag_by(&id, 0.6 * width).unwrap();
    board.end_gesture(&id).await.unwrap();
    assert_eq!(board.task(&id).unwrap().start, add_days(today(), 1));

    board.begin_drag(&id).unwrap();
    board.drag_by(&id, -1.6 * width).unwrap();
    board.end_gesture(&id).await.unwrap();
    assert_eq!(board.task(&id).unwrap().start, add_days(today(), -1));
}

#[tokio::test]
async fn drag_returning_to_same_column_commits_nothing() {
    let (mut board, backend) = memory_board();
    let id = board.create_task(0, today()).await.unwrap();
    let observed = backend.observed_events();

    board.begin_drag(&id).unwrap();
    board.drag_by(&id, 200.0).unwrap();
    board.drag_by(&id, -180.0).unwrap();
    assert_eq!(board.end_gesture(&id).await.unwrap(), CommitOutcome::Unchanged);
    assert_eq!(backend.observed_events(), observed);
    assert_eq!(board.record(&id).unwrap().gesture.drag_offset(), 0.0);
}

#[tokio::test]
async fn gesture_misuse_is_rejected() {
    let (mut board, _backend) = memory_board();
    let id = board.create_task(0, today()).await.unwrap();

    assert!(matches!(
        board.drag_by(&id, 10.0),
        Err(BoardError::Interaction(InteractionError::NoGesture))
    ));
    board.begin_drag(&id).unwrap();
    assert!(matches!(
        board.begin_resize(&id),
        Err(BoardError::Interaction(InteractionError::GestureInProgress))
    ));
    assert!(matches!(
        board.end_gesture(&TaskId::new()).await,
        Err(BoardError::TaskNotFound(_))
    ));
}

// ---------------------------------------------------------------------------
// Resize
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resize_extends_end_date_and_logs_it() {
    let (mut board, backend) = memory_board();
    let id = board.create_task(0, today()).await.unwrap();
    let width = board.timeline().days_to_width(16.5);

    board.begin_resize(&id).unwrap();
    let preview = board.resize_to(&id, width).unwrap();
    assert!((preview.pending_delta - 2.5).abs() < 1e-9);
    assert!((preview.visible_days - 16.5).abs() < 1e-9);
    assert!(matches!(preview.indicator, Some(ResizeIndicator::Extend { .. })));
    assert_eq!(board.end_gesture(&id).await.unwrap(), CommitOutcome::Persisted);

    let stored = backend.stored(&id).unwrap();
    assert!((stored.pending_delta - 2.5).abs() < 1e-9);
    assert!((stored.committed_days - 14.0).abs() < f64::EPSILON);
    let event = &backend.events()[0];
    assert_eq!(event.comment.as_deref(), Some("end date changed (resize)"));
    assert_eq!(
        event.old_value,
        Some(add_days(today(), 14).format("%d.%m.%Y").to_string())
    );
    assert_eq!(
        event.new_value,
        Some(add_days(today(), 16).format("%d.%m.%Y").to_string())
    );
}

#[tokio::test]
async fn resize_never_shrinks_below_a_quarter_day() {
    let (mut board, _backend) = memory_board();
    let id = board.create_task(0, today()).await.unwrap();

    board.begin_resize(&id).unwrap();
    let preview = board.resize_to(&id, 5.0).unwrap();
    assert!((preview.visible_days - 0.25).abs() < 1e-9);
    assert!(matches!(preview.indicator, Some(ResizeIndicator::Shrink { .. })));
    board.end_gesture(&id).await.unwrap();
    assert!((board.task(&id).unwrap().visible_days() - 0.25).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// Failed saves
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rejected_drag_keeps_dropped_position_until_retry() {
    let failing = Arc::new(AtomicBool::new(false));
    let store = InMemoryBackend::new();
    let repo = SwitchableRepository {
        inner: store.clone(),
        failing: Arc::clone(&failing),
    };
    let (mut board, mut warnings) =
        Board::new(BoardSettings::default(), today(), repo, InMemoryBackend::new());
    let id = board.create_task(2, today()).await.unwrap();
    let width = board.timeline().column_width();

    failing.store(true, Ordering::SeqCst);
    board.begin_drag(&id).unwrap();
    board.drag_by(&id, 2.0 * width).unwrap();
    assert_eq!(board.end_gesture(&id).await.unwrap(), CommitOutcome::Failed);

    let record = board.record(&id).unwrap();
    assert_eq!(record.task.start, add_days(today(), 2));
    assert_eq!(record.last_good.start, today());
    assert_eq!(record.gesture.state(), GestureState::Idle);
    assert_eq!(record.gesture.stacking(), row_stacking(2));
    assert!((record.gesture.drag_offset() - 2.0 * width).abs() < f64::EPSILON);
    assert_eq!(store.stored(&id).unwrap().start, today());
    match warnings.try_recv().unwrap() {
        BoardWarning::SaveFailed { task_id, reason } => {
            assert_eq!(task_id, id);
            assert!(reason.contains("connection refused"));
        }
        other => panic!("unexpected warning {other:?}"),
    }

    // The next release re-commits the position the bar was dropped at.
    failing.store(false, Ordering::SeqCst);
    board.begin_drag(&id).unwrap();
    assert_eq!(board.end_gesture(&id).await.unwrap(), CommitOutcome::Persisted);
    assert_eq!(store.stored(&id).unwrap().start, add_days(today(), 2));
    assert_eq!(board.record(&id).unwrap().gesture.drag_offset(), 0.0);
}

#[tokio::test]
async fn task_created_while_offline_is_stored_by_next_commit() {
    let failing = Arc::new(AtomicBool::new(true));
    let store = InMemoryBackend::new();
    let repo = SwitchableRepository {
        inner: store.clone(),
        failing: Arc::clone(&failing),
    };
    let (mut board, _warnings) =
        Board::new(BoardSettings::default(), today(), repo, InMemoryBackend::new());
    let id = board.create_task(0, today()).await.unwrap();
    assert!(store.stored(&id).is_none());
    assert!(!board.record(&id).unwrap().stored);

    failing.store(false, Ordering::SeqCst);
    board.edit_comment(&id, "back online").await.unwrap();
    assert_eq!(store.stored(&id).unwrap().comment, "back online");
    assert!(board.record(&id).unwrap().stored);
}
