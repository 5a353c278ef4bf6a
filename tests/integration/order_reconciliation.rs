//! Order reconciliation scenarios: baseline capture, change trails,
//! quantity colors and the three tooltip modes.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::NaiveDate;
use ganttboard::backend::InMemoryBackend;
use ganttboard::board::{Board, BoardError, BoardSettings};
use ganttboard::reconcile::{DisplayMode, LineMark, ReconcileError};
use ganttboard_proto::catalog::GoodsItem;
use ganttboard_proto::event::EventKind;
use ganttboard_proto::task::{OrderChange, OrderMap, QuantityTrend, TaskId};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type MemoryBoard = Board<InMemoryBackend, InMemoryBackend>;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

async fn board_with_task() -> (MemoryBoard, InMemoryBackend, TaskId) {
    let backend = InMemoryBackend::new();
    let (mut board, _rx) = Board::new(
        BoardSettings::default(),
        today(),
        backend.clone(),
        backend.clone(),
    );
    let id = board.create_task(0, today()).await.unwrap();
    (board, backend, id)
}

async fn save_quantity(board: &mut MemoryBoard, id: &TaskId, item: &str, qty: i64) {
    board.begin_order_edit(id).unwrap();
    board.set_item_quantity(id, item, qty).unwrap();
    board.save_order(id).await.unwrap();
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn apple_order_lifecycle() {
    let (mut board, backend, id) = board_with_task().await;

    // Fresh order establishes the baseline.
    save_quantity(&mut board, &id, "Apple", 5).await;
    let task = board.task(&id).unwrap();
    assert_eq!(task.initial_order.get("Apple"), Some(&5));
    assert!(task.order_changes.is_empty());

    // Raising the quantity records a trail entry and an increase color.
    save_quantity(&mut board, &id, "Apple", 8).await;
    let task = board.task(&id).unwrap();
    let trail: Vec<(u32, u32)> = task.order_changes["Apple"]
        .iter()
        .map(|c: &OrderChange| (c.old_qty, c.new_qty))
        .collect();
    assert_eq!(trail, vec![(5, 8)]);
    assert_eq!(task.order_colors.get("Apple"), Some(&QuantityTrend::Increase));
    assert_eq!(task.initial_order.get("Apple"), Some(&5));

    // Dropping to zero hides the item in View but keeps it in the diff.
    save_quantity(&mut board, &id, "Apple", 0).await;
    let diff = board.order_view(&id).unwrap().unwrap();
    assert_eq!(diff.mode, DisplayMode::PostSaveDiff);
    let line = diff.line("Apple").unwrap();
    assert_eq!(line.mark, LineMark::Removed { was: 8 });
    assert_eq!(line.to_string(), "Apple: 8 → removed");

    board.close_order_view(&id).unwrap();
    assert!(board.order_view(&id).unwrap().is_none());

    // The stored copy matches the board.
    let stored = backend.stored(&id).unwrap();
    assert!(!stored.order.contains_key("Apple"));
    assert_eq!(stored.initial_order.get("Apple"), Some(&5));
    assert_eq!(stored.order_changes["Apple"].len(), 2);
}

#[tokio::test]
async fn diff_against_explicit_baseline_shows_original_quantity() {
    let (mut board, _backend, id) = board_with_task().await;
    save_quantity(&mut board, &id, "Apple", 5).await;
    save_quantity(&mut board, &id, "Apple", 8).await;

    let baseline: OrderMap = [("Apple".to_string(), 5)].into_iter().collect();
    board.enter_order_edit(&id, Some(baseline)).unwrap();
    board.set_item_quantity(&id, "Apple", 0).unwrap();
    board.save_order(&id).await.unwrap();

    let diff = board.order_view(&id).unwrap().unwrap();
    assert_eq!(diff.line("Apple").unwrap().to_string(), "Apple: 5 → removed");
}

#[tokio::test]
async fn order_events_describe_each_save() {
    let (mut board, backend, id) = board_with_task().await;
    save_quantity(&mut board, &id, "Apple", 5).await;
    save_quantity(&mut board, &id, "Apple", 3).await;
    save_quantity(&mut board, &id, "Apple", 0).await;

    // Newest first: removal, decrease, first quantity, order creation,
    // task creation.
    let events = backend.events();
    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::Delete,
            EventKind::Edit,
            EventKind::Edit,
            EventKind::Create,
            EventKind::Create
        ]
    );
    let decrease = &events[1];
    assert_eq!(decrease.item_name.as_deref(), Some("Apple"));
    assert_eq!(decrease.old_value.as_deref(), Some("5"));
    assert_eq!(decrease.new_value.as_deref(), Some("3"));
    let added = &events[2];
    assert_eq!(added.item_name.as_deref(), Some("Apple"));
    assert_eq!(added.old_value.as_deref(), Some("0"));
    assert_eq!(added.new_value.as_deref(), Some("5"));
    assert_eq!(events[3].comment.as_deref(), Some("order created"));
}

#[tokio::test]
async fn view_mode_shows_revisions_against_baseline() {
    let (mut board, _backend, id) = board_with_task().await;
    save_quantity(&mut board, &id, "Apple", 5).await;
    save_quantity(&mut board, &id, "Box", 2).await;
    save_quantity(&mut board, &id, "Apple", 7).await;
    board.close_order_view(&id).unwrap();

    let view = board.order_view(&id).unwrap().unwrap();
    assert_eq!(view.mode, DisplayMode::View);
    assert_eq!(
        view.line("Apple").unwrap().mark,
        LineMark::Revised { baseline: 5 }
    );
    // Box joined after the baseline was captured.
    assert_eq!(view.line("Box").unwrap().mark, LineMark::Plain);
    assert!(view.can_edit);
}

#[tokio::test]
async fn cancel_restores_the_snapshot() {
    let (mut board, backend, id) = board_with_task().await;
    save_quantity(&mut board, &id, "Apple", 5).await;
    let saved_events = backend.events().len();

    board.begin_order_edit(&id).unwrap();
    board.adjust_item_quantity(&id, "Apple", 4).unwrap();
    board.set_item_quantity(&id, "Pear", 2).unwrap();
    let editing = board.order_view(&id).unwrap().unwrap();
    assert_eq!(editing.mode, DisplayMode::Edit);
    assert_eq!(editing.line("Apple").unwrap().quantity, 9);

    board.cancel_order_edit(&id).unwrap();
    assert_eq!(board.task(&id).unwrap().order.get("Apple"), Some(&5));
    assert!(!board.task(&id).unwrap().order.contains_key("Pear"));
    assert_eq!(backend.events().len(), saved_events);
}

#[tokio::test]
async fn edits_outside_edit_mode_are_rejected() {
    let (mut board, _backend, id) = board_with_task().await;
    assert!(matches!(
        board.set_item_quantity(&id, "Apple", 1),
        Err(BoardError::Reconcile(ReconcileError::NotEditing))
    ));
    assert!(matches!(
        board.save_order(&id).await,
        Err(BoardError::Reconcile(ReconcileError::NotEditing))
    ));
}

#[tokio::test]
async fn edit_without_snapshot_stays_in_view() {
    let (mut board, _backend, id) = board_with_task().await;
    save_quantity(&mut board, &id, "Apple", 5).await;
    board.close_order_view(&id).unwrap();
    assert_eq!(board.enter_order_edit(&id, None).unwrap(), DisplayMode::View);
}

#[tokio::test]
async fn catalog_selection_replaces_order_and_weights() {
    let (mut board, backend, id) = board_with_task().await;
    let selection = vec![
        (GoodsItem::new("Apple", 0.2, 0.5), 10),
        (GoodsItem::new("Box", 1.5, 2.0), 4),
        (GoodsItem::new("Pear", 0.3, 0.5), 0),
    ];
    let outcome = board.apply_catalog_order(&id, &selection).await.unwrap();
    assert!(outcome.established_baseline);

    let task = backend.stored(&id).unwrap();
    assert_eq!(task.order.get("Apple"), Some(&10));
    assert_eq!(task.order.get("Box"), Some(&4));
    assert!(!task.order.contains_key("Pear"));
    assert!((task.total_weight - 8.0).abs() < 1e-9);
    assert_eq!(task.item_pallet_coefs.get("Box"), Some(&2.0));
}
