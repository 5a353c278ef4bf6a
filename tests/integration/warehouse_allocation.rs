//! Warehouse allocation scenarios: availability clamping, table saves,
//! the warehouse-count event and the compact summary.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::NaiveDate;
use ganttboard::backend::InMemoryBackend;
use ganttboard::board::{Board, BoardSettings};
use ganttboard_proto::catalog::GoodsItem;
use ganttboard_proto::palette::StatusColor;
use ganttboard_proto::task::TaskId;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type MemoryBoard = Board<InMemoryBackend, InMemoryBackend>;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

/// A board with one task ordering ten boxes of 1.5 kg, a quarter pallet each.
async fn board_with_boxes() -> (MemoryBoard, InMemoryBackend, TaskId) {
    let backend = InMemoryBackend::new();
    let (mut board, _rx) = Board::new(
        BoardSettings::default(),
        today(),
        backend.clone(),
        backend.clone(),
    );
    let id = board.create_task(0, today()).await.unwrap();
    board
        .apply_catalog_order(&id, &[(GoodsItem::new("Box", 1.5, 25.0), 10)])
        .await
        .unwrap();
    (board, backend, id)
}

async fn allocate(board: &mut MemoryBoard, id: &TaskId, warehouse: &str, qty: i64) -> u32 {
    board.open_allocation(id, warehouse).await.unwrap();
    let stored = board.allocate(id, "Box", qty).unwrap();
    board.save_allocation(id, false).await.unwrap();
    stored
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_warehouse_is_clamped_to_remaining_quantity() {
    let (mut board, backend, id) = board_with_boxes().await;

    assert_eq!(allocate(&mut board, &id, "A", 6).await, 6);
    assert_eq!(board.available_for(&id, "Box", "B").unwrap(), 4);
    assert_eq!(board.available_for(&id, "Box", "A").unwrap(), 10);
    assert_eq!(allocate(&mut board, &id, "B", 7).await, 4);

    let stored = backend.stored(&id).unwrap();
    assert_eq!(stored.warehouse_distribution["A"].get("Box"), Some(&6));
    assert_eq!(stored.warehouse_distribution["B"].get("Box"), Some(&4));
    assert_eq!(stored.warehouse_status_colors.get("B"), Some(&StatusColor::Neutral));
}

#[tokio::test]
async fn allocation_rows_show_live_availability() {
    let (mut board, _backend, id) = board_with_boxes().await;
    allocate(&mut board, &id, "A", 6).await;

    let rows = board.open_allocation(&id, "B").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].ordered, 10);
    assert_eq!(rows[0].elsewhere, 6);
    assert_eq!(rows[0].available, 4);
    assert_eq!(rows[0].assigned, 0);

    board.allocate(&id, "Box", -3).unwrap();
    assert_eq!(board.allocation_rows(&id).unwrap()[0].assigned, 0);
    board.close_allocation(&id).unwrap();
    assert!(board.allocation_rows(&id).is_err());
}

#[tokio::test]
async fn summary_reports_weight_and_pallets() {
    let (mut board, _backend, id) = board_with_boxes().await;
    allocate(&mut board, &id, "A", 6).await;
    allocate(&mut board, &id, "B", 4).await;

    let summary = board.warehouse_summary(&id).unwrap();
    let labels: Vec<(String, u32, String, String)> = summary
        .warehouses
        .iter()
        .map(|w| (w.name.clone(), w.quantity, w.weight_label(), w.pallets_label()))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("A".to_string(), 6, "9.00".to_string(), "1.5".to_string()),
            ("B".to_string(), 4, "6.00".to_string(), "1".to_string()),
        ]
    );
    assert!(summary.items.iter().all(|i| !i.over_allocated));
}

#[tokio::test]
async fn emptied_warehouse_leaves_the_distribution() {
    let (mut board, backend, id) = board_with_boxes().await;
    allocate(&mut board, &id, "A", 6).await;
    allocate(&mut board, &id, "B", 4).await;

    allocate(&mut board, &id, "A", 0).await;
    let task = board.task(&id).unwrap();
    assert!(!task.warehouse_distribution.contains_key("A"));

    let events = backend.events();
    assert_eq!(events[0].comment.as_deref(), Some("number of warehouses changed"));
    assert_eq!(events[0].old_value.as_deref(), Some("2"));
    assert_eq!(events[0].new_value.as_deref(), Some("1"));
    assert_eq!(events[1].warehouse_name.as_deref(), Some("A"));
    assert_eq!(events[1].new_value.as_deref(), Some("0"));
}

#[tokio::test]
async fn shrinking_the_order_flags_over_allocation() {
    let (mut board, _backend, id) = board_with_boxes().await;
    allocate(&mut board, &id, "A", 10).await;

    board.begin_order_edit(&id).unwrap();
    board.set_item_quantity(&id, "Box", 5).unwrap();
    board.save_order(&id).await.unwrap();

    let summary = board.warehouse_summary(&id).unwrap();
    let boxes = summary.items.iter().find(|i| i.item == "Box").unwrap();
    assert_eq!((boxes.ordered, boxes.allocated), (5, 10));
    assert!(boxes.over_allocated);
    assert_eq!(board.available_for(&id, "Box", "B").unwrap(), 0);
}

#[tokio::test]
async fn warehouse_status_cycles_and_persists() {
    let (mut board, backend, id) = board_with_boxes().await;
    allocate(&mut board, &id, "A", 3).await;

    assert_eq!(
        board.cycle_warehouse_status(&id, "A").await.unwrap(),
        StatusColor::Pink
    );
    assert_eq!(
        board.cycle_warehouse_status(&id, "A").await.unwrap(),
        StatusColor::Orange
    );
    assert_eq!(
        backend.stored(&id).unwrap().warehouse_status_colors.get("A"),
        Some(&StatusColor::Orange)
    );
    let summary = board.warehouse_summary(&id).unwrap();
    assert_eq!(summary.warehouses[0].status, StatusColor::Orange);
    assert_eq!(
        backend.events()[0].comment.as_deref(),
        Some("warehouse status changed")
    );
}
