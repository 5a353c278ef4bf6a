//! Property-based serialization tests for the shared data model.
//!
//! Uses proptest to verify:
//! 1. Any board snapshot survives encode → decode.
//! 2. Random bytes never cause a panic in `decode` (returns `Err` gracefully).
//! 3. Any task survives the JSON representation used by the HTTP API.
//! 4. The status cycle always returns to neutral within four steps.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ganttboard_proto::codec::{self, BoardSnapshot, CodecError, SNAPSHOT_VERSION};
use ganttboard_proto::palette::{PALETTE, StatusColor, cycle_color};
use ganttboard_proto::task::{OrderChange, OrderMap, QuantityTrend, Task, TaskId};
use proptest::prelude::*;
use uuid::Uuid;

// --- Strategies for model types ---

fn arb_task_id() -> impl Strategy<Value = TaskId> {
    any::<u128>().prop_map(|n| TaskId::from_uuid(Uuid::from_u128(n)))
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..3650).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Duration::days(offset)
    })
}

/// Multiples of a quarter day, exactly representable in JSON.
fn arb_quarters(range: std::ops::Range<i32>) -> impl Strategy<Value = f64> {
    range.prop_map(|q| f64::from(q) * 0.25)
}

fn arb_item() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Apple", "Box", "Crate", "Pallet wrap", "Яблуко"])
        .prop_map(String::from)
}

fn arb_order() -> impl Strategy<Value = OrderMap> {
    prop::collection::btree_map(arb_item(), 0u32..500, 0..5)
}

fn arb_status() -> impl Strategy<Value = StatusColor> {
    prop::sample::select(PALETTE.to_vec())
}

fn arb_trail() -> impl Strategy<Value = Vec<OrderChange>> {
    prop::collection::vec(
        (0u32..500, 0u32..500, any::<u64>()).prop_map(|(old_qty, new_qty, timestamp)| {
            OrderChange {
                old_qty,
                new_qty,
                timestamp,
            }
        }),
        0..4,
    )
}

fn arb_task() -> impl Strategy<Value = Task> {
    (
        (arb_task_id(), 0u32..25, arb_date(), 1u32..60, arb_quarters(-3..20)),
        "[^\x00]{0,64}",
        (arb_order(), arb_order(), arb_order()),
        prop::collection::btree_map(arb_item(), arb_trail(), 0..3),
        prop::collection::btree_map(arb_item(), arb_status(), 0..3),
        prop::collection::btree_map("[A-Z][a-z]{2,8}", arb_order(), 0..3),
        prop::collection::btree_map(arb_item(), arb_quarters(0..200), 0..3),
    )
        .prop_map(
            |((id, row, start, days, delta), comment, (order, initial, previous), trails, statuses, dist, weights)| {
                let mut task = Task::new(row, start, f64::from(days));
                task.id = id;
                task.pending_delta = delta;
                task.comment = comment;
                task.order_colors = order
                    .iter()
                    .filter_map(|(item, &qty)| {
                        QuantityTrend::between(initial.get(item).copied().unwrap_or(0), qty)
                            .map(|trend| (item.clone(), trend))
                    })
                    .collect::<BTreeMap<_, _>>();
                task.order = order;
                task.initial_order = initial;
                task.previous_order = previous;
                task.order_changes = trails;
                task.order_status_colors = statuses;
                task.warehouse_distribution = dist;
                task.item_weights = weights;
                task
            },
        )
}

proptest! {
    #[test]
    fn snapshot_round_trip(tasks in prop::collection::vec(arb_task(), 0..6), at in any::<u64>()) {
        let snapshot = BoardSnapshot::new(tasks, at);
        let bytes = codec::encode(&snapshot).unwrap();
        prop_assert_eq!(codec::decode(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn random_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        // Any outcome is fine as long as decoding returns.
        let _ = codec::decode(&bytes);
    }

    #[test]
    fn foreign_versions_are_rejected(version in any::<u16>().prop_filter("current", |v| *v != SNAPSHOT_VERSION)) {
        let mut snapshot = BoardSnapshot::new(Vec::new(), 0);
        snapshot.version = version;
        let bytes = codec::encode(&snapshot).unwrap();
        let rejected = matches!(
            codec::decode(&bytes),
            Err(CodecError::UnsupportedVersion { found }) if found == version
        );
        prop_assert!(rejected);
    }

    #[test]
    fn task_json_round_trip(task in arb_task()) {
        let json = serde_json::to_string(&task).unwrap();
        let back: Task = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, task);
    }

    #[test]
    fn status_cycle_returns_to_neutral(start in arb_status()) {
        let mut color = start;
        let mut steps = 0;
        loop {
            color = cycle_color(color);
            steps += 1;
            if color == StatusColor::Neutral {
                break;
            }
        }
        prop_assert!(steps <= 4);
        prop_assert_eq!(cycle_color(StatusColor::Unknown), StatusColor::Neutral);
    }
}
