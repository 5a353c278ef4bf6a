//! Property-based tests for the board's arithmetic invariants.
//!
//! Uses proptest to verify:
//! 1. No sequence of allocation saves puts more of an item into
//!    warehouses than the order holds.
//! 2. Entered allocations are clamped to `0..=available`.
//! 3. A dropped bar snaps to the nearest whole column.
//! 4. Resized bars never fall below a quarter day and keep two decimals.
//! 5. Saving an order records exactly the items whose quantity changed.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::NaiveDate;
use ganttboard::geometry::{DEFAULT_COLUMN_WIDTH, MIN_VISIBLE_DAYS, Timeline, add_days};
use ganttboard::reconcile::OrderSession;
use ganttboard::warehouse::{
    AllocationDraft, allocated_elsewhere, available_for, save_allocation,
};
use ganttboard_proto::task::{OrderMap, Task};
use proptest::prelude::*;

const ITEMS: [&str; 3] = ["Apple", "Box", "Pear"];
const WAREHOUSES: [&str; 3] = ["North", "South", "Depot"];

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 7, 21).unwrap()
}

fn timeline() -> Timeline {
    Timeline::new(epoch(), DEFAULT_COLUMN_WIDTH, 181)
}

fn arb_order() -> impl Strategy<Value = OrderMap> {
    prop::collection::btree_map(
        prop::sample::select(ITEMS.to_vec()).prop_map(String::from),
        1u32..60,
        0..=ITEMS.len(),
    )
}

/// `(warehouse, item, requested)` allocation attempts.
fn arb_allocations() -> impl Strategy<Value = Vec<(&'static str, &'static str, i64)>> {
    prop::collection::vec(
        (
            prop::sample::select(WAREHOUSES.to_vec()),
            prop::sample::select(ITEMS.to_vec()),
            -10i64..100,
        ),
        0..30,
    )
}

fn task_with_order(order: OrderMap) -> Task {
    let mut task = Task::new(0, epoch(), 14.0);
    task.order = order;
    task
}

fn allocated_total(task: &Task, item: &str) -> u32 {
    task.warehouse_distribution
        .values()
        .filter_map(|items| items.get(item))
        .sum()
}

proptest! {
    #[test]
    fn allocations_never_exceed_the_order(
        order in arb_order(),
        attempts in arb_allocations(),
    ) {
        let mut task = task_with_order(order);
        for (warehouse, item, requested) in attempts {
            let mut draft = AllocationDraft::open(&task, warehouse);
            draft.assign(&task, item, requested);
            save_allocation(&mut task, draft);

            for item in ITEMS {
                prop_assert!(allocated_total(&task, item) <= task.ordered(item));
            }
            for items in task.warehouse_distribution.values() {
                prop_assert!(!items.is_empty());
                prop_assert!(items.values().all(|&qty| qty > 0));
            }
        }
    }

    #[test]
    fn assignment_is_clamped_to_availability(
        order in arb_order(),
        held_elsewhere in 0u32..60,
        requested in -50i64..200,
    ) {
        let mut task = task_with_order(order);
        let mut other = AllocationDraft::open(&task, "South");
        other.assign(&task, "Apple", i64::from(held_elsewhere));
        save_allocation(&mut task, other);

        let available = available_for(&task, "Apple", "North");
        prop_assert_eq!(
            available,
            task.ordered("Apple").saturating_sub(allocated_elsewhere(&task, "Apple", "North"))
        );
        let mut draft = AllocationDraft::open(&task, "North");
        let stored = draft.assign(&task, "Apple", requested);
        let expected = u32::try_from(requested.max(0)).unwrap().min(available);
        prop_assert_eq!(stored, expected);
        prop_assert_eq!(draft.assigned("Apple"), expected);
    }

    #[test]
    fn dropped_bar_snaps_to_nearest_column(
        day in 0i64..180,
        columns in -20i64..20,
        jitter in -59.0f64..59.0,
    ) {
        let tl = timeline();
        let start = add_days(epoch(), day);
        #[allow(clippy::cast_precision_loss)]
        let dx = columns as f64 * tl.column_width() + jitter;
        let dropped = tl.offset_to_date(tl.date_to_offset(start) + dx);
        prop_assert_eq!(dropped, add_days(start, columns));
    }

    #[test]
    fn resized_duration_stays_above_minimum(
        width in -500.0f64..5000.0,
        committed in 1u32..60,
    ) {
        let tl = timeline();
        let days = tl.width_to_days(width);
        prop_assert!(days >= MIN_VISIBLE_DAYS);
        prop_assert!(((days * 100.0).round() - days * 100.0).abs() < 1e-6);

        let delta = tl.resize_delta(width, f64::from(committed));
        prop_assert!((f64::from(committed) + delta - days).abs() < 1e-6);
    }

    #[test]
    fn saving_records_only_changed_items(
        before in arb_order(),
        after in arb_order(),
    ) {
        let mut task = task_with_order(before.clone());
        let mut session = OrderSession::new();
        session.begin_edit(&task);
        session.replace_working(after.clone()).unwrap();
        let outcome = session.save(&mut task, 1).unwrap();

        prop_assert_eq!(&task.order, &after);
        prop_assert_eq!(&task.previous_order, &before);
        for item in ITEMS {
            let old = before.get(item).copied().unwrap_or(0);
            let new = after.get(item).copied().unwrap_or(0);
            prop_assert_eq!(outcome.changed_items.iter().any(|i| i == item), old != new);
            if !before.is_empty() && old != new {
                let last = task.order_changes[item].last().unwrap();
                prop_assert_eq!((last.old_qty, last.new_qty), (old, new));
            }
        }
    }
}
