//! Per-warehouse allocation tables and the conservation rule.

use std::collections::BTreeSet;

use ganttboard_proto::palette::{StatusColor, cycle_color};
use ganttboard_proto::task::{OrderMap, Task};

/// Units of `item` held by every warehouse other than `warehouse`.
#[must_use]
pub fn allocated_elsewhere(task: &Task, item: &str, warehouse: &str) -> u32 {
    task.warehouse_distribution
        .iter()
        .filter(|(name, _)| name.as_str() != warehouse)
        .filter_map(|(_, items)| items.get(item))
        .fold(0u32, |acc, &qty| acc.saturating_add(qty))
}

/// Largest quantity of `item` that `warehouse` may hold:
/// `max(order[item] - Σ other warehouses, 0)`.
#[must_use]
pub fn available_for(task: &Task, item: &str, warehouse: &str) -> u32 {
    task.ordered(item)
        .saturating_sub(allocated_elsewhere(task, item, warehouse))
}

/// Number of warehouses holding at least one unit of anything.
#[must_use]
pub fn warehouses_holding_items(task: &Task) -> usize {
    task.warehouse_distribution
        .values()
        .filter(|items| items.values().any(|&qty| qty > 0))
        .count()
}

/// Advances the status color of `warehouse` and returns `(old, new)`.
pub fn cycle_warehouse_status(task: &mut Task, warehouse: &str) -> (StatusColor, StatusColor) {
    let old = task
        .warehouse_status_colors
        .get(warehouse)
        .copied()
        .unwrap_or_default();
    let new = cycle_color(old);
    task.warehouse_status_colors
        .insert(warehouse.to_string(), new);
    (old, new)
}

/// One row of an open allocation table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationRow {
    /// Item name.
    pub item: String,
    /// Ordered quantity.
    pub ordered: u32,
    /// Held by other warehouses.
    pub elsewhere: u32,
    /// Upper bound for this warehouse.
    pub available: u32,
    /// Currently entered for this warehouse.
    pub assigned: u32,
}

/// The allocation table of one warehouse while it is being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationDraft {
    warehouse: String,
    quantities: OrderMap,
}

impl AllocationDraft {
    /// Opens `warehouse`'s table, prefilled with what it already holds.
    #[must_use]
    pub fn open(task: &Task, warehouse: &str) -> Self {
        Self {
            warehouse: warehouse.to_string(),
            quantities: task
                .warehouse_distribution
                .get(warehouse)
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Warehouse being edited.
    #[must_use]
    pub fn warehouse(&self) -> &str {
        &self.warehouse
    }

    /// Entered quantities.
    #[must_use]
    pub const fn quantities(&self) -> &OrderMap {
        &self.quantities
    }

    /// Entered quantity for `item`.
    #[must_use]
    pub fn assigned(&self, item: &str) -> u32 {
        self.quantities.get(item).copied().unwrap_or(0)
    }

    /// Enters `requested` units of `item`, silently clamped to
    /// `0..=available_for(item, warehouse)`. Returns the stored value.
    pub fn assign(&mut self, task: &Task, item: &str, requested: i64) -> u32 {
        let available = available_for(task, item, &self.warehouse);
        let requested = u32::try_from(requested.max(0)).unwrap_or(u32::MAX);
        let clamped = requested.min(available);
        self.quantities.insert(item.to_string(), clamped);
        clamped
    }

    /// Rows for every ordered item, with live availability.
    #[must_use]
    pub fn rows(&self, task: &Task) -> Vec<AllocationRow> {
        task.order
            .iter()
            .filter(|&(_, &ordered)| ordered > 0)
            .map(|(item, &ordered)| {
                let elsewhere = allocated_elsewhere(task, item, &self.warehouse);
                AllocationRow {
                    item: item.clone(),
                    ordered,
                    elsewhere,
                    available: ordered.saturating_sub(elsewhere),
                    assigned: self.assigned(item),
                }
            })
            .collect()
    }
}

/// What saving an allocation table changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationSaved {
    /// Warehouse that was saved.
    pub warehouse: String,
    /// `(item, old, new)` for every item whose stored quantity changed.
    pub changes: Vec<(String, u32, u32)>,
    /// Warehouses holding items before the save.
    pub holding_before: usize,
    /// Warehouses holding items after the save.
    pub holding_after: usize,
}

/// Replaces the draft warehouse's item map on `task` in one step.
///
/// Quantities are clamped against availability again, zero entries are
/// dropped and an emptied warehouse disappears from the distribution.
/// Every remaining warehouse gets a neutral status if it has none.
pub fn save_allocation(task: &mut Task, draft: AllocationDraft) -> AllocationSaved {
    let holding_before = warehouses_holding_items(task);
    let AllocationDraft {
        warehouse,
        quantities,
    } = draft;

    let replacement: OrderMap = quantities
        .into_iter()
        .map(|(item, qty)| {
            let bounded = qty.min(available_for(task, &item, &warehouse));
            (item, bounded)
        })
        .filter(|&(_, qty)| qty > 0)
        .collect();

    let previous = task
        .warehouse_distribution
        .remove(&warehouse)
        .unwrap_or_default();
    let changes: Vec<(String, u32, u32)> = previous
        .keys()
        .chain(replacement.keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter_map(|item| {
            let old = previous.get(item).copied().unwrap_or(0);
            let new = replacement.get(item).copied().unwrap_or(0);
            (old != new).then(|| (item.clone(), old, new))
        })
        .collect();

    if !replacement.is_empty() {
        task.warehouse_distribution
            .insert(warehouse.clone(), replacement);
    }
    let names: Vec<String> = task.warehouse_distribution.keys().cloned().collect();
    for name in names {
        task.warehouse_status_colors
            .entry(name)
            .or_insert(StatusColor::Neutral);
    }

    AllocationSaved {
        warehouse,
        changes,
        holding_before,
        holding_after: warehouses_holding_items(task),
    }
}

/// Remembers how many warehouses held items when last observed.
///
/// The first observation only initialises the tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarehouseCountTracker {
    last: Option<usize>,
}

impl WarehouseCountTracker {
    /// Creates an uninitialised tracker.
    #[must_use]
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Last observed count.
    #[must_use]
    pub const fn last(&self) -> Option<usize> {
        self.last
    }

    /// Records `count`, returning `(old, new)` when it differs from the
    /// previous observation.
    pub const fn observe(&mut self, count: usize) -> Option<(usize, usize)> {
        let previous = self.last;
        self.last = Some(count);
        match previous {
            Some(old) if old != count => Some((old, count)),
            _ => None,
        }
    }
}
