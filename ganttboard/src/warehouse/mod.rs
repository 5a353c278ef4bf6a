//! Warehouse allocation.
//!
//! Ordered quantities are spread across warehouses under one rule: for
//! every item, the sum over warehouses never exceeds the ordered quantity.
//! Availability is recomputed from the task on every call; nothing is
//! cached between interactions.

pub mod allocation;
pub mod summary;

pub use allocation::{
    AllocationDraft, AllocationRow, AllocationSaved, WarehouseCountTracker, allocated_elsewhere,
    available_for, cycle_warehouse_status, save_allocation, warehouses_holding_items,
};
pub use summary::{
    ItemTotals, SummaryTotals, WarehouseSummary, WarehouseTotals, format_pallets, format_weight, summarize,
};
