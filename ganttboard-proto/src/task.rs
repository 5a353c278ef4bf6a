//! Board task record and its order bookkeeping types.
//!
//! A [`Task`] is one bar on the timeline. Besides its placement it carries
//! the purchase order in several versions (current, baseline, previous),
//! an append-only quantity trail per item and the per-warehouse
//! distribution of ordered goods. The JSON form keeps the camelCase keys
//! used by the board's HTTP API.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::palette::StatusColor;

/// Duration given to a freshly added task, in days.
pub const DEFAULT_TASK_DAYS: f64 = 14.0;

/// Smallest visible duration a bar may shrink to, in days.
pub const MIN_VISIBLE_DAYS: f64 = 0.25;

/// Item name → ordered quantity. Absent and zero both mean "not ordered".
pub type OrderMap = BTreeMap<String, u32>;

/// Unique identifier for a task, based on UUID v7 for time-ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// One recorded quantity transition for an order item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderChange {
    /// Quantity before the save.
    pub old_qty: u32,
    /// Quantity after the save.
    pub new_qty: u32,
    /// Milliseconds since epoch when the save happened.
    pub timestamp: u64,
}

/// Direction of an item's quantity relative to the order baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantityTrend {
    /// Current quantity is above the baseline.
    #[serde(rename = "green")]
    Increase,
    /// Current quantity is below the baseline.
    #[serde(rename = "red")]
    Decrease,
}

impl QuantityTrend {
    /// Compares `current` against `baseline`; `None` when equal or when
    /// the item is no longer ordered.
    #[must_use]
    pub const fn between(baseline: u32, current: u32) -> Option<Self> {
        if current == 0 || current == baseline {
            None
        } else if current > baseline {
            Some(Self::Increase)
        } else {
            Some(Self::Decrease)
        }
    }

    /// Arrow glyph used in the compact change trail.
    #[must_use]
    pub const fn arrow(self) -> char {
        match self {
            Self::Increase => '↑',
            Self::Decrease => '↓',
        }
    }
}

/// Calendar placement of a bar: where it starts and how long it looks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// First day of the bar.
    pub start: NaiveDate,
    /// Visible duration in days, fractional after a resize.
    pub visible_days: f64,
}

/// A task bar on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,
    /// Board row the bar lives in.
    pub row: u32,
    /// First day of the bar.
    pub start: NaiveDate,
    /// Last persisted whole duration in days.
    #[serde(rename = "days")]
    pub committed_days: f64,
    /// Fractional adjustment from resizing, applied on top of `committed_days`.
    #[serde(rename = "delta", default)]
    pub pending_delta: f64,
    /// Free-form comment shown on the bar.
    #[serde(default)]
    pub comment: String,
    /// Current order.
    #[serde(default)]
    pub order: OrderMap,
    /// Baseline captured on the first save that established an order.
    #[serde(default)]
    pub initial_order: OrderMap,
    /// Order as it stood before the most recent save.
    #[serde(default)]
    pub previous_order: OrderMap,
    /// Append-only quantity trail per item.
    #[serde(default)]
    pub order_changes: BTreeMap<String, Vec<OrderChange>>,
    /// Saved increase/decrease annotation per item, relative to the baseline.
    #[serde(default)]
    pub order_colors: BTreeMap<String, QuantityTrend>,
    /// User-toggled status per item.
    #[serde(default)]
    pub order_status_colors: BTreeMap<String, StatusColor>,
    /// Warehouse name → item quantities stored there.
    #[serde(default)]
    pub warehouse_distribution: BTreeMap<String, OrderMap>,
    /// User-toggled status per warehouse.
    #[serde(default)]
    pub warehouse_status_colors: BTreeMap<String, StatusColor>,
    /// Unit weight per item, taken from the catalog.
    #[serde(default)]
    pub item_weights: BTreeMap<String, f64>,
    /// Pallet coefficient per item, taken from the catalog.
    #[serde(default)]
    pub item_pallet_coefs: BTreeMap<String, f64>,
    /// Weight of the whole order at the last catalog entry.
    #[serde(default)]
    pub total_weight: f64,
}

impl Task {
    /// Creates an empty task at the given row and start date.
    #[must_use]
    pub fn new(row: u32, start: NaiveDate, days: f64) -> Self {
        Self {
            id: TaskId::new(),
            row,
            start,
            committed_days: days,
            pending_delta: 0.0,
            comment: String::new(),
            order: OrderMap::new(),
            initial_order: OrderMap::new(),
            previous_order: OrderMap::new(),
            order_changes: BTreeMap::new(),
            order_colors: BTreeMap::new(),
            order_status_colors: BTreeMap::new(),
            warehouse_distribution: BTreeMap::new(),
            warehouse_status_colors: BTreeMap::new(),
            item_weights: BTreeMap::new(),
            item_pallet_coefs: BTreeMap::new(),
            total_weight: 0.0,
        }
    }

    /// Committed duration with non-positive stored values read as one day.
    #[must_use]
    pub fn effective_days(&self) -> f64 {
        if self.committed_days > 0.0 {
            self.committed_days
        } else {
            1.0
        }
    }

    /// Duration the bar is drawn with.
    #[must_use]
    pub fn visible_days(&self) -> f64 {
        (self.effective_days() + self.pending_delta).max(MIN_VISIBLE_DAYS)
    }

    /// Current placement of the bar.
    #[must_use]
    pub fn placement(&self) -> Placement {
        Placement {
            start: self.start,
            visible_days: self.visible_days(),
        }
    }

    /// Ordered quantity of `item`, zero when absent.
    #[must_use]
    pub fn ordered(&self, item: &str) -> u32 {
        self.order.get(item).copied().unwrap_or(0)
    }

    /// Whether any item in the current order has a positive quantity.
    #[must_use]
    pub fn has_positive_order(&self) -> bool {
        self.order.values().any(|&qty| qty > 0)
    }
}
