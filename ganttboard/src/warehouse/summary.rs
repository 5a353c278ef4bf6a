//! Compact warehouse summary: totals, weight and pallet counts.

use std::collections::BTreeSet;

use ganttboard_proto::palette::StatusColor;
use ganttboard_proto::task::Task;

use crate::reconcile::catalog::DEFAULT_PALLET_COEF;

/// Totals for one warehouse tab.
#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseTotals {
    /// Warehouse name.
    pub name: String,
    /// User-toggled status.
    pub status: StatusColor,
    /// Units held.
    pub quantity: u32,
    /// `Σ qty × itemWeight`, kilograms.
    pub weight: f64,
    /// `Σ qty × palletCoef / 100`.
    pub pallets: f64,
}

impl WarehouseTotals {
    /// Weight with two decimals; `-` for zero.
    #[must_use]
    pub fn weight_label(&self) -> String {
        format_weight(self.weight)
    }

    /// Pallet count as shown on the tab.
    #[must_use]
    pub fn pallets_label(&self) -> String {
        format_pallets(self.pallets)
    }
}

/// Grand totals across every warehouse.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SummaryTotals {
    /// Units held.
    pub quantity: u32,
    /// Kilograms.
    pub weight: f64,
    /// Pallets.
    pub pallets: f64,
}

impl SummaryTotals {
    /// Unit count; `-` for zero.
    #[must_use]
    pub fn quantity_label(&self) -> String {
        if self.quantity == 0 {
            "-".to_string()
        } else {
            self.quantity.to_string()
        }
    }

    /// Weight with two decimals; `-` for zero.
    #[must_use]
    pub fn weight_label(&self) -> String {
        format_weight(self.weight)
    }

    /// Pallet count as shown in the totals column.
    #[must_use]
    pub fn pallets_label(&self) -> String {
        format_pallets(self.pallets)
    }
}

/// Ordered vs allocated for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTotals {
    /// Item name.
    pub item: String,
    /// Ordered quantity.
    pub ordered: u32,
    /// Sum over all warehouses.
    pub allocated: u32,
    /// More is allocated than ordered (after the order was reduced).
    pub over_allocated: bool,
}

/// Everything the compact warehouse view shows.
#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseSummary {
    /// Warehouses holding at least one unit.
    pub warehouses: Vec<WarehouseTotals>,
    /// Every ordered or allocated item.
    pub items: Vec<ItemTotals>,
    /// Sums over `warehouses`.
    pub totals: SummaryTotals,
}

/// Weight with two decimals; `-` when nothing weighs anything.
#[must_use]
pub fn format_weight(weight: f64) -> String {
    if weight > 0.0 {
        format!("{weight:.2}")
    } else {
        "-".to_string()
    }
}

/// Pallet count as an integer when whole, otherwise one decimal; `-` for zero.
#[must_use]
pub fn format_pallets(pallets: f64) -> String {
    if pallets.abs() < f64::EPSILON {
        "-".to_string()
    } else if (pallets - pallets.round()).abs() < 1e-9 {
        format!("{pallets:.0}")
    } else {
        format!("{pallets:.1}")
    }
}

/// Computes the compact summary for `task`.
#[must_use]
pub fn summarize(task: &Task) -> WarehouseSummary {
    let warehouses: Vec<WarehouseTotals> = task
        .warehouse_distribution
        .iter()
        .filter_map(|(name, items)| {
            let quantity = items.values().fold(0u32, |acc, &q| acc.saturating_add(q));
            if quantity == 0 {
                return None;
            }
            let (weight, pallets) = items.iter().fold((0.0, 0.0), |(w, p), (item, &qty)| {
                let qty = f64::from(qty);
                let unit_weight = task.item_weights.get(item).copied().unwrap_or(0.0);
                let coef = task
                    .item_pallet_coefs
                    .get(item)
                    .copied()
                    .unwrap_or(DEFAULT_PALLET_COEF);
                (qty.mul_add(unit_weight, w), qty.mul_add(coef / 100.0, p))
            });
            Some(WarehouseTotals {
                name: name.clone(),
                status: task
                    .warehouse_status_colors
                    .get(name)
                    .copied()
                    .unwrap_or_default(),
                quantity,
                weight,
                pallets,
            })
        })
        .collect();

    let names: BTreeSet<&String> = task
        .order
        .keys()
        .chain(task.warehouse_distribution.values().flat_map(|items| items.keys()))
        .collect();
    let items = names
        .into_iter()
        .map(|item| {
            let ordered = task.ordered(item);
            let allocated = task
                .warehouse_distribution
                .values()
                .filter_map(|items| items.get(item))
                .fold(0u32, |acc, &q| acc.saturating_add(q));
            ItemTotals {
                item: item.clone(),
                ordered,
                allocated,
                over_allocated: ordered > 0 && allocated > ordered,
            }
        })
        .collect();

    let totals = warehouses.iter().fold(SummaryTotals::default(), |acc, tab| SummaryTotals {
        quantity: acc.quantity.saturating_add(tab.quantity),
        weight: acc.weight + tab.weight,
        pallets: acc.pallets + tab.pallets,
    });

    WarehouseSummary {
        warehouses,
        items,
        totals,
    }
}
