//! Display lines for the order tooltip.

use std::collections::BTreeSet;
use std::fmt;

use ganttboard_proto::palette::StatusColor;
use ganttboard_proto::task::{OrderMap, QuantityTrend, Task};

use super::session::DisplayMode;

/// How a line's quantity relates to its comparison value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMark {
    /// Shown as-is.
    Plain,
    /// Positive now, zero or absent before.
    Added,
    /// Zero now, `was` before.
    Removed {
        /// Prior quantity, shown struck through.
        was: u32,
    },
    /// Changed relative to the pre-save order.
    Changed {
        /// Prior quantity, shown struck through.
        was: u32,
        /// Styling for the new quantity.
        trend: QuantityTrend,
    },
    /// In View mode, the baseline differs from the current quantity.
    Revised {
        /// Baseline quantity, shown struck through.
        baseline: u32,
    },
}

/// One step of an item's quantity trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityStep {
    /// Quantity before.
    pub from: u32,
    /// Quantity after.
    pub to: u32,
}

impl QuantityStep {
    /// Direction of the step.
    #[must_use]
    pub const fn trend(&self) -> QuantityTrend {
        if self.to > self.from {
            QuantityTrend::Increase
        } else {
            QuantityTrend::Decrease
        }
    }
}

impl fmt::Display for QuantityStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}→{}", self.trend().arrow(), self.from, self.to)
    }
}

/// One item row of the tooltip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    /// Item name.
    pub item: String,
    /// Quantity shown.
    pub quantity: u32,
    /// User-toggled status.
    pub status: StatusColor,
    /// Comparison marker.
    pub mark: LineMark,
    /// Saved increase/decrease color relative to the baseline.
    pub trend: Option<QuantityTrend>,
    /// Quantity trail, oldest first. Only filled in View mode.
    pub trail: Vec<QuantityStep>,
}

impl fmt::Display for OrderLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mark {
            LineMark::Plain => write!(f, "{}: {}", self.item, self.quantity)?,
            LineMark::Added => write!(f, "{}: {} (added)", self.item, self.quantity)?,
            LineMark::Removed { was } => write!(f, "{}: {was} → removed", self.item)?,
            LineMark::Changed { was, .. } => write!(f, "{}: {was} → {}", self.item, self.quantity)?,
            LineMark::Revised { baseline } => {
                write!(f, "{}: {} (was {baseline})", self.item, self.quantity)?;
            }
        }
        if !self.trail.is_empty() {
            let steps: Vec<String> = self.trail.iter().map(ToString::to_string).collect();
            write!(f, " [{}]", steps.join(" "))?;
        }
        Ok(())
    }
}

/// A rendered tooltip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderView {
    /// Mode the tooltip was rendered in.
    pub mode: DisplayMode,
    /// Item rows.
    pub lines: Vec<OrderLine>,
    /// Whether to show the "order empty" placeholder.
    pub empty: bool,
    /// Whether to offer the edit action.
    pub can_edit: bool,
}

impl OrderView {
    /// Line for `item`, if shown.
    #[must_use]
    pub fn line(&self, item: &str) -> Option<&OrderLine> {
        self.lines.iter().find(|line| line.item == item)
    }
}

fn status_of(task: &Task, item: &str) -> StatusColor {
    task.order_status_colors
        .get(item)
        .copied()
        .unwrap_or_default()
}

fn trail_of(task: &Task, item: &str) -> Vec<QuantityStep> {
    task.order_changes
        .get(item)
        .map(|changes| {
            changes
                .iter()
                .filter(|c| c.old_qty != c.new_qty)
                .map(|c| QuantityStep {
                    from: c.old_qty,
                    to: c.new_qty,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// View mode: positive items against the baseline. Hidden when nothing
/// is ordered.
pub(crate) fn render_view(task: &Task) -> Option<OrderView> {
    if !task.has_positive_order() {
        return None;
    }
    let lines: Vec<OrderLine> = task
        .order
        .iter()
        .filter(|&(_, &qty)| qty > 0)
        .map(|(item, &quantity)| {
            let mark = match task.initial_order.get(item) {
                Some(&baseline) if baseline > 0 && baseline != quantity => LineMark::Revised { baseline },
                _ => LineMark::Plain,
            };
            OrderLine {
                item: item.clone(),
                quantity,
                status: status_of(task, item),
                mark,
                trend: task.order_colors.get(item).copied(),
                trail: trail_of(task, item),
            }
        })
        .collect();
    Some(OrderView {
        mode: DisplayMode::View,
        empty: lines.is_empty(),
        lines,
        can_edit: true,
    })
}

/// Edit mode: items that were positive in the snapshot plus anything added
/// during the session, with working quantities.
pub(crate) fn render_edit(task: &Task, snapshot: &OrderMap, working: &OrderMap) -> OrderView {
    let items: BTreeSet<&String> = snapshot
        .iter()
        .filter(|&(_, &qty)| qty > 0)
        .map(|(item, _)| item)
        .chain(working.keys())
        .collect();
    let lines: Vec<OrderLine> = items
        .into_iter()
        .map(|item| OrderLine {
            item: item.clone(),
            quantity: working.get(item).copied().unwrap_or(0),
            status: status_of(task, item),
            mark: LineMark::Plain,
            trend: None,
            trail: Vec::new(),
        })
        .collect();
    OrderView {
        mode: DisplayMode::Edit,
        empty: lines.is_empty(),
        lines,
        can_edit: false,
    }
}

/// Post-Save Diff: current order against the pre-save order, keeping
/// removed items visible.
pub(crate) fn render_diff(task: &Task, baseline: &OrderMap) -> Option<OrderView> {
    if !task.has_positive_order() && baseline.is_empty() {
        return None;
    }
    let items: BTreeSet<&String> = task.order.keys().chain(baseline.keys()).collect();
    let lines: Vec<OrderLine> = items
        .into_iter()
        .filter_map(|item| {
            let quantity = task.ordered(item);
            let was = baseline.get(item).copied().unwrap_or(0);
            if quantity == 0 && was == 0 {
                return None;
            }
            let mark = if quantity == was {
                LineMark::Plain
            } else if was == 0 {
                LineMark::Added
            } else if quantity == 0 {
                LineMark::Removed { was }
            } else {
                let trend = task.order_colors.get(item).copied().unwrap_or(if quantity < was {
                    QuantityTrend::Decrease
                } else {
                    QuantityTrend::Increase
                });
                LineMark::Changed { was, trend }
            };
            Some(OrderLine {
                item: item.clone(),
                quantity,
                status: status_of(task, item),
                mark,
                trend: task.order_colors.get(item).copied(),
                trail: Vec::new(),
            })
        })
        .collect();
    Some(OrderView {
        mode: DisplayMode::PostSaveDiff,
        lines,
        empty: false,
        can_edit: true,
    })
}
