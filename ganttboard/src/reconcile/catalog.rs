//! Order entry from the goods catalog.

use ganttboard_proto::catalog::GoodsItem;
use ganttboard_proto::task::{OrderMap, Task};

/// Default pallet coefficient for goods the catalog knows nothing about.
pub const DEFAULT_PALLET_COEF: f64 = 1.0;

/// Records catalog weights and pallet coefficients on `task` and returns
/// the order described by `selection`.
///
/// Non-positive quantities are dropped. `total_weight` is recomputed from
/// the kept lines. Weights are only stored when positive.
pub fn apply_catalog_selection(task: &mut Task, selection: &[(GoodsItem, i64)]) -> OrderMap {
    let mut order = OrderMap::new();
    let mut total_weight = 0.0;

    for (goods, quantity) in selection {
        if goods.weight > 0.0 {
            task.item_weights.insert(goods.name.clone(), goods.weight);
        }
        let coef = if goods.pallet_coef > 0.0 {
            goods.pallet_coef
        } else {
            DEFAULT_PALLET_COEF
        };
        task.item_pallet_coefs.insert(goods.name.clone(), coef);

        let Ok(quantity) = u32::try_from(*quantity) else {
            continue;
        };
        if quantity == 0 {
            continue;
        }
        total_weight += f64::from(quantity) * goods.weight.max(0.0);
        order.insert(goods.name.clone(), quantity);
    }

    task.total_weight = total_weight;
    order
}
