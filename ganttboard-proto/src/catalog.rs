//! Goods catalog entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Category used for goods that arrive without one.
pub const DEFAULT_CATEGORY: &str = "Other";

const fn one() -> f64 {
    1.0
}

/// A product that can be ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodsItem {
    /// Product name, also the key used in order maps.
    pub name: String,
    /// Unit weight in kilograms.
    #[serde(default = "one")]
    pub weight: f64,
    /// Share of a pallet one unit takes, in percent.
    #[serde(default = "one")]
    pub pallet_coef: f64,
}

impl GoodsItem {
    /// Creates a catalog entry.
    #[must_use]
    pub fn new(name: impl Into<String>, weight: f64, pallet_coef: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            pallet_coef,
        }
    }
}

/// Category name → goods in that category.
pub type Catalog = BTreeMap<String, Vec<GoodsItem>>;

/// A catalog row as stored on disk: one product with an optional category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// The product.
    #[serde(flatten)]
    pub item: GoodsItem,
    /// Category name; blank or missing means [`DEFAULT_CATEGORY`].
    #[serde(default)]
    pub category: Option<String>,
}

impl CatalogEntry {
    /// Category the entry is listed under.
    #[must_use]
    pub fn category_name(&self) -> &str {
        self.category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
    }
}

/// Groups flat catalog rows by category.
#[must_use]
pub fn group_by_category(entries: Vec<CatalogEntry>) -> Catalog {
    let mut catalog = Catalog::new();
    for entry in entries {
        let category = entry.category_name().to_string();
        catalog.entry(category).or_default().push(entry.item);
    }
    catalog
}

/// Looks an item up by name across all categories.
#[must_use]
pub fn find_item<'a>(catalog: &'a Catalog, name: &str) -> Option<&'a GoodsItem> {
    catalog.values().flatten().find(|item| item.name == name)
}
