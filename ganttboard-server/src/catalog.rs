//! Goods catalog and warehouse list.
//!
//! Both are held in memory behind a [`RwLock`] and written back to their
//! JSON file after every change. Goods names are matched without regard to
//! case inside a category; warehouse names are matched exactly.

use std::path::PathBuf;

use ganttboard_proto::catalog::{Catalog, CatalogEntry, GoodsItem, group_by_category};
use tokio::sync::RwLock;

use crate::{StoreError, read_json, write_json};

/// File holding the flat goods list.
pub const GOODS_FILE: &str = "goods.json";

/// File holding the warehouse names.
pub const WAREHOUSES_FILE: &str = "warehouses.json";

/// Rejected catalog or warehouse edits.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// A required field was blank.
    #[error("{0} is required")]
    Missing(&'static str),

    /// The category already lists an item with this name.
    #[error("{category} already lists {name}")]
    DuplicateGoods {
        /// Category searched.
        category: String,
        /// Conflicting name.
        name: String,
    },

    /// No item with this name in the category.
    #[error("no {name} in {category}")]
    UnknownGoods {
        /// Category searched.
        category: String,
        /// Name looked up.
        name: String,
    },

    /// A warehouse with this name already exists.
    #[error("warehouse {0} already exists")]
    DuplicateWarehouse(String),

    /// No warehouse with this name.
    #[error("warehouse not found: {0}")]
    UnknownWarehouse(String),

    /// The backing file could not be written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Trims `value`, rejecting it as `field` when nothing is left.
fn required(value: &str, field: &'static str) -> Result<String, DirectoryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DirectoryError::Missing(field));
    }
    Ok(trimmed.to_string())
}

fn same_goods(entry: &CatalogEntry, category: &str, name: &str) -> bool {
    entry.category_name() == category && entry.item.name.to_lowercase() == name.to_lowercase()
}

/// Goods catalog stored as a flat list of categorised entries.
pub struct GoodsDb {
    path: Option<PathBuf>,
    entries: RwLock<Vec<CatalogEntry>>,
}

impl Default for GoodsDb {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl GoodsDb {
    /// Creates an empty catalog that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Opens the catalog stored at `path`, dropping rows without a name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read or parsed.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        let stored: Vec<CatalogEntry> = read_json(&path).await?;
        let entries: Vec<CatalogEntry> = stored
            .into_iter()
            .filter(|e| !e.item.name.trim().is_empty())
            .collect();
        tracing::info!(path = %path.display(), goods = entries.len(), "goods catalog loaded");
        Ok(Self {
            path: Some(path),
            entries: RwLock::new(entries),
        })
    }

    /// The catalog grouped by category.
    pub async fn catalog(&self) -> Catalog {
        group_by_category(self.entries.read().await.clone())
    }

    /// The flat entry list, in stored order.
    pub async fn entries(&self) -> Vec<CatalogEntry> {
        self.entries.read().await.clone()
    }

    /// Adds `item` under `category`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if a name is blank, the category already
    /// lists the item, or the file cannot be written.
    pub async fn add(&self, category: &str, mut item: GoodsItem) -> Result<(), DirectoryError> {
        let category = required(category, "category")?;
        item.name = required(&item.name, "name")?;
        let mut entries = self.entries.write().await;
        if entries.iter().any(|e| same_goods(e, &category, &item.name)) {
            return Err(DirectoryError::DuplicateGoods {
                category,
                name: item.name,
            });
        }
        tracing::debug!(%category, name = %item.name, "goods added");
        entries.push(CatalogEntry {
            item,
            category: Some(category),
        });
        self.flush(&entries).await?;
        Ok(())
    }

    /// Replaces the item `old_name` in `old_category` with `item` under
    /// `category`. Nothing changes when the new name is taken.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if a name is blank, the old item is
    /// unknown, the new name is taken, or the file cannot be written.
    pub async fn replace(
        &self,
        old_category: &str,
        old_name: &str,
        category: &str,
        mut item: GoodsItem,
    ) -> Result<(), DirectoryError> {
        let old_category = required(old_category, "old_category")?;
        let old_name = required(old_name, "old_name")?;
        let category = required(category, "category")?;
        item.name = required(&item.name, "name")?;

        let mut entries = self.entries.write().await;
        let Some(index) = entries
            .iter()
            .position(|e| same_goods(e, &old_category, &old_name))
        else {
            return Err(DirectoryError::UnknownGoods {
                category: old_category,
                name: old_name,
            });
        };
        let taken = entries
            .iter()
            .enumerate()
            .any(|(i, e)| i != index && same_goods(e, &category, &item.name));
        if taken {
            return Err(DirectoryError::DuplicateGoods {
                category,
                name: item.name,
            });
        }
        tracing::debug!(%old_category, %old_name, %category, name = %item.name, "goods updated");
        entries[index] = CatalogEntry {
            item,
            category: Some(category),
        };
        self.flush(&entries).await?;
        Ok(())
    }

    /// Deletes the item `name` from `category`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if a name is blank, the item is unknown,
    /// or the file cannot be written.
    pub async fn remove(&self, category: &str, name: &str) -> Result<(), DirectoryError> {
        let category = required(category, "category")?;
        let name = required(name, "name")?;
        let mut entries = self.entries.write().await;
        let Some(index) = entries.iter().position(|e| same_goods(e, &category, &name)) else {
            return Err(DirectoryError::UnknownGoods { category, name });
        };
        entries.remove(index);
        tracing::debug!(%category, %name, "goods removed");
        self.flush(&entries).await?;
        Ok(())
    }

    /// Replaces the whole catalog. Every row needs a category and a name.
    /// Returns the number of rows stored.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if any row is incomplete (nothing is
    /// replaced then) or the file cannot be written.
    pub async fn import(&self, rows: Vec<CatalogEntry>) -> Result<usize, DirectoryError> {
        let mut imported = Vec::with_capacity(rows.len());
        for mut row in rows {
            let category = required(row.category.as_deref().unwrap_or_default(), "category")?;
            row.item.name = required(&row.item.name, "name")?;
            row.category = Some(category);
            imported.push(row);
        }
        let count = imported.len();
        let mut entries = self.entries.write().await;
        *entries = imported;
        tracing::info!(goods = count, "goods catalog imported");
        self.flush(&entries).await?;
        Ok(count)
    }

    async fn flush(&self, entries: &[CatalogEntry]) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        write_json(path, &entries).await
    }
}

/// Warehouse names in display order.
pub struct WarehouseDb {
    path: Option<PathBuf>,
    names: RwLock<Vec<String>>,
}

impl Default for WarehouseDb {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl WarehouseDb {
    /// Creates an empty list that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            names: RwLock::new(Vec::new()),
        }
    }

    /// Opens the list stored at `path`, trimming names and dropping blanks.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read or parsed.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        let stored: Vec<String> = read_json(&path).await?;
        let names: Vec<String> = stored
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        tracing::info!(path = %path.display(), warehouses = names.len(), "warehouse list loaded");
        Ok(Self {
            path: Some(path),
            names: RwLock::new(names),
        })
    }

    /// Every warehouse name.
    pub async fn list(&self) -> Vec<String> {
        self.names.read().await.clone()
    }

    /// Appends a warehouse.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if the name is blank or taken, or the
    /// file cannot be written.
    pub async fn add(&self, name: &str) -> Result<(), DirectoryError> {
        let name = required(name, "name")?;
        let mut names = self.names.write().await;
        if names.contains(&name) {
            return Err(DirectoryError::DuplicateWarehouse(name));
        }
        tracing::debug!(%name, "warehouse added");
        names.push(name);
        self.flush(&names).await?;
        Ok(())
    }

    /// Renames a warehouse in place.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if a name is blank, the old name is
    /// unknown, the new name belongs to another warehouse, or the file
    /// cannot be written.
    pub async fn rename(&self, old_name: &str, name: &str) -> Result<(), DirectoryError> {
        let old_name = required(old_name, "old_name")?;
        let name = required(name, "name")?;
        let mut names = self.names.write().await;
        let Some(index) = names.iter().position(|n| *n == old_name) else {
            return Err(DirectoryError::UnknownWarehouse(old_name));
        };
        if name != old_name && names.contains(&name) {
            return Err(DirectoryError::DuplicateWarehouse(name));
        }
        tracing::debug!(%old_name, %name, "warehouse renamed");
        names[index] = name;
        self.flush(&names).await?;
        Ok(())
    }

    /// Deletes a warehouse.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if the name is blank or unknown, or the
    /// file cannot be written.
    pub async fn remove(&self, name: &str) -> Result<(), DirectoryError> {
        let name = required(name, "name")?;
        let mut names = self.names.write().await;
        let Some(index) = names.iter().position(|n| *n == name) else {
            return Err(DirectoryError::UnknownWarehouse(name));
        };
        names.remove(index);
        tracing::debug!(%name, "warehouse removed");
        self.flush(&names).await?;
        Ok(())
    }

    async fn flush(&self, names: &[String]) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        write_json(path, &names).await
    }
}
