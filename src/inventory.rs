//! Inventory provider.
//!
//! Inventory is produced outside the collection pipeline. When its
//! file is present the list is passed through unmodified; otherwise
//! the fixed default product set is used.

use std::path::Path;

use crate::{
    error::CacheError,
    schema::{InventoryItem, STOCK_NORMAL},
    store,
};

pub async fn load_inventory(path: Option<&Path>) -> Vec<InventoryItem> {
    let Some(path) = path else {
        return default_inventory();
    };

    match store::read_snapshot::<Vec<InventoryItem>>(path).await {
        Ok(items) => items,
        Err(CacheError::Miss { .. }) => default_inventory(),
        Err(e) => {
            log::warn!("inventory unavailable, using defaults: {e}");
            default_inventory()
        }
    }
}

fn item(id: &str, name: &str, current: i64, reserved: i64, status: &str) -> InventoryItem {
    InventoryItem {
        product_id: id.to_string(),
        product_name: name.to_string(),
        sku: None,
        current_stock: current,
        reserved_stock: reserved,
        available_stock: current - reserved,
        status: status.to_string(),
        extra: Default::default(),
    }
}

pub fn default_inventory() -> Vec<InventoryItem> {
    vec![
        item("P001", "LOCK IN COFFEE::HOUSE", 50, 5, STOCK_NORMAL),
        item("P002", "LOCK IN COFFEE::VIBRANT", 35, 3, STOCK_NORMAL),
        item("P003", "LOCK IN COFFEE::DECAF", 8, 2, "low"),
        item("P004", "[1+1 EVENT] LOCK IN COFFEE", 25, 4, STOCK_NORMAL),
    ]
}
