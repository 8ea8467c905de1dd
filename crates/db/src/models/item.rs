use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use stockgrid_core::options::Item;
use stockgrid_core::types::{DbId, Timestamp};

/// A row from the `items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ItemRow {
    pub sku: String,
    pub name: String,
    pub category_id: Option<DbId>,
    pub stock_level: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            sku: row.sku,
            name: row.name,
            category_id: row.category_id,
            stock_level: row.stock_level,
        }
    }
}

/// DTO for creating an item.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateItem {
    pub sku: String,
    pub name: String,
    pub category_id: Option<DbId>,
}
