//! Rows for `item_colors` and `item_sizes`.

use sqlx::FromRow;
use stockgrid_core::options::{ColorOption, SizeOption};
use stockgrid_core::types::{DbId, Timestamp};

#[derive(Debug, Clone, FromRow)]
pub struct ColorRow {
    pub id: DbId,
    pub sku: String,
    pub name: String,
    pub swatch: Option<String>,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<ColorRow> for ColorOption {
    fn from(row: ColorRow) -> Self {
        ColorOption {
            id: row.id,
            sku: row.sku,
            name: row.name,
            swatch: row.swatch,
            sort_order: row.sort_order,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SizeRow {
    pub id: DbId,
    pub sku: String,
    pub label: String,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<SizeRow> for SizeOption {
    fn from(row: SizeRow) -> Self {
        SizeOption {
            id: row.id,
            sku: row.sku,
            label: row.label,
            sort_order: row.sort_order,
        }
    }
}
