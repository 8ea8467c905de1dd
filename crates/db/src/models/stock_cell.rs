use sqlx::FromRow;
use stockgrid_core::matrix::StockCell;
use stockgrid_core::types::{DbId, Timestamp};

/// A row from the `stock_cells` table.
#[derive(Debug, Clone, FromRow)]
pub struct StockCellRow {
    pub id: DbId,
    pub sku: String,
    pub color_id: Option<DbId>,
    pub size_id: Option<DbId>,
    pub quantity: i64,
    pub updated_at: Timestamp,
}

impl From<StockCellRow> for StockCell {
    fn from(row: StockCellRow) -> Self {
        StockCell {
            id: row.id,
            sku: row.sku,
            color_id: row.color_id,
            size_id: row.size_id,
            quantity: row.quantity,
        }
    }
}
