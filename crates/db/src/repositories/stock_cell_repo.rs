//! Repository for the `stock_cells` table.

use sqlx::{PgConnection, PgExecutor};
use stockgrid_core::matrix::CellKey;
use stockgrid_core::types::DbId;

use crate::models::stock_cell::StockCellRow;

const COLUMNS: &str = "id, sku, color_id, size_id, quantity, updated_at";

pub struct StockCellRepo;

impl StockCellRepo {
    pub async fn list_for_sku<'e>(
        executor: impl PgExecutor<'e>,
        sku: &str,
    ) -> Result<Vec<StockCellRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stock_cells WHERE sku = $1 ORDER BY id");
        sqlx::query_as::<_, StockCellRow>(&query)
            .bind(sku)
            .fetch_all(executor)
            .await
    }

    /// Insert a zero-quantity cell.
    pub async fn create(
        conn: &mut PgConnection,
        sku: &str,
        key: CellKey,
    ) -> Result<StockCellRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO stock_cells (sku, color_id, size_id, quantity) \
             VALUES ($1, $2, $3, 0) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StockCellRow>(&query)
            .bind(sku)
            .bind(key.color_id)
            .bind(key.size_id)
            .fetch_one(conn)
            .await
    }

    /// Returns the number of rows removed.
    pub async fn delete_many(
        conn: &mut PgConnection,
        sku: &str,
        ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM stock_cells WHERE sku = $1 AND id = ANY($2)")
            .bind(sku)
            .bind(ids)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Set the quantity of the cell at `key`. Returns `false` if no such
    /// cell exists.
    pub async fn set_quantity(
        conn: &mut PgConnection,
        sku: &str,
        key: CellKey,
        quantity: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE stock_cells \
             SET quantity = $4, updated_at = NOW() \
             WHERE sku = $1 \
               AND color_id IS NOT DISTINCT FROM $2 \
               AND size_id IS NOT DISTINCT FROM $3",
        )
        .bind(sku)
        .bind(key.color_id)
        .bind(key.size_id)
        .bind(quantity)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
