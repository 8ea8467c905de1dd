//! Repository for the `items` table.

use sqlx::{PgConnection, PgPool};

use crate::models::item::{CreateItem, ItemRow};

const COLUMNS: &str = "sku, name, category_id, stock_level, created_at, updated_at";

pub struct ItemRepo;

impl ItemRepo {
    pub async fn create(pool: &PgPool, input: &CreateItem) -> Result<ItemRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO items (sku, name, category_id) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ItemRow>(&query)
            .bind(input.sku.trim())
            .bind(&input.name)
            .bind(input.category_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_sku(pool: &PgPool, sku: &str) -> Result<Option<ItemRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM items WHERE sku = $1");
        sqlx::query_as::<_, ItemRow>(&query)
            .bind(sku)
            .fetch_optional(pool)
            .await
    }

    /// Recompute `stock_level` as the sum of the item's cell quantities.
    pub async fn refresh_stock_level(conn: &mut PgConnection, sku: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE items \
             SET stock_level = COALESCE( \
                    (SELECT SUM(quantity)::BIGINT FROM stock_cells WHERE sku = $1), 0), \
                 updated_at = NOW() \
             WHERE sku = $1 \
             RETURNING stock_level",
        )
        .bind(sku)
        .fetch_one(conn)
        .await
    }
}
