//! Repository for the `item_colors` table.

use sqlx::{PgConnection, PgExecutor};
use stockgrid_core::options::OptionDraft;
use stockgrid_core::types::DbId;

use crate::models::option::ColorRow;

const COLUMNS: &str = "id, sku, name, swatch, sort_order, created_at, updated_at";

pub struct ColorRepo;

impl ColorRepo {
    pub async fn list_for_sku<'e>(
        executor: impl PgExecutor<'e>,
        sku: &str,
    ) -> Result<Vec<ColorRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM item_colors WHERE sku = $1 ORDER BY id");
        sqlx::query_as::<_, ColorRow>(&query)
            .bind(sku)
            .fetch_all(executor)
            .await
    }

    pub async fn insert(
        conn: &mut PgConnection,
        sku: &str,
        draft: &OptionDraft,
    ) -> Result<ColorRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO item_colors (sku, name, swatch, sort_order) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ColorRow>(&query)
            .bind(sku)
            .bind(&draft.name)
            .bind(&draft.swatch)
            .bind(draft.sort_order)
            .fetch_one(conn)
            .await
    }

    /// Returns `None` if no colour with `id` belongs to `sku`.
    pub async fn update(
        conn: &mut PgConnection,
        sku: &str,
        id: DbId,
        draft: &OptionDraft,
    ) -> Result<Option<ColorRow>, sqlx::Error> {
        let query = format!(
            "UPDATE item_colors \
             SET name = $3, swatch = $4, sort_order = $5, updated_at = NOW() \
             WHERE sku = $1 AND id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ColorRow>(&query)
            .bind(sku)
            .bind(id)
            .bind(&draft.name)
            .bind(&draft.swatch)
            .bind(draft.sort_order)
            .fetch_optional(conn)
            .await
    }

    /// Cells referencing the colour go with it (`ON DELETE CASCADE`).
    pub async fn delete(conn: &mut PgConnection, sku: &str, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM item_colors WHERE sku = $1 AND id = $2")
            .bind(sku)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
