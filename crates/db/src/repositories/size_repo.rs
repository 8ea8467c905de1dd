//! Repository for the `item_sizes` table.

use sqlx::{PgConnection, PgExecutor};
use stockgrid_core::options::OptionDraft;
use stockgrid_core::types::DbId;

use crate::models::option::SizeRow;

const COLUMNS: &str = "id, sku, label, sort_order, created_at, updated_at";

pub struct SizeRepo;

impl SizeRepo {
    pub async fn list_for_sku<'e>(
        executor: impl PgExecutor<'e>,
        sku: &str,
    ) -> Result<Vec<SizeRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM item_sizes WHERE sku = $1 ORDER BY id");
        sqlx::query_as::<_, SizeRow>(&query)
            .bind(sku)
            .fetch_all(executor)
            .await
    }

    /// `draft.swatch` is ignored; sizes have none.
    pub async fn insert(
        conn: &mut PgConnection,
        sku: &str,
        draft: &OptionDraft,
    ) -> Result<SizeRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO item_sizes (sku, label, sort_order) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SizeRow>(&query)
            .bind(sku)
            .bind(&draft.name)
            .bind(draft.sort_order)
            .fetch_one(conn)
            .await
    }

    pub async fn update(
        conn: &mut PgConnection,
        sku: &str,
        id: DbId,
        draft: &OptionDraft,
    ) -> Result<Option<SizeRow>, sqlx::Error> {
        let query = format!(
            "UPDATE item_sizes \
             SET label = $3, sort_order = $4, updated_at = NOW() \
             WHERE sku = $1 AND id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SizeRow>(&query)
            .bind(sku)
            .bind(id)
            .bind(&draft.name)
            .bind(draft.sort_order)
            .fetch_optional(conn)
            .await
    }

    pub async fn delete(conn: &mut PgConnection, sku: &str, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM item_sizes WHERE sku = $1 AND id = $2")
            .bind(sku)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
