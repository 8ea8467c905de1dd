//! Repository for the `item_option_cascade_settings` table.
//!
//! At most one active row exists per SKU and per category (partial unique
//! indexes). Deleting a record only deactivates it.

use serde_json::Value;
use sqlx::PgPool;
use stockgrid_core::cascade::{SettingsMap, SettingsTarget};
use stockgrid_core::types::DbId;

use crate::models::cascade_settings::{
    target_columns, CascadeSettingsRow, APPLIES_TO_CATEGORY, APPLIES_TO_SKU,
};

const COLUMNS: &str =
    "id, applies_to_type, item_sku, category_id, settings, is_active, created_at, updated_at";

pub struct CascadeSettingsRepo;

impl CascadeSettingsRepo {
    pub async fn list_active(pool: &PgPool) -> Result<Vec<CascadeSettingsRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM item_option_cascade_settings \
             WHERE is_active \
             ORDER BY applies_to_type, item_sku NULLS LAST, category_id NULLS LAST, id"
        );
        sqlx::query_as::<_, CascadeSettingsRow>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn find_active_for_sku(
        pool: &PgPool,
        sku: &str,
    ) -> Result<Option<CascadeSettingsRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM item_option_cascade_settings \
             WHERE is_active AND applies_to_type = '{APPLIES_TO_SKU}' AND item_sku = $1"
        );
        sqlx::query_as::<_, CascadeSettingsRow>(&query)
            .bind(sku)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_active_for_category(
        pool: &PgPool,
        category_id: DbId,
    ) -> Result<Option<CascadeSettingsRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM item_option_cascade_settings \
             WHERE is_active AND applies_to_type = '{APPLIES_TO_CATEGORY}' AND category_id = $1"
        );
        sqlx::query_as::<_, CascadeSettingsRow>(&query)
            .bind(category_id)
            .fetch_optional(pool)
            .await
    }

    /// Replace the settings of the active row for `target`, or insert one.
    pub async fn upsert(
        pool: &PgPool,
        target: &SettingsTarget,
        settings: &SettingsMap,
    ) -> Result<CascadeSettingsRow, sqlx::Error> {
        let (applies_to_type, item_sku, category_id) = target_columns(target);
        let settings = Value::Object(settings.clone().into_iter().collect());
        let mut tx = pool.begin().await?;

        let update = format!(
            "UPDATE item_option_cascade_settings \
             SET settings = $4, updated_at = NOW() \
             WHERE is_active AND applies_to_type = $1 \
               AND item_sku IS NOT DISTINCT FROM $2 \
               AND category_id IS NOT DISTINCT FROM $3 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, CascadeSettingsRow>(&update)
            .bind(applies_to_type)
            .bind(item_sku)
            .bind(category_id)
            .bind(&settings)
            .fetch_optional(&mut *tx)
            .await?;

        let row = match updated {
            Some(row) => row,
            None => {
                let insert = format!(
                    "INSERT INTO item_option_cascade_settings \
                        (applies_to_type, item_sku, category_id, settings) \
                     VALUES ($1, $2, $3, $4) \
                     RETURNING {COLUMNS}"
                );
                sqlx::query_as::<_, CascadeSettingsRow>(&insert)
                    .bind(applies_to_type)
                    .bind(item_sku)
                    .bind(category_id)
                    .bind(&settings)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        tx.commit().await?;
        Ok(row)
    }

    /// Returns `true` if an active row was deactivated.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE item_option_cascade_settings \
             SET is_active = FALSE, updated_at = NOW() \
             WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
