//! PostgreSQL implementation of the core store traits.
//!
//! Every multi-statement operation runs in one transaction; dropping the
//! transaction on an early `?` rolls it back.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use stockgrid_core::cascade::{ScopedSettings, SettingsMap, SettingsRecord, SettingsTarget};
use stockgrid_core::error::CoreError;
use stockgrid_core::matrix::{
    plan_reconcile, required_keys, CellQuantity, ReconcileCounts, ReconcilePlan, StockCell,
};
use stockgrid_core::options::{ColorOption, Item, OptionAxis, OptionDraft, SizeOption};
use stockgrid_core::store::{CascadeSettingsStore, CascadeSource, InventoryStore};
use stockgrid_core::templates::{AxisPlan, AxisPlanOutcome};
use stockgrid_core::types::DbId;

use crate::repositories::{
    CascadeSettingsRepo, CategoryRepo, ColorRepo, ItemRepo, SizeRepo, StockCellRepo,
};

/// Map a sqlx error onto the domain taxonomy.
///
/// - Unique violations on `uq_` constraints become `Conflict`.
/// - Foreign-key violations become `Validation`.
/// - Everything else is logged and becomes a sanitized `Internal`.
pub fn db_error(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some("23505") => {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return CoreError::Conflict(format!(
                        "Duplicate value violates unique constraint: {constraint}"
                    ));
                }
            }
            Some("23503") => {
                return CoreError::Validation("Referenced record does not exist".into());
            }
            _ => {}
        }
    }
    tracing::error!(error = %err, "Database error");
    CoreError::Internal("A database error occurred".into())
}

/// Inventory and cascade settings store over a connection pool.
#[derive(Debug, Clone)]
pub struct PgInventoryStore {
    pool: PgPool,
}

impl PgInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn delete_option_in(
    conn: &mut PgConnection,
    sku: &str,
    axis: OptionAxis,
    id: DbId,
) -> Result<bool, sqlx::Error> {
    match axis {
        OptionAxis::Color => ColorRepo::delete(conn, sku, id).await,
        OptionAxis::Size => SizeRepo::delete(conn, sku, id).await,
    }
}

async fn apply_reconcile_in(
    conn: &mut PgConnection,
    sku: &str,
    plan: &ReconcilePlan,
) -> Result<(), sqlx::Error> {
    StockCellRepo::delete_many(&mut *conn, sku, &plan.remove).await?;
    for key in &plan.create {
        StockCellRepo::create(&mut *conn, sku, *key).await?;
    }
    Ok(())
}

/// Plan against the options and cells visible to `conn`, then apply.
async fn reconcile_in(conn: &mut PgConnection, sku: &str) -> Result<ReconcilePlan, sqlx::Error> {
    let colors: Vec<ColorOption> = ColorRepo::list_for_sku(&mut *conn, sku)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let sizes: Vec<SizeOption> = SizeRepo::list_for_sku(&mut *conn, sku)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let cells: Vec<StockCell> = StockCellRepo::list_for_sku(&mut *conn, sku)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let plan = plan_reconcile(&required_keys(&colors, &sizes), &cells);
    apply_reconcile_in(conn, sku, &plan).await?;
    Ok(plan)
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    async fn find_item(&self, sku: &str) -> Result<Option<Item>, CoreError> {
        let row = ItemRepo::find_by_sku(&self.pool, sku).await.map_err(db_error)?;
        Ok(row.map(Item::from))
    }

    async fn list_colors(&self, sku: &str) -> Result<Vec<ColorOption>, CoreError> {
        let rows = ColorRepo::list_for_sku(&self.pool, sku)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(ColorOption::from).collect())
    }

    async fn list_sizes(&self, sku: &str) -> Result<Vec<SizeOption>, CoreError> {
        let rows = SizeRepo::list_for_sku(&self.pool, sku)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(SizeOption::from).collect())
    }

    async fn save_color(
        &self,
        sku: &str,
        id: Option<DbId>,
        draft: &OptionDraft,
    ) -> Result<(ColorOption, ReconcileCounts), CoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let row = match id {
            Some(id) => ColorRepo::update(&mut tx, sku, id, draft)
                .await
                .map_err(db_error)?
                .ok_or_else(|| CoreError::not_found("ColorOption", id))?,
            None => ColorRepo::insert(&mut tx, sku, draft)
                .await
                .map_err(db_error)?,
        };
        let plan = reconcile_in(&mut tx, sku).await.map_err(db_error)?;
        ItemRepo::refresh_stock_level(&mut tx, sku)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;
        Ok((row.into(), plan.counts()))
    }

    async fn save_size(
        &self,
        sku: &str,
        id: Option<DbId>,
        draft: &OptionDraft,
    ) -> Result<(SizeOption, ReconcileCounts), CoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let row = match id {
            Some(id) => SizeRepo::update(&mut tx, sku, id, draft)
                .await
                .map_err(db_error)?
                .ok_or_else(|| CoreError::not_found("SizeOption", id))?,
            None => SizeRepo::insert(&mut tx, sku, draft)
                .await
                .map_err(db_error)?,
        };
        let plan = reconcile_in(&mut tx, sku).await.map_err(db_error)?;
        ItemRepo::refresh_stock_level(&mut tx, sku)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;
        Ok((row.into(), plan.counts()))
    }

    async fn delete_option(
        &self,
        sku: &str,
        axis: OptionAxis,
        id: DbId,
    ) -> Result<Option<ReconcileCounts>, CoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        if !delete_option_in(&mut tx, sku, axis, id).await.map_err(db_error)? {
            return Ok(None);
        }
        let plan = reconcile_in(&mut tx, sku).await.map_err(db_error)?;
        ItemRepo::refresh_stock_level(&mut tx, sku)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;
        Ok(Some(plan.counts()))
    }

    async fn list_cells(&self, sku: &str) -> Result<Vec<StockCell>, CoreError> {
        let rows = StockCellRepo::list_for_sku(&self.pool, sku)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(StockCell::from).collect())
    }

    async fn apply_reconcile(&self, sku: &str, plan: &ReconcilePlan) -> Result<(), CoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        apply_reconcile_in(&mut tx, sku, plan)
            .await
            .map_err(db_error)?;
        ItemRepo::refresh_stock_level(&mut tx, sku)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)
    }

    async fn write_quantities(
        &self,
        sku: &str,
        quantities: &[CellQuantity],
    ) -> Result<ReconcileCounts, CoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let plan = reconcile_in(&mut tx, sku).await.map_err(db_error)?;
        for q in quantities {
            let updated = StockCellRepo::set_quantity(&mut tx, sku, q.key, q.quantity)
                .await
                .map_err(db_error)?;
            if !updated {
                return Err(CoreError::not_found("StockCell", q.key));
            }
        }
        let level = ItemRepo::refresh_stock_level(&mut tx, sku)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;
        tracing::debug!(
            sku = %sku,
            cells = quantities.len(),
            cells_created = plan.create.len(),
            cells_removed = plan.remove.len(),
            stock_level = level,
            "Wrote quantities"
        );
        Ok(plan.counts())
    }

    async fn apply_axis_plan(
        &self,
        sku: &str,
        axis: OptionAxis,
        plan: &AxisPlan,
    ) -> Result<AxisPlanOutcome, CoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let mut outcome = AxisPlanOutcome::default();

        for &id in &plan.removals {
            if !delete_option_in(&mut tx, sku, axis, id).await.map_err(db_error)? {
                return Err(CoreError::not_found(axis.entity(), id));
            }
            outcome.options_removed += 1;
        }

        for (id, draft) in &plan.upserts {
            let saved = match (axis, id) {
                (OptionAxis::Color, Some(id)) => ColorRepo::update(&mut tx, sku, *id, draft)
                    .await
                    .map_err(db_error)?
                    .is_some(),
                (OptionAxis::Color, None) => {
                    ColorRepo::insert(&mut tx, sku, draft).await.map_err(db_error)?;
                    true
                }
                (OptionAxis::Size, Some(id)) => SizeRepo::update(&mut tx, sku, *id, draft)
                    .await
                    .map_err(db_error)?
                    .is_some(),
                (OptionAxis::Size, None) => {
                    SizeRepo::insert(&mut tx, sku, draft).await.map_err(db_error)?;
                    true
                }
            };
            match id {
                Some(id) if !saved => return Err(CoreError::not_found(axis.entity(), id)),
                Some(_) => outcome.options_updated += 1,
                None => outcome.options_added += 1,
            }
        }

        let reconcile = reconcile_in(&mut tx, sku).await.map_err(db_error)?;
        ItemRepo::refresh_stock_level(&mut tx, sku)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;

        outcome.cells_created = reconcile.create.len();
        outcome.cells_removed = reconcile.remove.len();
        Ok(outcome)
    }
}

#[async_trait]
impl CascadeSource for PgInventoryStore {
    async fn scoped_settings(&self, sku: &str) -> Result<ScopedSettings, CoreError> {
        let item = ItemRepo::find_by_sku(&self.pool, sku)
            .await
            .map_err(db_error)?
            .ok_or_else(|| CoreError::not_found("Item", sku))?;

        let explicit = CascadeSettingsRepo::find_active_for_sku(&self.pool, sku)
            .await
            .map_err(db_error)?
            .map(|row| row.settings_map());

        let category = match item.category_id {
            Some(category_id) => {
                CascadeSettingsRepo::find_active_for_category(&self.pool, category_id)
                    .await
                    .map_err(db_error)?
                    .map(|row| (category_id, row.settings_map()))
            }
            None => None,
        };

        Ok(ScopedSettings { explicit, category })
    }
}

#[async_trait]
impl CascadeSettingsStore for PgInventoryStore {
    async fn list_settings(&self) -> Result<Vec<SettingsRecord>, CoreError> {
        CascadeSettingsRepo::list_active(&self.pool)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(SettingsRecord::try_from)
            .collect()
    }

    async fn upsert_settings(
        &self,
        target: &SettingsTarget,
        settings: &SettingsMap,
    ) -> Result<SettingsRecord, CoreError> {
        match target {
            SettingsTarget::Sku { item_sku } => {
                ItemRepo::find_by_sku(&self.pool, item_sku)
                    .await
                    .map_err(db_error)?
                    .ok_or_else(|| CoreError::not_found("Item", item_sku))?;
            }
            SettingsTarget::Category { category_id } => {
                if !CategoryRepo::exists(&self.pool, *category_id)
                    .await
                    .map_err(db_error)?
                {
                    return Err(CoreError::not_found("Category", category_id));
                }
            }
        }
        let row = CascadeSettingsRepo::upsert(&self.pool, target, settings)
            .await
            .map_err(db_error)?;
        SettingsRecord::try_from(row)
    }

    async fn deactivate_settings(&self, id: DbId) -> Result<bool, CoreError> {
        CascadeSettingsRepo::deactivate(&self.pool, id)
            .await
            .map_err(db_error)
    }
}
