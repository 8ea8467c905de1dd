//! Stock synchronizer: keeps the colour × size matrix consistent with the
//! item's options and writes quantities into it.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::CoreError;
use crate::locks::SkuLocks;
use crate::matrix::{
    distribute_evenly, plan_reconcile, required_keys, summarize, total_quantity,
    validate_updates, CellKey, CellUpdate, ReconcileCounts, StockCell, StockSummary,
};
use crate::options::normalize_sku;
use crate::services::require_item;
use crate::store::InventoryStore;

/// Result of a matrix reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixReport {
    pub sku: String,
    pub created: usize,
    pub removed: usize,
    /// Cells after reconciliation, in distribution order.
    pub cells: Vec<StockCell>,
}

impl MatrixReport {
    pub fn writes(&self) -> usize {
        self.created + self.removed
    }
}

/// Result of a quantity write (even distribution or explicit sync).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockWriteReport {
    pub sku: String,
    pub cells_updated: usize,
    /// Sum of all cell quantities after the write.
    pub total: i64,
    pub cells: Vec<StockCell>,
}

#[derive(Clone)]
pub struct StockSynchronizer {
    store: Arc<dyn InventoryStore>,
    locks: SkuLocks,
}

impl StockSynchronizer {
    pub fn new(store: Arc<dyn InventoryStore>, locks: SkuLocks) -> Self {
        Self { store, locks }
    }

    /// Create missing cells at quantity 0 and delete orphaned ones.
    ///
    /// Calling this again without option changes performs no writes.
    pub async fn ensure_matrix(&self, sku: &str) -> Result<MatrixReport, CoreError> {
        let sku = normalize_sku(sku)?;
        let _guard = self.locks.try_acquire(&sku, "ensure_matrix")?;
        require_item(self.store.as_ref(), &sku).await?;

        let (colors, sizes, cells) = futures::try_join!(
            self.store.list_colors(&sku),
            self.store.list_sizes(&sku),
            self.store.list_cells(&sku)
        )?;
        let required = required_keys(&colors, &sizes);
        let plan = plan_reconcile(&required, &cells);

        let cells = if plan.is_empty() {
            tracing::debug!(sku = %sku, cells = cells.len(), "Matrix already consistent");
            cells
        } else {
            self.store.apply_reconcile(&sku, &plan).await?;
            tracing::info!(
                sku = %sku,
                created = plan.create.len(),
                removed = plan.remove.len(),
                "Reconciled stock matrix"
            );
            self.store.list_cells(&sku).await?
        };

        Ok(MatrixReport {
            sku,
            created: plan.create.len(),
            removed: plan.remove.len(),
            cells: order_cells(cells, &required),
        })
    }

    /// Spread `total` evenly over the matrix, remainder to the first cells
    /// in colour-then-size sort order.
    ///
    /// An empty matrix is a no-op reporting zero cells updated.
    pub async fn distribute_evenly(
        &self,
        sku: &str,
        total: i64,
    ) -> Result<StockWriteReport, CoreError> {
        let sku = normalize_sku(sku)?;
        if total < 0 {
            return Err(CoreError::Validation(format!(
                "Total quantity must not be negative (got {total})"
            )));
        }
        let _guard = self.locks.try_acquire(&sku, "distribute_evenly")?;
        require_item(self.store.as_ref(), &sku).await?;

        let required = self.required(&sku).await?;
        let quantities = distribute_evenly(&required, total)?;
        let reconciled = self.store.write_quantities(&sku, &quantities).await?;
        if quantities.is_empty() {
            tracing::debug!(sku = %sku, "No matrix to distribute over");
        } else {
            tracing::info!(
                sku = %sku,
                total,
                cells = quantities.len(),
                cells_created = reconciled.created,
                cells_removed = reconciled.removed,
                "Distributed stock evenly"
            );
        }
        self.write_report(sku, &required, quantities.len()).await
    }

    /// Apply explicit per-cell quantities. The whole batch is rejected if
    /// any update addresses a cell outside the current matrix.
    pub async fn sync_stock(
        &self,
        sku: &str,
        updates: &[CellUpdate],
    ) -> Result<StockWriteReport, CoreError> {
        let sku = normalize_sku(sku)?;
        let _guard = self.locks.try_acquire(&sku, "sync_stock")?;
        require_item(self.store.as_ref(), &sku).await?;

        let required = self.required(&sku).await?;
        let quantities = validate_updates(&required, updates)?;

        // Missing cells are created in the same call, so every validated key
        // has a row to write to.
        let reconciled = self.store.write_quantities(&sku, &quantities).await?;
        tracing::info!(
            sku = %sku,
            cells = quantities.len(),
            cells_created = reconciled.created,
            cells_removed = reconciled.removed,
            "Synced stock"
        );
        self.write_report(sku, &required, quantities.len()).await
    }

    /// Per-axis stock totals. Read only; never blocked by the SKU lock.
    pub async fn summarize(&self, sku: &str) -> Result<StockSummary, CoreError> {
        let sku = normalize_sku(sku)?;
        require_item(self.store.as_ref(), &sku).await?;
        let (colors, sizes, cells) = futures::try_join!(
            self.store.list_colors(&sku),
            self.store.list_sizes(&sku),
            self.store.list_cells(&sku)
        )?;
        Ok(summarize(&sku, &colors, &sizes, &cells))
    }

    /// Report the matrix after a store call that reconciled it.
    pub(crate) async fn matrix_report(
        &self,
        sku: &str,
        reconciled: ReconcileCounts,
    ) -> Result<MatrixReport, CoreError> {
        let required = self.required(sku).await?;
        let cells = self.store.list_cells(sku).await?;
        Ok(MatrixReport {
            sku: sku.to_string(),
            created: reconciled.created,
            removed: reconciled.removed,
            cells: order_cells(cells, &required),
        })
    }

    /// Required keys in distribution order.
    async fn required(&self, sku: &str) -> Result<Vec<CellKey>, CoreError> {
        let (colors, sizes) =
            futures::try_join!(self.store.list_colors(sku), self.store.list_sizes(sku))?;
        Ok(required_keys(&colors, &sizes))
    }

    async fn write_report(
        &self,
        sku: String,
        required: &[CellKey],
        cells_updated: usize,
    ) -> Result<StockWriteReport, CoreError> {
        let cells = order_cells(self.store.list_cells(&sku).await?, required);
        Ok(StockWriteReport {
            sku,
            cells_updated,
            total: total_quantity(&cells),
            cells,
        })
    }
}

/// Order cells by their position in `required`; unknown keys go last.
fn order_cells(mut cells: Vec<StockCell>, required: &[CellKey]) -> Vec<StockCell> {
    let position: HashMap<CellKey, usize> =
        required.iter().enumerate().map(|(i, k)| (*k, i)).collect();
    cells.sort_by_key(|c| (position.get(&c.key()).copied().unwrap_or(usize::MAX), c.id));
    cells
}
