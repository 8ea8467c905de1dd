//! Option manager: colour and size CRUD for one item.
//!
//! Every save or delete runs under the SKU lock and commits the option change
//! and the matrix reconciliation in one store call, so cells never lag
//! behind the options.

use std::sync::Arc;

use serde::Serialize;

use crate::error::CoreError;
use crate::locks::SkuLocks;
use crate::options::{
    normalize_sku, resolve_upsert, sort_options, ColorInput, ColorOption, OptionAxis, SizeInput,
    SizeOption, UpsertTarget,
};
use crate::services::require_item;
use crate::services::stock::{MatrixReport, StockSynchronizer};
use crate::store::InventoryStore;
use crate::types::DbId;

/// A saved option plus the matrix reconciliation it triggered.
#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome<O> {
    pub option: O,
    pub created: bool,
    pub matrix: MatrixReport,
}

#[derive(Clone)]
pub struct OptionService {
    store: Arc<dyn InventoryStore>,
    locks: SkuLocks,
    stock: StockSynchronizer,
}

impl OptionService {
    pub fn new(store: Arc<dyn InventoryStore>, locks: SkuLocks) -> Self {
        let stock = StockSynchronizer::new(Arc::clone(&store), locks.clone());
        Self {
            store,
            locks,
            stock,
        }
    }

    /// Colours in sort order. An unknown SKU yields an empty list.
    pub async fn list_colors(&self, sku: &str) -> Result<Vec<ColorOption>, CoreError> {
        let sku = normalize_sku(sku)?;
        let mut colors = self.store.list_colors(&sku).await?;
        sort_options(&mut colors);
        Ok(colors)
    }

    /// Sizes in sort order. An unknown SKU yields an empty list.
    pub async fn list_sizes(&self, sku: &str) -> Result<Vec<SizeOption>, CoreError> {
        let sku = normalize_sku(sku)?;
        let mut sizes = self.store.list_sizes(&sku).await?;
        sort_options(&mut sizes);
        Ok(sizes)
    }

    pub async fn save_color(
        &self,
        sku: &str,
        input: ColorInput,
    ) -> Result<SaveOutcome<ColorOption>, CoreError> {
        let sku = normalize_sku(sku)?;
        let id = input.id;
        let draft = input.into_draft()?;
        let _guard = self.locks.try_acquire(&sku, "save_color")?;
        require_item(self.store.as_ref(), &sku).await?;

        let existing = self.store.list_colors(&sku).await?;
        let target = resolve_upsert(OptionAxis::Color, &existing, id, &draft.name)?;
        let (option, reconciled) = self.store.save_color(&sku, target.id(), &draft).await?;
        let matrix = self.stock.matrix_report(&sku, reconciled).await?;

        tracing::info!(
            sku = %sku,
            color_id = option.id,
            name = %option.name,
            cells_created = reconciled.created,
            cells_removed = reconciled.removed,
            "Saved colour"
        );
        Ok(SaveOutcome {
            option,
            created: target == UpsertTarget::Insert,
            matrix,
        })
    }

    pub async fn save_size(
        &self,
        sku: &str,
        input: SizeInput,
    ) -> Result<SaveOutcome<SizeOption>, CoreError> {
        let sku = normalize_sku(sku)?;
        let id = input.id;
        let draft = input.into_draft()?;
        let _guard = self.locks.try_acquire(&sku, "save_size")?;
        require_item(self.store.as_ref(), &sku).await?;

        let existing = self.store.list_sizes(&sku).await?;
        let target = resolve_upsert(OptionAxis::Size, &existing, id, &draft.name)?;
        let (option, reconciled) = self.store.save_size(&sku, target.id(), &draft).await?;
        let matrix = self.stock.matrix_report(&sku, reconciled).await?;

        tracing::info!(
            sku = %sku,
            size_id = option.id,
            label = %option.label,
            cells_created = reconciled.created,
            cells_removed = reconciled.removed,
            "Saved size"
        );
        Ok(SaveOutcome {
            option,
            created: target == UpsertTarget::Insert,
            matrix,
        })
    }

    pub async fn delete_color(&self, sku: &str, id: DbId) -> Result<MatrixReport, CoreError> {
        self.delete(sku, OptionAxis::Color, id).await
    }

    pub async fn delete_size(&self, sku: &str, id: DbId) -> Result<MatrixReport, CoreError> {
        self.delete(sku, OptionAxis::Size, id).await
    }

    async fn delete(&self, sku: &str, axis: OptionAxis, id: DbId) -> Result<MatrixReport, CoreError> {
        let sku = normalize_sku(sku)?;
        let _guard = self.locks.try_acquire(&sku, "delete_option")?;
        require_item(self.store.as_ref(), &sku).await?;

        let reconciled = self
            .store
            .delete_option(&sku, axis, id)
            .await?
            .ok_or_else(|| CoreError::not_found(axis.entity(), id))?;
        let matrix = self.stock.matrix_report(&sku, reconciled).await?;
        tracing::info!(sku = %sku, axis = %axis, id, "Deleted option");
        Ok(matrix)
    }
}
