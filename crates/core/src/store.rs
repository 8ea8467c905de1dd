//! Persistence and provider seams.
//!
//! The services in [`crate::services`] talk to the outside world only
//! through these traits. `stockgrid-db` implements the local ones over
//! PostgreSQL, `stockgrid-remote` implements the remote ones over HTTP, and
//! [`crate::memory`] provides in-process versions of all of them.

use async_trait::async_trait;

use crate::cascade::{OptionLink, ScopedSettings, SettingsMap, SettingsRecord, SettingsTarget};
use crate::error::CoreError;
use crate::matrix::{CellQuantity, ReconcileCounts, ReconcilePlan, StockCell};
use crate::options::{ColorOption, Item, OptionAxis, OptionDraft, SizeOption};
use crate::templates::{AxisPlan, AxisPlanOutcome, Template};
use crate::types::DbId;

/// Local inventory persistence: items, options and stock cells.
///
/// Every method is a single atomic unit: on error nothing it would have
/// written is visible.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn find_item(&self, sku: &str) -> Result<Option<Item>, CoreError>;

    /// Colours for `sku`, in any order. Unknown SKUs yield an empty list.
    async fn list_colors(&self, sku: &str) -> Result<Vec<ColorOption>, CoreError>;

    /// Sizes for `sku`, in any order. Unknown SKUs yield an empty list.
    async fn list_sizes(&self, sku: &str) -> Result<Vec<SizeOption>, CoreError>;

    /// Insert (`id == None`) or update a colour, then reconcile the matrix
    /// against the resulting options.
    async fn save_color(
        &self,
        sku: &str,
        id: Option<DbId>,
        draft: &OptionDraft,
    ) -> Result<(ColorOption, ReconcileCounts), CoreError>;

    /// Insert (`id == None`) or update a size, then reconcile the matrix
    /// against the resulting options.
    async fn save_size(
        &self,
        sku: &str,
        id: Option<DbId>,
        draft: &OptionDraft,
    ) -> Result<(SizeOption, ReconcileCounts), CoreError>;

    /// Delete an option together with every cell referencing it, then
    /// reconcile the matrix against the remaining options.
    ///
    /// Returns `None` if the option did not exist.
    async fn delete_option(
        &self,
        sku: &str,
        axis: OptionAxis,
        id: DbId,
    ) -> Result<Option<ReconcileCounts>, CoreError>;

    async fn list_cells(&self, sku: &str) -> Result<Vec<StockCell>, CoreError>;

    /// Create and delete cells as planned.
    async fn apply_reconcile(&self, sku: &str, plan: &ReconcilePlan) -> Result<(), CoreError>;

    /// Reconcile the matrix against the current options, write quantities
    /// and refresh the item's stock rollup. Fails without writing anything
    /// if an addressed cell is not part of the reconciled matrix.
    async fn write_quantities(
        &self,
        sku: &str,
        quantities: &[CellQuantity],
    ) -> Result<ReconcileCounts, CoreError>;

    /// Apply a template plan to one axis and reconcile the matrix against
    /// the resulting options.
    async fn apply_axis_plan(
        &self,
        sku: &str,
        axis: OptionAxis,
        plan: &AxisPlan,
    ) -> Result<AxisPlanOutcome, CoreError>;
}

/// Source of the scoped (SKU + category) cascade settings for one SKU.
///
/// Returns `NotFound` when the SKU does not exist.
#[async_trait]
pub trait CascadeSource: Send + Sync {
    async fn scoped_settings(&self, sku: &str) -> Result<ScopedSettings, CoreError>;
}

/// Administration of stored cascade settings records.
#[async_trait]
pub trait CascadeSettingsStore: Send + Sync {
    /// All active records.
    async fn list_settings(&self) -> Result<Vec<SettingsRecord>, CoreError>;

    /// Insert or replace the active record for `target`. The SKU or
    /// category must exist.
    async fn upsert_settings(
        &self,
        target: &SettingsTarget,
        settings: &SettingsMap,
    ) -> Result<SettingsRecord, CoreError>;

    /// Deactivate a record. Returns `false` if no active record had `id`.
    async fn deactivate_settings(&self, id: DbId) -> Result<bool, CoreError>;
}

/// Source of the explicit and inherited option links for one SKU.
#[async_trait]
pub trait LinkSource: Send + Sync {
    async fn effective_links(&self, sku: &str) -> Result<Vec<OptionLink>, CoreError>;
}

/// Source of colour and size templates.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// `Ok(None)` when no template with that id exists for the axis.
    async fn fetch_template(
        &self,
        template_id: &str,
        axis: OptionAxis,
    ) -> Result<Option<Template>, CoreError>;
}
