//! Orchestration over the store and provider traits.
//!
//! Each service is cheap to clone and holds its collaborators behind
//! `Arc<dyn ...>`, so one instance can be shared by every request.

pub mod cascade;
pub mod options;
pub mod stock;
pub mod templates;

pub use cascade::{CascadeResolver, CascadeSettingsAdmin};
pub use options::OptionService;
pub use stock::StockSynchronizer;
pub use templates::TemplateApplicator;

use crate::error::CoreError;
use crate::options::Item;
use crate::store::InventoryStore;

/// Load the item for `sku` or fail with `NotFound`.
pub(crate) async fn require_item(store: &dyn InventoryStore, sku: &str) -> Result<Item, CoreError> {
    store
        .find_item(sku)
        .await?
        .ok_or_else(|| CoreError::not_found("Item", sku))
}
