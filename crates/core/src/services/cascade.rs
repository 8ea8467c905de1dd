//! Cascade resolver and settings administration.

use std::sync::Arc;

use crate::cascade::{
    normalize_settings, settle, EffectiveView, SettingsMap, SettingsRecord, SettingsTarget,
};
use crate::error::CoreError;
use crate::options::normalize_sku;
use crate::store::{CascadeSettingsStore, CascadeSource, LinkSource};
use crate::types::DbId;

/// Builds the effective cascade view for a SKU from the settings source
/// and the link source, fetched concurrently.
#[derive(Clone)]
pub struct CascadeResolver {
    settings: Arc<dyn CascadeSource>,
    links: Arc<dyn LinkSource>,
}

impl CascadeResolver {
    pub fn new(settings: Arc<dyn CascadeSource>, links: Arc<dyn LinkSource>) -> Self {
        Self { settings, links }
    }

    pub async fn resolve_effective(&self, sku: &str) -> Result<EffectiveView, CoreError> {
        let sku = normalize_sku(sku)?;
        let (settings, links) = futures::join!(
            self.settings.scoped_settings(&sku),
            self.links.effective_links(&sku)
        );
        let view = settle(&sku, settings, links)?;

        if view.degraded {
            tracing::warn!(
                sku = %sku,
                error = view.error.as_deref().unwrap_or_default(),
                "Serving degraded cascade view"
            );
        } else {
            tracing::debug!(sku = %sku, links = view.links.len(), "Resolved cascade view");
        }
        Ok(view)
    }
}

/// CRUD over stored cascade settings records.
#[derive(Clone)]
pub struct CascadeSettingsAdmin {
    store: Arc<dyn CascadeSettingsStore>,
}

impl CascadeSettingsAdmin {
    pub fn new(store: Arc<dyn CascadeSettingsStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<SettingsRecord>, CoreError> {
        self.store.list_settings().await
    }

    /// Validate and store settings for one scope, replacing any active
    /// record for that scope.
    pub async fn upsert(
        &self,
        target: SettingsTarget,
        settings: SettingsMap,
    ) -> Result<SettingsRecord, CoreError> {
        let target = match target {
            SettingsTarget::Sku { item_sku } => SettingsTarget::Sku {
                item_sku: normalize_sku(&item_sku)?,
            },
            category @ SettingsTarget::Category { .. } => category,
        };
        let settings = normalize_settings(settings)?;
        let record = self.store.upsert_settings(&target, &settings).await?;
        tracing::info!(record_id = record.id, target = ?record.target, "Saved cascade settings");
        Ok(record)
    }

    /// Deactivate a record.
    pub async fn deactivate(&self, id: DbId) -> Result<(), CoreError> {
        if !self.store.deactivate_settings(id).await? {
            return Err(CoreError::not_found("CascadeSettings", id));
        }
        tracing::info!(record_id = id, "Deactivated cascade settings");
        Ok(())
    }
}
