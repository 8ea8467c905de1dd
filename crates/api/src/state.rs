use std::sync::Arc;

use stockgrid_core::locks::SkuLocks;
use stockgrid_core::services::{
    CascadeResolver, CascadeSettingsAdmin, OptionService, StockSynchronizer, TemplateApplicator,
};
use stockgrid_core::store::{
    CascadeSettingsStore, CascadeSource, InventoryStore, LinkSource, TemplateSource,
};

use crate::config::ServerConfig;

/// The store and provider implementations the services run against.
pub struct Backends {
    pub inventory: Arc<dyn InventoryStore>,
    pub settings_store: Arc<dyn CascadeSettingsStore>,
    pub cascade_source: Arc<dyn CascadeSource>,
    pub links: Arc<dyn LinkSource>,
    pub templates: Arc<dyn TemplateSource>,
}

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (every service holds its collaborators behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, absent when running on the in-memory store.
    pub pool: Option<stockgrid_db::DbPool>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    pub options: OptionService,
    pub stock: StockSynchronizer,
    pub cascade: CascadeResolver,
    pub cascade_settings: CascadeSettingsAdmin,
    pub templates: TemplateApplicator,
}

impl AppState {
    /// Wire every service to `backends`. All mutating services share one
    /// set of per-SKU locks.
    pub fn new(
        config: ServerConfig,
        pool: Option<stockgrid_db::DbPool>,
        backends: Backends,
    ) -> Self {
        let locks = SkuLocks::new();
        Self {
            pool,
            config: Arc::new(config),
            options: OptionService::new(Arc::clone(&backends.inventory), locks.clone()),
            stock: StockSynchronizer::new(Arc::clone(&backends.inventory), locks.clone()),
            cascade: CascadeResolver::new(backends.cascade_source, backends.links),
            cascade_settings: CascadeSettingsAdmin::new(backends.settings_store),
            templates: TemplateApplicator::new(backends.inventory, backends.templates, locks),
        }
    }
}
