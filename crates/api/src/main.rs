use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use stockgrid_core::memory::{MemoryStore, StaticLinks, StaticTemplates};
use stockgrid_core::options::Item;
use stockgrid_core::store::{CascadeSettingsStore, CascadeSource, InventoryStore};
use stockgrid_remote::{RemoteCascadeSource, RemoteClient, RemoteLinkSource, RemoteTemplateSource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockgrid_api::config::ServerConfig;
use stockgrid_api::router::build_app_router;
use stockgrid_api::state::{AppState, Backends};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let json_logs = config.json_logs;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockgrid_api=debug,tower_http=debug".into()),
        )
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .init();

    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Local store ---
    let (pool, local) = match &config.database_url {
        Some(database_url) => {
            let pool = stockgrid_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            stockgrid_db::health_check(&pool)
                .await
                .expect("Database health check failed");

            stockgrid_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            let store = Arc::new(stockgrid_db::PgInventoryStore::new(pool.clone()));
            (Some(pool), LocalStore::from(store))
        }
        None => {
            let store = Arc::new(MemoryStore::new());
            for sku in &config.seed_skus {
                store.add_item(Item {
                    sku: sku.clone(),
                    name: sku.clone(),
                    category_id: None,
                    stock_level: 0,
                });
            }
            tracing::warn!(
                seeded = config.seed_skus.len(),
                "DATABASE_URL not set, using the in-memory store"
            );
            (None, LocalStore::from(store))
        }
    };

    // --- Remote providers ---
    let backends = match &config.remote_api_url {
        Some(base_url) => {
            let client = RemoteClient::new(
                base_url.as_str(),
                Duration::from_secs(config.remote_timeout_secs),
            )
            .expect("Failed to build remote API client");
            tracing::info!(base_url = %client.base_url(), remote_cascade = config.remote_cascade, "Remote API configured");

            let cascade_source: Arc<dyn CascadeSource> = if config.remote_cascade {
                Arc::new(RemoteCascadeSource::new(client.clone()))
            } else {
                local.cascade_source
            };
            Backends {
                inventory: local.inventory,
                settings_store: local.settings_store,
                cascade_source,
                links: Arc::new(RemoteLinkSource::new(client.clone())),
                templates: Arc::new(RemoteTemplateSource::new(client)),
            }
        }
        None => {
            if config.remote_cascade {
                tracing::warn!("REMOTE_CASCADE ignored without REMOTE_API_URL");
            }
            tracing::warn!("REMOTE_API_URL not set, option links and templates are empty");
            Backends {
                inventory: local.inventory,
                settings_store: local.settings_store,
                cascade_source: local.cascade_source,
                links: Arc::new(StaticLinks::default()),
                templates: Arc::new(StaticTemplates::default()),
            }
        }
    };

    // --- App state and router ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let state = AppState::new(config, pool.clone(), backends);
    let app = build_app_router(state);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    if let Some(pool) = pool {
        if tokio::time::timeout(shutdown_timeout, pool.close())
            .await
            .is_err()
        {
            tracing::warn!("Timed out closing database pool");
        }
    }

    tracing::info!("Graceful shutdown complete");
}

/// The three local seams, all served by one concrete store.
struct LocalStore {
    inventory: Arc<dyn InventoryStore>,
    settings_store: Arc<dyn CascadeSettingsStore>,
    cascade_source: Arc<dyn CascadeSource>,
}

impl<S> From<Arc<S>> for LocalStore
where
    S: InventoryStore + CascadeSettingsStore + CascadeSource + 'static,
{
    fn from(store: Arc<S>) -> Self {
        Self {
            inventory: store.clone(),
            settings_store: store.clone(),
            cascade_source: store,
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
