#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use stockgrid_core::cascade::OptionLink;
use stockgrid_core::memory::{MemoryStore, StaticLinks, StaticTemplates};
use stockgrid_core::options::Item;
use stockgrid_core::templates::Template;
use tower::ServiceExt;

use stockgrid_api::config::ServerConfig;
use stockgrid_api::router::build_app_router;
use stockgrid_api::state::{AppState, Backends};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        database_url: None,
        remote_api_url: None,
        remote_timeout_secs: 5,
        remote_cascade: false,
        json_logs: false,
        seed_skus: Vec::new(),
    }
}

/// An application over the in-memory store.
///
/// Each request gets a fresh router built from the same state, so writes
/// and locks are shared between requests of one test.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    state: AppState,
}

impl TestApp {
    pub fn router(&self) -> Router {
        build_app_router(self.state.clone())
    }

    pub fn seed_item(&self, sku: &str, category_id: Option<i64>) {
        self.store.add_item(Item {
            sku: sku.to_string(),
            name: format!("Item {sku}"),
            category_id,
            stock_level: 0,
        });
    }
}

/// Build the full application router with all middleware layers over a
/// fresh in-memory store and static link/template providers.
pub fn build_test_app(links: Vec<OptionLink>, templates: Vec<Template>) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let backends = Backends {
        inventory: store.clone(),
        settings_store: store.clone(),
        cascade_source: store.clone(),
        links: Arc::new(StaticLinks::new(links)),
        templates: Arc::new(StaticTemplates::new(templates)),
    };
    let state = AppState::new(test_config(), None, backends);
    TestApp { store, state }
}

pub async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri, None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
