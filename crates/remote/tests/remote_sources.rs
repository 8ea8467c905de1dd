//! Remote providers against a throwaway local HTTP server.

use std::net::SocketAddr;
use std::time::Duration;

use assert_matches::assert_matches;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use stockgrid_core::cascade::{LinkScope, OptionType, KEY_CASCADE_ORDER};
use stockgrid_core::error::CoreError;
use stockgrid_core::options::OptionAxis;
use stockgrid_core::store::{CascadeSource, LinkSource, TemplateSource};
use stockgrid_remote::{
    RemoteCascadeSource, RemoteClient, RemoteError, RemoteLinkSource, RemoteTemplateSource,
};

type Params = Query<std::collections::HashMap<String, String>>;

async fn links(Query(params): Params) -> impl IntoResponse {
    match params.get("item_sku").map(String::as_str) {
        Some("SKU-1") => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "links": [
                    { "option_type": "size_template", "option_id": 4, "option_label": "Adult",
                      "applies_to_type": "category", "category_id": 9 },
                    { "option_type": "size_template", "option_id": 4, "option_label": "Adult",
                      "applies_to_type": "sku", "category_id": null, "item_sku": "SKU-1" },
                ]}
            })),
        ),
        Some("DOWN") => (
            StatusCode::OK,
            Json(json!({ "success": false, "error": "link store offline" })),
        ),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "error": "Item SKU not found" })),
        ),
    }
}

async fn cascade(Query(params): Params) -> Json<Value> {
    let body = match params.get("item_sku").map(String::as_str) {
        Some("SKU-1") => json!({
            "success": true,
            "data": { "source": "category", "category_id": 9,
                      "settings": { "cascade_order": ["size", "color"] } }
        }),
        Some("SKU-2") => json!({ "success": true, "data": { "source": "default",
                                 "settings": {} } }),
        _ => json!({ "success": false, "message": "" }),
    };
    Json(body)
}

async fn template(Query(params): Params) -> impl IntoResponse {
    match params.get("template_id").map(String::as_str) {
        Some("basic") => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "template": {
                    "id": "basic", "name": "Basic sizes", "axis": params["axis"],
                    "options": [ { "name": "S" }, { "name": "M", "sort_order": 5 } ]
                }}
            })),
        ),
        Some("empty") => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": { "template": null } })),
        ),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "success": false }))),
    }
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>")
}

async fn spawn_server() -> SocketAddr {
    let app = Router::new()
        .route("/api/effective-links", get(links))
        .route("/api/effective-cascade", get(cascade))
        .route("/api/template", get(template))
        .route("/api/broken", get(broken));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn client() -> RemoteClient {
    let addr = spawn_server().await;
    RemoteClient::new(format!("http://{addr}/api/"), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn links_are_mapped_by_scope() {
    let source = RemoteLinkSource::new(client().await);
    let links = source.effective_links("SKU-1").await.unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].option_ref.option_type, OptionType::SizeTemplate);
    assert_eq!(links[0].scope, LinkScope::Inherited);
    assert_eq!(links[0].category_id, Some(9));
    assert_eq!(links[1].scope, LinkScope::Explicit);
    assert_eq!(links[1].label.as_deref(), Some("Adult"));
}

#[tokio::test]
async fn link_failure_envelope_is_upstream() {
    let source = RemoteLinkSource::new(client().await);
    assert_matches!(
        source.effective_links("DOWN").await,
        Err(CoreError::Upstream(msg)) if msg == "link store offline"
    );
}

#[tokio::test]
async fn link_404_is_item_not_found() {
    let source = RemoteLinkSource::new(client().await);
    assert_matches!(
        source.effective_links("GHOST").await,
        Err(CoreError::NotFound { entity: "Item", id }) if id == "GHOST"
    );
}

#[tokio::test]
async fn cascade_scopes() {
    let source = RemoteCascadeSource::new(client().await);

    let scoped = source.scoped_settings("SKU-1").await.unwrap();
    assert!(scoped.explicit.is_none());
    let (category_id, settings) = scoped.category.unwrap();
    assert_eq!(category_id, 9);
    assert_eq!(settings[KEY_CASCADE_ORDER], json!(["size", "color"]));

    let defaults = source.scoped_settings("SKU-2").await.unwrap();
    assert!(defaults.explicit.is_none() && defaults.category.is_none());
}

#[tokio::test]
async fn empty_failure_message_is_preserved() {
    let source = RemoteCascadeSource::new(client().await);
    assert_matches!(
        source.scoped_settings("OTHER").await,
        Err(CoreError::Upstream(msg)) if msg.is_empty()
    );
}

#[tokio::test]
async fn templates() {
    let source = RemoteTemplateSource::new(client().await);
    let template = source
        .fetch_template("basic", OptionAxis::Size)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(template.axis, OptionAxis::Size);
    assert_eq!(template.options.len(), 2);
    assert_eq!(template.options[1].sort_order, Some(5));

    assert!(source
        .fetch_template("empty", OptionAxis::Color)
        .await
        .unwrap()
        .is_none());
    assert!(source
        .fetch_template("missing", OptionAxis::Color)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn non_envelope_error_body() {
    let client = client().await;
    let result = client.get::<Value>("broken", &[]).await;
    assert_matches!(result, Err(RemoteError::Status { status: 502, .. }));
}

#[tokio::test]
async fn unreachable_host_is_upstream() {
    // Bind and drop to get a port nobody listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = RemoteClient::new(format!("http://{addr}"), Duration::from_secs(2)).unwrap();
    let source = RemoteLinkSource::new(client);
    assert_matches!(
        source.effective_links("SKU-1").await,
        Err(CoreError::Upstream(_))
    );
}
