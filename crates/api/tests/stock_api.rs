//! HTTP-level tests for the stock matrix endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_json, put_json, TestApp};
use serde_json::{json, Value};

/// Seed `TEE-1` with Red/Blue × S/M and return the option ids.
async fn two_by_two(app: &TestApp) -> (i64, i64, i64, i64) {
    app.seed_item("TEE-1", None);
    let mut ids = Vec::new();
    for (path, body) in [
        ("colors", json!({ "name": "Red", "sort_order": 0 })),
        ("colors", json!({ "name": "Blue", "sort_order": 1 })),
        ("sizes", json!({ "label": "S", "sort_order": 0 })),
        ("sizes", json!({ "label": "M", "sort_order": 1 })),
    ] {
        let json = body_json(
            post_json(app.router(), &format!("/api/v1/items/TEE-1/{path}"), body).await,
        )
        .await;
        ids.push(json["data"]["option"]["id"].as_i64().unwrap());
    }
    (ids[0], ids[1], ids[2], ids[3])
}

fn quantity_of(cells: &Value, color_id: i64, size_id: i64) -> i64 {
    cells
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["color_id"] == color_id && c["size_id"] == size_id)
        .and_then(|c| c["quantity"].as_i64())
        .unwrap()
}

#[tokio::test]
async fn test_ensure_matrix_is_idempotent() {
    let app = common::build_test_app(vec![], vec![]);
    two_by_two(&app).await;
    let writes = app.store.write_count();

    let response = post_json(app.router(), "/api/v1/items/TEE-1/stock/ensure", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["created"], 0);
    assert_eq!(json["data"]["removed"], 0);
    assert_eq!(json["data"]["cells"].as_array().unwrap().len(), 4);
    assert_eq!(app.store.write_count(), writes);
}

#[tokio::test]
async fn test_distribute_remainder_goes_to_first_cells() {
    let app = common::build_test_app(vec![], vec![]);
    let (red, blue, s, m) = two_by_two(&app).await;

    let response = post_json(
        app.router(),
        "/api/v1/items/TEE-1/stock/distribute",
        json!({ "total": 10 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["cells_updated"], 4);
    assert_eq!(json["data"]["total"], 10);

    let cells = &json["data"]["cells"];
    assert_eq!(quantity_of(cells, red, s), 3);
    assert_eq!(quantity_of(cells, red, m), 3);
    assert_eq!(quantity_of(cells, blue, s), 2);
    assert_eq!(quantity_of(cells, blue, m), 2);

    let summary = body_json(get(app.router(), "/api/v1/items/TEE-1/stock").await).await;
    assert_eq!(summary["data"]["total"], 10);
    assert_eq!(summary["data"]["by_color"][0]["name"], "Red");
    assert_eq!(summary["data"]["by_color"][0]["quantity"], 6);
    assert_eq!(summary["data"]["by_size"][1]["quantity"], 5);
}

#[tokio::test]
async fn test_negative_total_rejected() {
    let app = common::build_test_app(vec![], vec![]);
    two_by_two(&app).await;

    let response = post_json(
        app.router(),
        "/api/v1/items/TEE-1/stock/distribute",
        json!({ "total": -1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_sync_stock_writes_cells() {
    let app = common::build_test_app(vec![], vec![]);
    let (red, blue, s, m) = two_by_two(&app).await;

    let response = put_json(
        app.router(),
        "/api/v1/items/TEE-1/stock",
        json!({ "updates": [
            { "color_id": red, "size_id": m, "quantity": 7 },
            { "color_id": blue, "size_id": s, "quantity": 1 },
        ]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["cells_updated"], 2);
    assert_eq!(json["data"]["total"], 8);
    assert_eq!(quantity_of(&json["data"]["cells"], red, m), 7);
    assert_eq!(quantity_of(&json["data"]["cells"], red, s), 0);
}

#[tokio::test]
async fn test_sync_outside_matrix_rejects_whole_batch() {
    let app = common::build_test_app(vec![], vec![]);
    let (red, _, s, _) = two_by_two(&app).await;

    let response = put_json(
        app.router(),
        "/api/v1/items/TEE-1/stock",
        json!({ "updates": [
            { "color_id": red, "size_id": s, "quantity": 4 },
            { "color_id": red, "size_id": null, "quantity": 1 },
        ]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let summary = body_json(get(app.router(), "/api/v1/items/TEE-1/stock").await).await;
    assert_eq!(summary["data"]["total"], 0);
}

#[tokio::test]
async fn test_empty_sync_is_bad_request() {
    let app = common::build_test_app(vec![], vec![]);
    two_by_two(&app).await;

    let response = put_json(
        app.router(),
        "/api/v1/items/TEE-1/stock",
        json!({ "updates": [] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_summary_of_unknown_sku_is_404() {
    let app = common::build_test_app(vec![], vec![]);
    let response = get(app.router(), "/api/v1/items/GHOST/stock").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_quantity_above_cell_maximum_is_validation_error() {
    let app = common::build_test_app(vec![], vec![]);
    let (red, blue, s, _) = two_by_two(&app).await;

    let response = put_json(
        app.router(),
        "/api/v1/items/TEE-1/stock",
        json!({ "updates": [
            { "color_id": red, "size_id": s, "quantity": i64::MAX },
            { "color_id": blue, "size_id": s, "quantity": 1 },
        ]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let summary = body_json(get(app.router(), "/api/v1/items/TEE-1/stock").await).await;
    assert_eq!(summary["data"]["total"], 0);
}

#[tokio::test]
async fn test_padded_sku_in_path_is_trimmed() {
    let app = common::build_test_app(vec![], vec![]);
    two_by_two(&app).await;

    let response = post_json(
        app.router(),
        "/api/v1/items/%20TEE-1%20/stock/distribute",
        json!({ "total": 4 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["sku"], "TEE-1");

    let summary = body_json(get(app.router(), "/api/v1/items/TEE-1/stock").await).await;
    assert_eq!(summary["data"]["total"], 4);
}
