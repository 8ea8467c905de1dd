pub mod cascade_settings;
pub mod health;
pub mod items;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /items/{sku}/colors                  list, save
/// /items/{sku}/colors/{id}             delete
/// /items/{sku}/sizes                   list, save
/// /items/{sku}/sizes/{id}              delete
/// /items/{sku}/effective               effective cascade view
/// /items/{sku}/stock                   summary (GET), sync (PUT)
/// /items/{sku}/stock/ensure            reconcile matrix (POST)
/// /items/{sku}/stock/distribute        even distribution (POST)
/// /items/{sku}/templates/color         apply colour template (POST)
/// /items/{sku}/templates/size          apply size template (POST)
///
/// /cascade-settings                    list (GET), upsert (PUT)
/// /cascade-settings/{id}               deactivate (DELETE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/items/{sku}", items::router())
        .nest("/cascade-settings", cascade_settings::router())
}
