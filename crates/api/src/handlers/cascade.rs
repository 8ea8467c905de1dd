//! Handlers for the effective cascade view and stored cascade settings.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use stockgrid_core::cascade::{SettingsMap, SettingsTarget};
use stockgrid_core::types::DbId;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/items/{sku}/effective
///
/// Merged settings plus effective option links. A view missing one of its
/// two sources is still `200 OK`, with `degraded: true` and `error` set.
pub async fn resolve_effective(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> AppResult<impl IntoResponse> {
    let view = state.cascade.resolve_effective(&sku).await?;
    Ok(Json(DataResponse { data: view }))
}

/// Body for `PUT /cascade-settings`.
///
/// ```json
/// { "applies_to_type": "sku", "item_sku": "TEE-1", "settings": { "cascade_order": ["size"] } }
/// { "applies_to_type": "category", "category_id": 4, "settings": {} }
/// ```
#[derive(Debug, Deserialize)]
pub struct UpsertCascadeSettings {
    #[serde(flatten)]
    pub target: SettingsTarget,
    #[serde(default)]
    pub settings: SettingsMap,
}

/// GET /api/v1/cascade-settings
pub async fn list_settings(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let records = state.cascade_settings.list().await?;
    Ok(Json(DataResponse { data: records }))
}

/// PUT /api/v1/cascade-settings
///
/// Replace the active record for one scope, creating it if needed.
pub async fn upsert_settings(
    State(state): State<AppState>,
    Json(input): Json<UpsertCascadeSettings>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .cascade_settings
        .upsert(input.target, input.settings)
        .await?;
    Ok(Json(DataResponse { data: record }))
}

/// DELETE /api/v1/cascade-settings/{id}
pub async fn deactivate_settings(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.cascade_settings.deactivate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
