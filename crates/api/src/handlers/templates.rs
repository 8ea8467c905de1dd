//! Handlers for applying option templates to an item.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ApplyTemplateRequest {
    pub template_id: String,
}

/// POST /api/v1/items/{sku}/templates/color
///
/// Replace the item's colours with the template's, then reconcile the
/// matrix. Fails with 409 while another mutation on the SKU is running.
pub async fn apply_color_template(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Json(input): Json<ApplyTemplateRequest>,
) -> AppResult<impl IntoResponse> {
    let applied = state
        .templates
        .apply_color_template(&sku, &input.template_id)
        .await?;
    Ok(Json(DataResponse { data: applied }))
}

/// POST /api/v1/items/{sku}/templates/size
pub async fn apply_size_template(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Json(input): Json<ApplyTemplateRequest>,
) -> AppResult<impl IntoResponse> {
    let applied = state
        .templates
        .apply_size_template(&sku, &input.template_id)
        .await?;
    Ok(Json(DataResponse { data: applied }))
}
