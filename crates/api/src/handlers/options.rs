//! Handlers for an item's colour and size options.
//!
//! Saves and deletes also reconcile the stock matrix; the response carries
//! the reconciliation report next to the option.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use stockgrid_core::options::{ColorInput, SizeInput};
use stockgrid_core::services::options::SaveOutcome;
use stockgrid_core::types::DbId;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// `201 Created` for inserts, `200 OK` for updates.
fn saved<O: Serialize>(outcome: SaveOutcome<O>) -> impl IntoResponse {
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, Json(DataResponse { data: outcome }))
}

// ---------------------------------------------------------------------------
// Colours
// ---------------------------------------------------------------------------

/// GET /api/v1/items/{sku}/colors
pub async fn list_colors(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> AppResult<impl IntoResponse> {
    let colors = state.options.list_colors(&sku).await?;
    Ok(Json(DataResponse { data: colors }))
}

/// POST /api/v1/items/{sku}/colors
///
/// Insert or update a colour. The body's `id`, or a case-insensitive name
/// match, selects the colour to update.
pub async fn save_color(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Json(input): Json<ColorInput>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.options.save_color(&sku, input).await?;
    Ok(saved(outcome))
}

/// DELETE /api/v1/items/{sku}/colors/{id}
pub async fn delete_color(
    State(state): State<AppState>,
    Path((sku, id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let matrix = state.options.delete_color(&sku, id).await?;
    Ok(Json(DataResponse { data: matrix }))
}

// ---------------------------------------------------------------------------
// Sizes
// ---------------------------------------------------------------------------

/// GET /api/v1/items/{sku}/sizes
pub async fn list_sizes(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> AppResult<impl IntoResponse> {
    let sizes = state.options.list_sizes(&sku).await?;
    Ok(Json(DataResponse { data: sizes }))
}

/// POST /api/v1/items/{sku}/sizes
pub async fn save_size(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Json(input): Json<SizeInput>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.options.save_size(&sku, input).await?;
    Ok(saved(outcome))
}

/// DELETE /api/v1/items/{sku}/sizes/{id}
pub async fn delete_size(
    State(state): State<AppState>,
    Path((sku, id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let matrix = state.options.delete_size(&sku, id).await?;
    Ok(Json(DataResponse { data: matrix }))
}
