//! Handlers for the stock matrix of an item.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use stockgrid_core::matrix::CellUpdate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `POST /items/{sku}/stock/distribute`.
#[derive(Debug, Deserialize)]
pub struct DistributeRequest {
    pub total: i64,
}

/// Body for `PUT /items/{sku}/stock`.
#[derive(Debug, Deserialize)]
pub struct SyncStockRequest {
    pub updates: Vec<CellUpdate>,
}

/// POST /api/v1/items/{sku}/stock/ensure
///
/// Create missing cells at quantity 0 and drop orphaned ones.
pub async fn ensure_matrix(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> AppResult<impl IntoResponse> {
    let report = state.stock.ensure_matrix(&sku).await?;
    Ok(Json(DataResponse { data: report }))
}

/// POST /api/v1/items/{sku}/stock/distribute
pub async fn distribute_evenly(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Json(input): Json<DistributeRequest>,
) -> AppResult<impl IntoResponse> {
    let report = state.stock.distribute_evenly(&sku, input.total).await?;
    Ok(Json(DataResponse { data: report }))
}

/// PUT /api/v1/items/{sku}/stock
///
/// Write explicit per-cell quantities. All or nothing.
pub async fn sync_stock(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Json(input): Json<SyncStockRequest>,
) -> AppResult<impl IntoResponse> {
    if input.updates.is_empty() {
        return Err(AppError::BadRequest("updates must not be empty".into()));
    }
    let report = state.stock.sync_stock(&sku, &input.updates).await?;
    Ok(Json(DataResponse { data: report }))
}

/// GET /api/v1/items/{sku}/stock
pub async fn summarize(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> AppResult<impl IntoResponse> {
    let summary = state.stock.summarize(&sku).await?;
    Ok(Json(DataResponse { data: summary }))
}
