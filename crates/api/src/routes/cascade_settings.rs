//! Cascade settings administration, mounted at `/cascade-settings`.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::cascade;
use crate::state::AppState;

/// ```text
/// GET    /                  -> list_settings
/// PUT    /                  -> upsert_settings
/// DELETE /{id}              -> deactivate_settings
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(cascade::list_settings).put(cascade::upsert_settings),
        )
        .route("/{id}", delete(cascade::deactivate_settings))
}
