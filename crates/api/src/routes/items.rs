//! Routes scoped to one item, mounted at `/items/{sku}`.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{cascade, options, stock, templates};
use crate::state::AppState;

/// ```text
/// GET    /colors               -> list_colors
/// POST   /colors               -> save_color
/// DELETE /colors/{id}          -> delete_color
/// GET    /sizes                -> list_sizes
/// POST   /sizes                -> save_size
/// DELETE /sizes/{id}           -> delete_size
/// GET    /effective            -> resolve_effective
/// GET    /stock                -> summarize
/// PUT    /stock                -> sync_stock
/// POST   /stock/ensure         -> ensure_matrix
/// POST   /stock/distribute     -> distribute_evenly
/// POST   /templates/color      -> apply_color_template
/// POST   /templates/size       -> apply_size_template
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/colors",
            get(options::list_colors).post(options::save_color),
        )
        .route("/colors/{id}", delete(options::delete_color))
        .route("/sizes", get(options::list_sizes).post(options::save_size))
        .route("/sizes/{id}", delete(options::delete_size))
        .route("/effective", get(cascade::resolve_effective))
        .route("/stock", get(stock::summarize).put(stock::sync_stock))
        .route("/stock/ensure", post(stock::ensure_matrix))
        .route("/stock/distribute", post(stock::distribute_evenly))
        .route("/templates/color", post(templates::apply_color_template))
        .route("/templates/size", post(templates::apply_size_template))
}
