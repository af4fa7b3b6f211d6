//! Catalog home page

use axum::{extract::State, Json};

use crate::{services::stats::CatalogSummary, AppState};

/// Record counts of the whole catalog.
///
/// Always answers 200: a failed count is reported through `error`.
#[utoipa::path(
    get,
    path = "/catalog",
    tag = "catalog",
    responses(
        (status = 200, description = "Catalog summary", body = CatalogSummary)
    )
)]
pub async fn index(State(state): State<AppState>) -> Json<CatalogSummary> {
    Json(state.services.stats.summary().await)
}
