//! Catalog API handlers.
//!
//! Catalog calls block on SQLite, so each handler runs its work on the blocking pool.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use findarr_core::{
    CatalogError, CatalogItem, CatalogSearchQuery, CatalogStats, MediaCatalog, NewCatalogItem,
    UpsertOutcome,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::handlers::{api_error, ApiError, SuccessResponse};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CatalogQueryParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    100
}

#[derive(Debug, Serialize)]
pub struct CatalogListResponse {
    pub items: Vec<CatalogItem>,
    pub total: usize,
}

// ============================================================================
// Helpers
// ============================================================================

pub(super) fn catalog_error(err: CatalogError) -> ApiError {
    let status = match &err {
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::Invalid(_) => StatusCode::BAD_REQUEST,
        CatalogError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        CatalogError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!("Catalog request failed: {}", err);
    }
    api_error(status, err.to_string())
}

/// Run a blocking catalog operation off the async executor.
async fn with_catalog<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&dyn MediaCatalog) -> Result<T, CatalogError> + Send + 'static,
{
    let catalog = state.catalog();
    tokio::task::spawn_blocking(move || op(catalog.as_ref()))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(catalog_error)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/catalog
///
/// Search or list catalog items.
pub async fn list_catalog(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CatalogQueryParams>,
) -> Result<Json<CatalogListResponse>, ApiError> {
    let query = CatalogSearchQuery {
        query: params.q.unwrap_or_default(),
        limit: Some(params.limit),
    };

    let items = with_catalog(&state, move |catalog| catalog.search(&query)).await?;
    let total = items.len();
    Ok(Json(CatalogListResponse { items, total }))
}

/// POST /api/v1/catalog
///
/// Insert an item, or refresh an existing one with the same origin.
pub async fn upsert_item(
    State(state): State<Arc<AppState>>,
    Json(item): Json<NewCatalogItem>,
) -> Result<(StatusCode, Json<UpsertOutcome>), ApiError> {
    item.validate().map_err(catalog_error)?;

    let title = item.title.clone();
    let outcome = with_catalog(&state, move |catalog| catalog.upsert(&item)).await?;
    info!(id = outcome.id, created = outcome.created, "Upserted catalog item {:?}", title);

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome)))
}

/// GET /api/v1/catalog/stats
///
/// Get catalog statistics.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CatalogStats>, ApiError> {
    with_catalog(&state, |catalog| catalog.stats()).await.map(Json)
}

/// GET /api/v1/catalog/{id}
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<CatalogItem>, ApiError> {
    with_catalog(&state, move |catalog| catalog.get(id)).await.map(Json)
}

/// DELETE /api/v1/catalog/{id}
///
/// Remove an item from the catalog.
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    with_catalog(&state, move |catalog| catalog.remove(id)).await?;
    Ok(Json(SuccessResponse {
        message: format!("Removed {} from catalog", id),
    }))
}
