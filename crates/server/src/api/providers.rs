//! Provider registry API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use findarr_core::{ProviderInfo, RegistryError};
use serde::Serialize;

use super::handlers::{api_error, ApiError, SuccessResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProviderListResponse {
    pub providers: Vec<ProviderInfo>,
    pub total: usize,
}

fn registry_error(err: RegistryError) -> ApiError {
    let status = match &err {
        RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
        RegistryError::DuplicateProvider(_) => StatusCode::CONFLICT,
        RegistryError::InvalidId(_) => StatusCode::BAD_REQUEST,
    };
    api_error(status, err.to_string())
}

/// GET /api/v1/providers
///
/// List registered providers in registration order.
pub async fn list_providers(State(state): State<Arc<AppState>>) -> Json<ProviderListResponse> {
    let providers = state.registry().list().await;
    let total = providers.len();
    Json(ProviderListResponse { providers, total })
}

/// GET /api/v1/providers/{id}
pub async fn get_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProviderInfo>, ApiError> {
    state
        .registry()
        .registration(&id)
        .await
        .map(|registration| Json(registration.info()))
        .map_err(registry_error)
}

/// DELETE /api/v1/providers/{id}
///
/// Unregister a provider. In-flight searches that already selected it finish normally.
pub async fn remove_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .registry()
        .unregister(&id)
        .await
        .map_err(registry_error)?;

    Ok(Json(SuccessResponse {
        message: format!("Unregistered provider {}", id),
    }))
}
