//! Profile API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use findarr_core::{CatalogError, NewProfile, Profile, ProfileStore};
use serde::Serialize;

use super::catalog::catalog_error;
use super::handlers::{api_error, ApiError, SuccessResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileListResponse {
    pub profiles: Vec<Profile>,
    pub total: usize,
}

/// Run a blocking profile store operation off the async executor.
async fn with_profiles<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&dyn ProfileStore) -> Result<T, CatalogError> + Send + 'static,
{
    let profiles = state.profiles();
    tokio::task::spawn_blocking(move || op(profiles.as_ref()))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(catalog_error)
}

/// GET /api/v1/profiles
pub async fn list_profiles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProfileListResponse>, ApiError> {
    let profiles = with_profiles(&state, |store| store.list_profiles()).await?;
    let total = profiles.len();
    Ok(Json(ProfileListResponse { profiles, total }))
}

/// POST /api/v1/profiles
pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    Json(profile): Json<NewProfile>,
) -> Result<(StatusCode, Json<Profile>), ApiError> {
    profile.validate().map_err(catalog_error)?;
    let created = with_profiles(&state, move |store| store.create_profile(&profile)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/profiles/{id}
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Profile>, ApiError> {
    with_profiles(&state, move |store| store.get_profile(id)).await.map(Json)
}

/// PUT /api/v1/profiles/{id}
///
/// Replace every field of a profile.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(profile): Json<NewProfile>,
) -> Result<Json<Profile>, ApiError> {
    profile.validate().map_err(catalog_error)?;
    with_profiles(&state, move |store| store.update_profile(id, &profile))
        .await
        .map(Json)
}

/// DELETE /api/v1/profiles/{id}
pub async fn delete_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    with_profiles(&state, move |store| store.delete_profile(id)).await?;
    Ok(Json(SuccessResponse {
        message: format!("Deleted profile {}", id),
    }))
}
