use axum::{
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{catalog, handlers, middleware::metrics_middleware, profiles, providers, search};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Federated search
        .route("/search", get(search::search_get).post(search::search_post))
        // Provider registry
        .route("/providers", get(providers::list_providers))
        .route(
            "/providers/{id}",
            get(providers::get_provider).delete(providers::remove_provider),
        )
        // Local catalog
        .route(
            "/catalog",
            get(catalog::list_catalog).post(catalog::upsert_item),
        )
        .route("/catalog/stats", get(catalog::get_stats))
        .route(
            "/catalog/{id}",
            get(catalog::get_item).delete(catalog::remove_item),
        )
        // Content profiles
        .route(
            "/profiles",
            get(profiles::list_profiles).post(profiles::create_profile),
        )
        .route(
            "/profiles/{id}",
            get(profiles::get_profile)
                .put(profiles::update_profile)
                .delete(profiles::delete_profile),
        );

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
