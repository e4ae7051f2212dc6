use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use findarr_core::{
    build_provider, config::CONFIG_PATH_ENV, default_seed, load_config, validate_config,
    CatalogProvider, Config, MediaCatalog, ProfileStore, ProviderRegistry, RegisterOptions,
    SearchEngine, SearchService, SqliteCatalog,
};
use findarr_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    // Open the catalog store
    let sqlite = SqliteCatalog::new(&config.database.path, config.catalog.pool_size)
        .context("Failed to open catalog database")?;
    let sqlite = Arc::new(sqlite);
    let catalog: Arc<dyn MediaCatalog> = sqlite.clone();
    let profiles: Arc<dyn ProfileStore> = sqlite;
    info!("Catalog initialized");

    for content_type in config.media.paths.keys() {
        if let Some(path) = config.media.path_for(content_type) {
            info!("Media path for {}: {:?}", content_type, path);
        }
    }

    if config.catalog.seed {
        let inserted = catalog
            .seed_if_empty(&default_seed())
            .context("Failed to seed catalog")?;
        if inserted > 0 {
            info!("Seeded catalog with {} sample items", inserted);
        }
    }

    let registry = Arc::new(ProviderRegistry::new());
    register_providers(&config, &registry, &catalog).await?;

    // Create search engine and service
    let engine = Arc::new(SearchEngine::new(
        Arc::clone(&registry),
        config.search.engine_config(),
    ));
    let mut service = SearchService::new(engine);
    if config.search.cache_results {
        info!("Caching remote search results in the catalog");
        service = service.with_cache(Arc::clone(&catalog));
    }

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        registry,
        Arc::new(service),
        catalog,
        profiles,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Register the catalog provider and every configured remote provider, in config order.
///
/// A remote provider that cannot be constructed is skipped with an error log.
async fn register_providers(
    config: &Config,
    registry: &ProviderRegistry,
    catalog: &Arc<dyn MediaCatalog>,
) -> Result<()> {
    if config.catalog.enabled {
        let provider = CatalogProvider::new(
            config.catalog.id.clone(),
            config.catalog.name.clone(),
            Arc::clone(catalog),
        );
        registry
            .register_with(
                Box::new(provider),
                RegisterOptions::with_priority(config.catalog.priority),
            )
            .await
            .context("Failed to register catalog provider")?;
    } else {
        info!("Catalog provider disabled in config");
    }

    for provider_config in &config.providers {
        let provider = match build_provider(provider_config) {
            Ok(provider) => provider,
            Err(e) => {
                error!(
                    "Failed to create {} provider {}: {}",
                    provider_config.type_name(),
                    provider_config.id(),
                    e
                );
                continue;
            }
        };
        registry
            .register_with(
                provider,
                RegisterOptions::with_priority(provider_config.priority()),
            )
            .await
            .with_context(|| format!("Failed to register provider {}", provider_config.id()))?;
    }

    if registry.is_empty().await {
        warn!("No providers registered; searches will return no results");
    }
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
