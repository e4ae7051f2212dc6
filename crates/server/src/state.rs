use std::sync::Arc;
use findarr_core::{
    Config, MediaCatalog, ProfileStore, ProviderRegistry, SanitizedConfig, SearchService,
};

/// Shared application state
pub struct AppState {
    config: Config,
    registry: Arc<ProviderRegistry>,
    service: Arc<SearchService>,
    catalog: Arc<dyn MediaCatalog>,
    profiles: Arc<dyn ProfileStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        registry: Arc<ProviderRegistry>,
        service: Arc<SearchService>,
        catalog: Arc<dyn MediaCatalog>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            config,
            registry,
            service,
            catalog,
            profiles,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn search_service(&self) -> &SearchService {
        self.service.as_ref()
    }

    /// The catalog store backing the catalog endpoints.
    pub fn catalog(&self) -> Arc<dyn MediaCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn profiles(&self) -> Arc<dyn ProfileStore> {
        Arc::clone(&self.profiles)
    }
}
