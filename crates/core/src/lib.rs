pub mod catalog;
pub mod config;
pub mod engine;
pub mod media;
pub mod metrics;
pub mod profiles;
pub mod provider;
pub mod registry;
pub mod service;
pub mod testing;

pub use catalog::{
    default_seed, CatalogError, CatalogItem, CatalogProvider, CatalogSearchQuery, CatalogStats,
    MediaCatalog, NewCatalogItem, SqliteCatalog, UpsertOutcome,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ProviderConfig,
    SanitizedConfig,
};
pub use engine::{EngineConfig, ProviderResults, SearchEngine, SearchRequest, SearchResults};
pub use media::{MediaResult, MediaType};
pub use profiles::{NewProfile, Profile, ProfileStore};
pub use provider::{
    build_provider, FailureKind, Provider, ProviderError, ProviderFailure, ProviderKind,
};
pub use registry::{
    ProviderFilter, ProviderInfo, ProviderRegistry, RegisterOptions, RegistryError, Selection,
    DEFAULT_PRIORITY,
};
pub use service::SearchService;
