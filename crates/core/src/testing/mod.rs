//! Testing utilities and mock implementations.
//!
//! Mocks for the provider and catalog traits so the engine, the search
//! service and the HTTP layer can be exercised without real backends.
//!
//! # Example
//!
//! ```rust,ignore
//! use findarr_core::testing::{fixtures, MockProvider};
//!
//! let registry = Arc::new(ProviderRegistry::new());
//! registry
//!     .register(Box::new(MockProvider::new("indexer").with_item("Dune", MediaType::Book)))
//!     .await?;
//! registry.register(Box::new(fixtures::seeded_catalog_provider("catalog")?)).await?;
//! ```

mod mock_provider;
mod unavailable_catalog;

pub use mock_provider::MockProvider;
pub use unavailable_catalog::UnavailableCatalog;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::Arc;

    use crate::catalog::{default_seed, CatalogError, CatalogProvider, MediaCatalog, SqliteCatalog};
    use crate::media::{MediaResult, MediaType};

    /// A result with the given title, type and year.
    pub fn media(
        provider_id: &str,
        source_id: &str,
        title: &str,
        media_type: MediaType,
        year: &str,
    ) -> MediaResult {
        MediaResult::new(provider_id, source_id, title, media_type).with_year(year)
    }

    /// In-memory catalog holding the default sample items.
    pub fn seeded_catalog() -> Result<Arc<SqliteCatalog>, CatalogError> {
        let catalog = SqliteCatalog::in_memory()?;
        catalog.seed_if_empty(&default_seed())?;
        Ok(Arc::new(catalog))
    }

    /// Catalog provider over [`seeded_catalog`].
    pub fn seeded_catalog_provider(id: &str) -> Result<CatalogProvider, CatalogError> {
        let catalog: Arc<dyn MediaCatalog> = seeded_catalog()?;
        Ok(CatalogProvider::new(id, "Local Catalog", catalog))
    }
}
