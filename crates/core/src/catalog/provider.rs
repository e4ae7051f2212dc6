//! Exposes a catalog as a search provider.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{CatalogSearchQuery, MediaCatalog};
use crate::media::MediaResult;
use crate::provider::{Provider, ProviderFailure, ProviderKind};

/// Search provider backed by a [`MediaCatalog`].
///
/// An empty query lists the whole catalog.
pub struct CatalogProvider {
    id: String,
    name: String,
    catalog: Arc<dyn MediaCatalog>,
}

impl CatalogProvider {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        catalog: Arc<dyn MediaCatalog>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            catalog,
        }
    }

    pub fn catalog(&self) -> &Arc<dyn MediaCatalog> {
        &self.catalog
    }
}

#[async_trait]
impl Provider for CatalogProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Catalog
    }

    async fn search(&self, query: &str) -> Result<Vec<MediaResult>, ProviderFailure> {
        let catalog = Arc::clone(&self.catalog);
        let search = CatalogSearchQuery::new(query.trim());

        let items = tokio::task::spawn_blocking(move || catalog.search(&search))
            .await
            .map_err(|e| ProviderFailure::Internal(format!("catalog task failed: {}", e)))??;

        debug!(provider = %self.id, results = items.len(), "Catalog provider search");
        Ok(items
            .iter()
            .map(|item| item.to_media_result(&self.id))
            .collect())
    }
}
