//! Search orchestration for the HTTP layer.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::catalog::MediaCatalog;
use crate::engine::{ProviderResults, SearchEngine, SearchRequest, SearchResults};
use crate::media::MediaResult;
use crate::provider::ProviderKind;

/// Runs federated searches and optionally caches remote results in the catalog.
pub struct SearchService {
    engine: Arc<SearchEngine>,
    cache: Option<Arc<dyn MediaCatalog>>,
}

impl SearchService {
    pub fn new(engine: Arc<SearchEngine>) -> Self {
        Self {
            engine,
            cache: None,
        }
    }

    /// Write results from non-catalog providers into `catalog` after each search.
    pub fn with_cache(mut self, catalog: Arc<dyn MediaCatalog>) -> Self {
        self.cache = Some(catalog);
        self
    }

    pub fn engine(&self) -> &Arc<SearchEngine> {
        &self.engine
    }

    pub fn caches_results(&self) -> bool {
        self.cache.is_some()
    }

    pub async fn search(&self, request: SearchRequest) -> SearchResults {
        let results = self.engine.search(&request).await;

        if let Some(catalog) = &self.cache {
            cache_results(Arc::clone(catalog), &results.provider_results).await;
        }

        results
    }
}

/// Store every result a non-catalog provider returned, including those that
/// lost a dedup or were cut by the limit. Failures are only logged.
async fn cache_results(catalog: Arc<dyn MediaCatalog>, batches: &[ProviderResults]) {
    let remote: Vec<MediaResult> = batches
        .iter()
        .filter(|batch| batch.kind != ProviderKind::Catalog)
        .flat_map(|batch| batch.results.iter().cloned())
        .collect();
    if remote.is_empty() {
        return;
    }

    let count = remote.len();
    match tokio::task::spawn_blocking(move || catalog.upsert_results(&remote)).await {
        Ok(Ok(new_items)) => {
            debug!(results = count, new = new_items, "Cached search results")
        }
        Ok(Err(e)) => warn!("Failed to cache search results: {}", e),
        Err(e) => warn!("Cache task failed: {}", e),
    }
}
