//! Mock provider for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::media::{MediaResult, MediaType};
use crate::provider::{Provider, ProviderFailure, ProviderKind};

/// Mock implementation of the Provider trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable results, filtered by title substring
/// - Track queries for assertions
/// - Simulate failures and slow responses
///
/// Clones share state, so a test can keep a handle after boxing one copy into
/// a registry.
///
/// # Example
///
/// ```rust,ignore
/// use findarr_core::testing::MockProvider;
///
/// let mock = MockProvider::new("indexer")
///     .with_item("Dune", MediaType::Book)
///     .with_delay(Duration::from_millis(50));
/// registry.register(Box::new(mock.clone())).await?;
///
/// engine.search(&SearchRequest::new("dune")).await;
/// assert_eq!(mock.recorded_queries().await, vec!["dune"]);
/// ```
#[derive(Clone)]
pub struct MockProvider {
    id: String,
    name: String,
    kind: ProviderKind,
    /// Whether results are filtered by the query before being returned.
    filter_by_query: bool,
    results: Arc<RwLock<Vec<MediaResult>>>,
    delay: Arc<RwLock<Option<Duration>>>,
    failure: Arc<RwLock<Option<ProviderFailure>>>,
    queries: Arc<RwLock<Vec<String>>>,
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("results", &"<results>")
            .finish()
    }
}

impl MockProvider {
    /// Create a mock provider of kind `custom` with no results.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: format!("Mock {}", id),
            id,
            kind: ProviderKind::Custom,
            filter_by_query: true,
            results: Arc::new(RwLock::new(Vec::new())),
            delay: Arc::new(RwLock::new(None)),
            failure: Arc::new(RwLock::new(None)),
            queries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_kind(mut self, kind: ProviderKind) -> Self {
        self.kind = kind;
        self
    }

    /// Results returned for matching queries. Their `provider_id` is
    /// overwritten with this provider's ID.
    pub fn with_results(mut self, results: Vec<MediaResult>) -> Self {
        self.results = Arc::new(RwLock::new(results));
        self
    }

    /// Add a result with the given title; its source ID is its position.
    pub fn with_item(self, title: &str, media_type: MediaType) -> Self {
        self.with_item_year(title, media_type, None)
    }

    pub fn with_item_year(self, title: &str, media_type: MediaType, year: Option<&str>) -> Self {
        let mut results = self
            .results
            .try_read()
            .map(|r| r.clone())
            .unwrap_or_default();
        let mut item = MediaResult::new(&self.id, results.len().to_string(), title, media_type);
        if let Some(year) = year {
            item = item.with_year(year);
        }
        results.push(item);
        Self {
            results: Arc::new(RwLock::new(results)),
            ..self
        }
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Arc::new(RwLock::new(Some(delay)));
        self
    }

    /// Fail every search with `failure`.
    pub fn with_failure(mut self, failure: ProviderFailure) -> Self {
        self.failure = Arc::new(RwLock::new(Some(failure)));
        self
    }

    /// Return every configured result regardless of the query.
    pub fn without_query_filter(mut self) -> Self {
        self.filter_by_query = false;
        self
    }

    /// Replace the configured results.
    pub async fn set_results(&self, results: Vec<MediaResult>) {
        *self.results.write().await = results;
    }

    pub async fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write().await = delay;
    }

    pub async fn set_failure(&self, failure: Option<ProviderFailure>) {
        *self.failure.write().await = failure;
    }

    /// Queries received so far, in call order.
    pub async fn recorded_queries(&self) -> Vec<String> {
        self.queries.read().await.clone()
    }

    pub async fn search_count(&self) -> usize {
        self.queries.read().await.len()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn search(&self, query: &str) -> Result<Vec<MediaResult>, ProviderFailure> {
        self.queries.write().await.push(query.to_string());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(failure) = self.failure.read().await.clone() {
            return Err(failure);
        }

        let results = self.results.read().await;
        Ok(results
            .iter()
            .filter(|r| !self.filter_by_query || r.title_matches(query))
            .cloned()
            .map(|mut r| {
                r.provider_id = self.id.clone();
                r
            })
            .collect())
    }
}
