//! Common test utilities for end-to-end testing with mocks.
//!
//! This module provides a test fixture that builds the full router in-process
//! with a seeded on-disk catalog and a controllable mock provider, so the HTTP
//! surface can be exercised without external services.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use findarr_core::{
    default_seed, testing::MockProvider, CatalogProvider, Config, MediaCatalog, MediaType,
    ProfileStore, ProviderKind, ProviderRegistry, RegisterOptions, SearchEngine, SearchService,
    SqliteCatalog,
};

/// Test fixture for end-to-end testing with mock dependencies.
///
/// Registers two providers:
/// - `catalog`: the seeded SQLite catalog, priority 10
/// - `tmdb`: a [`MockProvider`] of kind `metadata`, priority 20
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_search() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.get("/api/v1/search?q=dune").await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock metadata provider, shares state with the registered instance
    pub metadata: MockProvider,
    pub registry: Arc<ProviderRegistry>,
    pub catalog: Arc<dyn MediaCatalog>,
    /// Temporary directory holding the test database
    #[allow(dead_code)]
    pub temp_dir: TempDir,
}

/// Response from a test request.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    /// Raw body text, for non-JSON endpoints
    #[allow(dead_code)]
    pub text: String,
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Cache remote search results in the catalog
    pub cache_results: bool,
}

impl TestConfig {
    /// Create config with result caching enabled.
    #[allow(dead_code)]
    pub fn with_cache() -> Self {
        Self {
            cache_results: true,
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default configuration.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a new test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let mut config = Config::default();
        config.database.path = db_path.clone();
        config.search.cache_results = test_config.cache_results;

        let sqlite = SqliteCatalog::new(&db_path, 4).expect("Failed to create catalog");
        sqlite
            .seed_if_empty(&default_seed())
            .expect("Failed to seed catalog");
        let sqlite = Arc::new(sqlite);
        let catalog: Arc<dyn MediaCatalog> = sqlite.clone();
        let profiles: Arc<dyn ProfileStore> = sqlite;

        let registry = Arc::new(ProviderRegistry::new());
        registry
            .register_with(
                Box::new(CatalogProvider::new(
                    "catalog",
                    "Local Catalog",
                    Arc::clone(&catalog),
                )),
                RegisterOptions::with_priority(10),
            )
            .await
            .expect("Failed to register catalog provider");

        let metadata = MockProvider::new("tmdb")
            .with_name("TMDB")
            .with_kind(ProviderKind::Metadata)
            .with_item_year("Dune", MediaType::Book, Some("1965"))
            .with_item_year("Dune: Part Two", MediaType::Movie, Some("2024"));
        registry
            .register_with(Box::new(metadata.clone()), RegisterOptions::with_priority(20))
            .await
            .expect("Failed to register mock provider");

        let engine = Arc::new(SearchEngine::new(
            Arc::clone(&registry),
            config.search.engine_config(),
        ));
        let mut service = SearchService::new(engine);
        if test_config.cache_results {
            service = service.with_cache(Arc::clone(&catalog));
        }

        let state = Arc::new(findarr_server::state::AppState::new(
            config,
            Arc::clone(&registry),
            Arc::new(service),
            Arc::clone(&catalog),
            profiles,
        ));

        let router = findarr_server::api::create_router(state);

        Self {
            router,
            metadata,
            registry,
            catalog,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    #[allow(dead_code)]
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a PUT request with JSON body.
    #[allow(dead_code)]
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a DELETE request.
    #[allow(dead_code)]
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    #[allow(dead_code)]
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
