use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use crate::engine::EngineConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub media: MediaConfig,
    /// Remote providers, registered in file order.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("findarr.db")
}

/// Federated search settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Upper bound for a single provider call.
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,
    /// Overall deadline for one search. 0 means only the provider timeout applies.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
    /// Result limit applied when a request does not carry one.
    #[serde(default)]
    pub default_limit: Option<usize>,
    /// Write remote results into the catalog after each search.
    #[serde(default)]
    pub cache_results: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider_timeout_ms: default_provider_timeout_ms(),
            deadline_ms: default_deadline_ms(),
            default_limit: None,
            cache_results: false,
        }
    }
}

impl SearchConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            provider_timeout: Duration::from_millis(self.provider_timeout_ms),
            search_deadline: (self.deadline_ms > 0)
                .then(|| Duration::from_millis(self.deadline_ms)),
            default_limit: self.default_limit,
        }
    }
}

fn default_provider_timeout_ms() -> u64 {
    10_000
}

fn default_deadline_ms() -> u64 {
    15_000
}

/// Local catalog settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Register the catalog as a search provider.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_catalog_id")]
    pub id: String,
    #[serde(default = "default_catalog_name")]
    pub name: String,
    #[serde(default = "default_catalog_priority")]
    pub priority: u32,
    /// Insert the built-in sample items when the catalog is empty.
    #[serde(default)]
    pub seed: bool,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            id: default_catalog_id(),
            name: default_catalog_name(),
            priority: default_catalog_priority(),
            seed: false,
            pool_size: default_pool_size(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_catalog_id() -> String {
    "catalog".to_string()
}

fn default_catalog_name() -> String {
    "Local Catalog".to_string()
}

fn default_catalog_priority() -> u32 {
    10
}

fn default_pool_size() -> u32 {
    4
}

/// Library locations per content type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaConfig {
    /// Content type (`movies`, `shows`, ...) to directory. An empty path means unset.
    #[serde(default = "default_media_paths")]
    pub paths: BTreeMap<String, PathBuf>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            paths: default_media_paths(),
        }
    }
}

impl MediaConfig {
    /// Configured directory for `content_type`, if set.
    pub fn path_for(&self, content_type: &str) -> Option<&PathBuf> {
        self.paths
            .get(content_type)
            .filter(|path| !path.as_os_str().is_empty())
    }
}

fn default_media_paths() -> BTreeMap<String, PathBuf> {
    ["movies", "shows", "books", "music"]
        .into_iter()
        .map(|content_type| (content_type.to_string(), PathBuf::new()))
        .collect()
}

/// A remote provider entry, selected by its `type` field.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    Jackett(JackettConfig),
    Tmdb(TmdbConfig),
}

impl ProviderConfig {
    pub fn id(&self) -> &str {
        match self {
            ProviderConfig::Jackett(c) => &c.id,
            ProviderConfig::Tmdb(c) => &c.id,
        }
    }

    pub fn priority(&self) -> u32 {
        match self {
            ProviderConfig::Jackett(c) => c.priority,
            ProviderConfig::Tmdb(c) => c.priority,
        }
    }

    pub fn timeout_secs(&self) -> u32 {
        match self {
            ProviderConfig::Jackett(c) => c.timeout_secs,
            ProviderConfig::Tmdb(c) => c.timeout_secs,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ProviderConfig::Jackett(_) => "jackett",
            ProviderConfig::Tmdb(_) => "tmdb",
        }
    }
}

/// Jackett indexer configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JackettConfig {
    pub id: String,
    /// Display name. Defaults to "Jackett (<indexer>)".
    #[serde(default)]
    pub name: Option<String>,
    /// Jackett server URL (e.g., "http://localhost:9117")
    pub url: String,
    /// Jackett API key
    pub api_key: String,
    /// Indexer to query, or "all" for every configured indexer.
    #[serde(default = "default_indexer")]
    pub indexer: String,
    #[serde(default = "default_provider_priority")]
    pub priority: u32,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// TMDB metadata configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    #[serde(default = "default_tmdb_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub api_key: String,
    /// Override for the API root, mainly for tests.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Response language, e.g. "en-US".
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default = "default_provider_priority")]
    pub priority: u32,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_indexer() -> String {
    "all".to_string()
}

fn default_tmdb_id() -> String {
    "tmdb".to_string()
}

fn default_provider_priority() -> u32 {
    crate::registry::DEFAULT_PRIORITY
}

fn default_timeout() -> u32 {
    30
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub search: SearchConfig,
    pub catalog: CatalogConfig,
    pub media: MediaConfig,
    pub providers: Vec<SanitizedProviderConfig>,
}

/// Provider entry with the API key hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProviderConfig {
    #[serde(rename = "type")]
    pub provider_type: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexer: Option<String>,
    pub api_key_configured: bool,
    pub priority: u32,
    pub timeout_secs: u32,
}

impl From<&ProviderConfig> for SanitizedProviderConfig {
    fn from(config: &ProviderConfig) -> Self {
        let (url, indexer, api_key) = match config {
            ProviderConfig::Jackett(j) => {
                (Some(j.url.clone()), Some(j.indexer.clone()), &j.api_key)
            }
            ProviderConfig::Tmdb(t) => (t.base_url.clone(), None, &t.api_key),
        };
        Self {
            provider_type: config.type_name().to_string(),
            id: config.id().to_string(),
            url,
            indexer,
            api_key_configured: !api_key.is_empty(),
            priority: config.priority(),
            timeout_secs: config.timeout_secs(),
        }
    }
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            search: config.search.clone(),
            catalog: config.catalog.clone(),
            media: config.media.clone(),
            providers: config.providers.iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "findarr.db");
        assert_eq!(config.search.provider_timeout_ms, 10_000);
        assert_eq!(config.search.deadline_ms, 15_000);
        assert!(!config.search.cache_results);
        assert!(config.catalog.enabled);
        assert_eq!(config.catalog.id, "catalog");
        assert_eq!(config.catalog.priority, 10);
        assert_eq!(config.catalog.pool_size, 4);
        assert_eq!(config.media.paths.len(), 4);
        assert_eq!(config.media.path_for("movies"), None);
        assert!(config.providers.is_empty());
    }

    #[test]
    fn test_deserialize_server_section() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
    }

    #[test]
    fn test_deserialize_with_custom_database_path() {
        let toml = r#"
[database]
path = "/data/my-db.sqlite"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.database.path.to_str().unwrap(), "/data/my-db.sqlite");
    }

    #[test]
    fn test_deserialize_providers() {
        let toml = r#"
[[providers]]
type = "jackett"
id = "jackett-1337x"
name = "1337x"
url = "http://localhost:9117"
api_key = "test-api-key"
indexer = "1337x"
priority = 50

[[providers]]
type = "tmdb"
api_key = "tmdb-key"
priority = 20
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.providers.len(), 2);

        match &config.providers[0] {
            ProviderConfig::Jackett(j) => {
                assert_eq!(j.id, "jackett-1337x");
                assert_eq!(j.name.as_deref(), Some("1337x"));
                assert_eq!(j.indexer, "1337x");
                assert_eq!(j.timeout_secs, 30);
            }
            other => panic!("expected jackett, got {:?}", other),
        }

        let tmdb = &config.providers[1];
        assert_eq!(tmdb.id(), "tmdb");
        assert_eq!(tmdb.priority(), 20);
        assert_eq!(tmdb.type_name(), "tmdb");
    }

    #[test]
    fn test_provider_priority_defaults() {
        let toml = r#"
[[providers]]
type = "jackett"
id = "j"
url = "http://localhost:9117"
api_key = "k"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.providers[0].priority(), 100);
    }

    #[test]
    fn test_engine_config() {
        let search = SearchConfig {
            provider_timeout_ms: 500,
            deadline_ms: 0,
            default_limit: Some(20),
            cache_results: true,
        };
        let engine = search.engine_config();
        assert_eq!(engine.provider_timeout, Duration::from_millis(500));
        assert_eq!(engine.search_deadline, None);
        assert_eq!(engine.default_limit, Some(20));
    }

    #[test]
    fn test_deadline_zero_disables_overall_deadline() {
        let config: Config = toml::from_str("[search]\ndeadline_ms = 0\n").unwrap();
        assert_eq!(config.search.engine_config().search_deadline, None);

        let config: Config = toml::from_str("[search]\ndeadline_ms = 2500\n").unwrap();
        assert_eq!(
            config.search.engine_config().search_deadline,
            Some(Duration::from_millis(2500))
        );
    }

    #[test]
    fn test_deserialize_media_paths() {
        let toml = r#"
[media.paths]
movies = "/srv/media/movies"
youtube = "/srv/media/youtube"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.media.path_for("movies"),
            Some(&PathBuf::from("/srv/media/movies"))
        );
        assert_eq!(
            config.media.path_for("youtube"),
            Some(&PathBuf::from("/srv/media/youtube"))
        );
        // An explicit table replaces the defaults
        assert_eq!(config.media.path_for("shows"), None);
        assert_eq!(config.media.paths.len(), 2);
    }

    #[test]
    fn test_sanitized_config_hides_api_keys() {
        let toml = r#"
[[providers]]
type = "jackett"
id = "jackett"
url = "http://localhost:9117"
api_key = "secret-key"

[[providers]]
type = "tmdb"
api_key = ""
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);

        assert_eq!(sanitized.server.port, 8080);
        assert_eq!(sanitized.providers.len(), 2);
        assert_eq!(sanitized.providers[0].provider_type, "jackett");
        assert!(sanitized.providers[0].api_key_configured);
        assert_eq!(
            sanitized.providers[0].url.as_deref(),
            Some("http://localhost:9117")
        );
        assert!(!sanitized.providers[1].api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret-key"));
    }
}
