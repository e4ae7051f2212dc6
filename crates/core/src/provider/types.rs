//! Types for the provider abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::media::MediaResult;

/// Category of backend a provider talks to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Torrent indexer (Jackett, Prowlarr, ...).
    Torrent,
    /// Usenet indexer.
    Usenet,
    /// Metadata resolver (TMDB, MusicBrainz, ...).
    Metadata,
    /// The local catalog.
    Catalog,
    Custom,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Torrent => "torrent",
            ProviderKind::Usenet => "usenet",
            ProviderKind::Metadata => "metadata",
            ProviderKind::Catalog => "catalog",
            ProviderKind::Custom => "custom",
        }
    }

    /// Indexers locate downloadable sources.
    pub fn is_indexer(&self) -> bool {
        matches!(self, ProviderKind::Torrent | ProviderKind::Usenet)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "torrent" => Ok(ProviderKind::Torrent),
            "usenet" => Ok(ProviderKind::Usenet),
            "metadata" => Ok(ProviderKind::Metadata),
            "catalog" => Ok(ProviderKind::Catalog),
            "custom" => Ok(ProviderKind::Custom),
            other => Err(format!("unknown provider kind: {}", other)),
        }
    }
}

/// Errors a provider can return from a single search call.
#[derive(Debug, Clone, Error)]
pub enum ProviderFailure {
    #[error("Timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Provider is not registered: {0}")]
    NotRegistered(String),

    #[error("Provider task panicked: {0}")]
    Panicked(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProviderFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProviderFailure::Timeout(_) => FailureKind::Timeout,
            ProviderFailure::StorageUnavailable(_) => FailureKind::StorageUnavailable,
            ProviderFailure::ConnectionFailed(_) => FailureKind::ConnectionFailed,
            ProviderFailure::Api(_) => FailureKind::Api,
            ProviderFailure::Parse(_) => FailureKind::Parse,
            ProviderFailure::NotConfigured(_) => FailureKind::NotConfigured,
            ProviderFailure::NotRegistered(_) => FailureKind::NotRegistered,
            ProviderFailure::Panicked(_) => FailureKind::Panicked,
            ProviderFailure::Internal(_) => FailureKind::Internal,
        }
    }
}

/// Serializable classification of a [`ProviderFailure`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    StorageUnavailable,
    ConnectionFailed,
    Api,
    Parse,
    NotConfigured,
    NotRegistered,
    Panicked,
    Internal,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::StorageUnavailable => "storage_unavailable",
            FailureKind::ConnectionFailed => "connection_failed",
            FailureKind::Api => "api",
            FailureKind::Parse => "parse",
            FailureKind::NotConfigured => "not_configured",
            FailureKind::NotRegistered => "not_registered",
            FailureKind::Panicked => "panicked",
            FailureKind::Internal => "internal",
        }
    }
}

/// A failure attributed to one provider during a federated search.
///
/// These are returned next to the merged results so callers can report
/// partial degradation; they never fail the search itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("provider {provider_id} failed: {message}")]
pub struct ProviderError {
    pub provider_id: String,
    pub provider_name: String,
    pub kind: FailureKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(
        provider_id: impl Into<String>,
        provider_name: impl Into<String>,
        failure: &ProviderFailure,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            provider_name: provider_name.into(),
            kind: failure.kind(),
            message: failure.to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == FailureKind::Timeout
    }
}

/// A pluggable search backend.
///
/// Implementations are registered into a [`crate::registry::ProviderRegistry`]
/// and queried concurrently by the [`crate::engine::SearchEngine`].
#[async_trait]
pub trait Provider: Send + Sync {
    /// Unique identifier, used as the registry key.
    fn id(&self) -> &str;

    /// Display name.
    fn name(&self) -> &str;

    fn kind(&self) -> ProviderKind;

    /// Search this backend. An empty query is a browse request; providers
    /// that cannot browse return an empty list.
    async fn search(&self, query: &str) -> Result<Vec<MediaResult>, ProviderFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&ProviderKind::Torrent).unwrap(),
            "\"torrent\""
        );
        assert_eq!(
            serde_json::to_string(&ProviderKind::Catalog).unwrap(),
            "\"catalog\""
        );
    }

    #[test]
    fn test_provider_kind_from_str() {
        assert_eq!("Metadata".parse::<ProviderKind>(), Ok(ProviderKind::Metadata));
        assert_eq!(" usenet".parse::<ProviderKind>(), Ok(ProviderKind::Usenet));
        assert!("books".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_is_indexer() {
        assert!(ProviderKind::Torrent.is_indexer());
        assert!(ProviderKind::Usenet.is_indexer());
        assert!(!ProviderKind::Metadata.is_indexer());
        assert!(!ProviderKind::Catalog.is_indexer());
    }

    #[test]
    fn test_provider_error_from_timeout() {
        let failure = ProviderFailure::Timeout(Duration::from_millis(250));
        let error = ProviderError::new("slow", "Slow Indexer", &failure);

        assert!(error.is_timeout());
        assert_eq!(error.kind, FailureKind::Timeout);
        assert_eq!(error.message, "Timed out after 250ms");
        assert_eq!(error.to_string(), "provider slow failed: Timed out after 250ms");
    }

    #[test]
    fn test_provider_error_serialization() {
        let failure = ProviderFailure::StorageUnavailable("pool exhausted".to_string());
        let error = ProviderError::new("catalog", "Local Catalog", &failure);

        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["provider_id"], "catalog");
        assert_eq!(json["kind"], "storage_unavailable");
        assert_eq!(json["message"], "Storage unavailable: pool exhausted");
    }
}
