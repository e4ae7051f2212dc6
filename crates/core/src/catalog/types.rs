//! Types for the local media catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::media::{MediaResult, MediaType};
use crate::provider::ProviderFailure;

/// A stored catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    /// Row ID.
    pub id: i64,
    pub title: String,
    pub media_type: MediaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    /// Provider the item was cached from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_provider: Option<String>,
    /// Source ID within `origin_provider`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    /// When first stored.
    pub first_seen_at: DateTime<Utc>,
    /// When last stored or refreshed.
    pub last_seen_at: DateTime<Utc>,
    /// Number of times this item was upserted.
    pub seen_count: u32,
}

impl CatalogItem {
    /// Present this entry as a search result of the catalog provider `provider_id`.
    pub fn to_media_result(&self, provider_id: &str) -> MediaResult {
        let mut result =
            MediaResult::new(provider_id, self.id.to_string(), &self.title, self.media_type);
        result.year = self.year.clone();
        result.metadata = self.metadata.clone();
        if let Some(origin) = &self.origin_provider {
            result = result.with_metadata("origin_provider", origin.as_str());
        }
        if let Some(source_id) = &self.origin_source_id {
            result = result.with_metadata("origin_source_id", source_id.as_str());
        }
        result
    }
}

/// An item to insert or refresh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCatalogItem {
    pub title: String,
    pub media_type: MediaType,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub origin_provider: Option<String>,
    #[serde(default)]
    pub origin_source_id: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl NewCatalogItem {
    pub fn new(title: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            title: title.into(),
            media_type,
            year: None,
            origin_provider: None,
            origin_source_id: None,
            metadata: Map::new(),
        }
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn with_origin(
        mut self,
        provider: impl Into<String>,
        source_id: impl Into<String>,
    ) -> Self {
        self.origin_provider = Some(provider.into());
        self.origin_source_id = Some(source_id.into());
        self
    }

    /// Cache entry for a search result, keyed by its provider and source ID.
    pub fn from_result(result: &MediaResult) -> Self {
        Self {
            title: result.title.clone(),
            media_type: result.media_type,
            year: result.year.clone(),
            origin_provider: Some(result.provider_id.clone()),
            origin_source_id: Some(result.source_id.clone()),
            metadata: result.metadata.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.title.trim().is_empty() {
            return Err(CatalogError::Invalid("title cannot be empty".to_string()));
        }
        if self.origin_provider.is_some() != self.origin_source_id.is_some() {
            return Err(CatalogError::Invalid(
                "origin_provider and origin_source_id must be set together".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of an upsert.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub id: i64,
    /// False when an existing row with the same origin was refreshed.
    pub created: bool,
}

/// Query for searching the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSearchQuery {
    /// Case-insensitive title substring. Empty matches everything.
    #[serde(default)]
    pub query: String,
    /// Maximum results. None returns every match.
    #[serde(default)]
    pub limit: Option<u32>,
}

impl CatalogSearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: None,
        }
    }
}

/// Catalog statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogStats {
    pub total_items: u64,
    /// Item count per media type.
    pub by_media_type: BTreeMap<String, u64>,
    /// Items cached from a provider (as opposed to added directly).
    pub cached_items: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_entry: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_entry: Option<DateTime<Utc>>,
}

/// Errors for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The database could not be opened or no connection was available in time.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid item: {0}")]
    Invalid(String),
}

impl From<CatalogError> for ProviderFailure {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::StorageUnavailable(msg) => ProviderFailure::StorageUnavailable(msg),
            other => ProviderFailure::Internal(other.to_string()),
        }
    }
}
