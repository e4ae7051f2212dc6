//! Canonical result model shared by every provider.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Kind of media a result describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Movie,
    Show,
    Book,
    Music,
    Other,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Show => "show",
            MediaType::Book => "book",
            MediaType::Music => "music",
            MediaType::Other => "other",
        }
    }

    /// Lenient parse used for stored rows and indexer categories.
    /// Anything unrecognised becomes `Other`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "movie" | "movies" | "film" => MediaType::Movie,
            "show" | "shows" | "tv" | "series" => MediaType::Show,
            "book" | "books" | "ebook" | "audiobook" => MediaType::Book,
            "music" | "audio" | "album" => MediaType::Music,
            _ => MediaType::Other,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized key used to group the same item reported by several providers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    title: String,
    media_type: MediaType,
}

/// One media item found by a provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaResult {
    /// Display title. Never empty.
    pub title: String,
    pub media_type: MediaType,
    /// Free-form year as reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    /// Identifier within the owning provider's namespace.
    pub source_id: String,
    /// Provider that produced this result.
    pub provider_id: String,
    /// Provider-supplied relevance, higher is better.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Provider-specific extension fields.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl MediaResult {
    pub fn new(
        provider_id: impl Into<String>,
        source_id: impl Into<String>,
        title: impl Into<String>,
        media_type: MediaType,
    ) -> Self {
        Self {
            title: title.into(),
            media_type,
            year: None,
            source_id: source_id.into(),
            provider_id: provider_id.into(),
            score: None,
            metadata: Map::new(),
        }
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Lowercased, trimmed title paired with the media type.
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            title: self.title.trim().to_lowercase(),
            media_type: self.media_type,
        }
    }

    /// The year as a number, if the provider gave something parseable.
    pub fn year_number(&self) -> Option<i64> {
        self.year.as_deref()?.trim().parse().ok()
    }

    /// Whether the title contains `query`, ignoring case. An empty query matches everything.
    pub fn title_matches(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty() || self.title.to_lowercase().contains(&query.to_lowercase())
    }
}
