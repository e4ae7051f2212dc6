//! Request and response types for federated search.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::media::MediaResult;
use crate::provider::{ProviderError, ProviderKind};

/// Engine-wide search settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound for one provider call.
    pub provider_timeout: Duration,
    /// Overall deadline applied when a request has none.
    pub search_deadline: Option<Duration>,
    /// Limit applied when a request has none.
    pub default_limit: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(10),
            search_deadline: None,
            default_limit: None,
        }
    }
}

/// A federated search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    /// Free-text query. Empty means browse.
    pub query: String,
    /// Only query providers of these kinds.
    pub kinds: Option<Vec<ProviderKind>>,
    /// Only query these provider IDs.
    pub providers: Option<Vec<String>>,
    /// Truncate the ranked list to this many results.
    pub limit: Option<usize>,
    /// Overall deadline for this search.
    pub deadline: Option<Duration>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = ProviderKind>) -> Self {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    pub fn with_providers<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.providers = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Outcome of a federated search.
///
/// Provider failures are reported in `errors`; a search never fails as a whole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResults {
    pub query: String,
    /// Merged, deduplicated and ranked results.
    pub results: Vec<MediaResult>,
    /// One entry per provider that failed, timed out or was not registered.
    pub errors: Vec<ProviderError>,
    /// IDs of the providers that were called, in registration order.
    pub providers_queried: Vec<String>,
    pub duration_ms: u64,
    /// Every successful provider's results before dedup and limit, in
    /// registration order. Not serialized.
    #[serde(skip)]
    pub provider_results: Vec<ProviderResults>,
}

/// Results returned by one provider, with the provider ID already stamped.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResults {
    pub provider_id: String,
    pub kind: ProviderKind,
    pub results: Vec<MediaResult>,
}

impl SearchResults {
    /// True when at least one provider failed.
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_for(&self, provider_id: &str) -> Option<&ProviderError> {
        self.errors.iter().find(|e| e.provider_id == provider_id)
    }
}
