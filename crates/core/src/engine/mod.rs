//! Federated search engine.
//!
//! Fans a query out to every selected provider concurrently, bounds each call
//! with a timeout, collects partial failures, then deduplicates and ranks the
//! combined results.

mod merge;
mod types;

pub use types::*;

use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::metrics;
use crate::provider::{ProviderError, ProviderFailure};
use crate::registry::{ProviderFilter, ProviderRegistry, Registration};

use merge::ProviderBatch;

/// Stateless fan-out search over a shared [`ProviderRegistry`].
pub struct SearchEngine {
    registry: Arc<ProviderRegistry>,
    config: EngineConfig,
}

impl SearchEngine {
    pub fn new(registry: Arc<ProviderRegistry>, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Time budget for each provider call in `request`.
    fn call_bound(&self, request: &SearchRequest) -> Duration {
        match request.deadline.or(self.config.search_deadline) {
            Some(deadline) => deadline.min(self.config.provider_timeout),
            None => self.config.provider_timeout,
        }
    }

    /// Run a federated search.
    ///
    /// Never fails: provider failures, timeouts and unknown provider IDs are
    /// reported in [`SearchResults::errors`].
    pub async fn search(&self, request: &SearchRequest) -> SearchResults {
        let start = Instant::now();
        let filter = ProviderFilter {
            kinds: request.kinds.clone(),
            ids: request.providers.clone(),
        };
        let selection = self.registry.select(&filter).await;
        let registrations = selection.registrations;

        let mut errors = unregistered_errors(&selection.missing);
        let bound = self.call_bound(request);
        let query: Arc<str> = Arc::from(request.query.as_str());

        debug!(
            query = %request.query,
            providers = registrations.len(),
            timeout_ms = bound.as_millis() as u64,
            "Starting federated search"
        );

        let handles: Vec<_> = registrations
            .iter()
            .map(|registration| {
                let provider = Arc::clone(registration.provider());
                let query = Arc::clone(&query);
                tokio::spawn(async move {
                    let started = Instant::now();
                    let outcome = match tokio::time::timeout(bound, provider.search(&query)).await
                    {
                        Ok(outcome) => outcome,
                        Err(_) => Err(ProviderFailure::Timeout(bound)),
                    };
                    (outcome, started.elapsed())
                })
            })
            .collect();

        let outcomes = join_all(handles).await;

        let mut batches = Vec::with_capacity(registrations.len());
        let mut provider_results = Vec::with_capacity(registrations.len());
        for (registration, joined) in registrations.iter().zip(outcomes) {
            let (outcome, elapsed) = match joined {
                Ok(pair) => pair,
                Err(e) if e.is_panic() => (
                    Err(ProviderFailure::Panicked(e.to_string())),
                    start.elapsed(),
                ),
                Err(e) => (Err(ProviderFailure::Internal(e.to_string())), start.elapsed()),
            };
            match self.collect(registration, outcome, elapsed) {
                Ok(batch) => {
                    let provider = registration.provider();
                    provider_results.push(ProviderResults {
                        provider_id: provider.id().to_string(),
                        kind: provider.kind(),
                        results: batch.results.clone(),
                    });
                    batches.push(batch);
                }
                Err(error) => errors.push(error),
            }
        }

        let total: usize = batches.iter().map(|b| b.results.len()).sum();
        let mut results = merge::merge(batches, &request.query);
        if let Some(limit) = request.limit.or(self.config.default_limit) {
            results.truncate(limit);
        }

        metrics::record_search(results.len());
        info!(
            query = %request.query,
            raw = total,
            merged = results.len(),
            failed = errors.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Federated search complete"
        );

        SearchResults {
            query: request.query.clone(),
            results,
            errors,
            providers_queried: registrations
                .iter()
                .map(|r| r.provider().id().to_string())
                .collect(),
            duration_ms: start.elapsed().as_millis() as u64,
            provider_results,
        }
    }

    /// Turn one provider outcome into a batch or an error entry.
    fn collect(
        &self,
        registration: &Registration,
        outcome: Result<Vec<crate::media::MediaResult>, ProviderFailure>,
        elapsed: Duration,
    ) -> Result<ProviderBatch, ProviderError> {
        let provider = registration.provider();
        let id = provider.id();

        match outcome {
            Ok(results) => {
                let before = results.len();
                let results: Vec<_> = results
                    .into_iter()
                    .filter(|r| !r.title.trim().is_empty())
                    .map(|mut r| {
                        r.provider_id = id.to_string();
                        r
                    })
                    .collect();
                if results.len() < before {
                    debug!(
                        provider = %id,
                        dropped = before - results.len(),
                        "Dropped results without a title"
                    );
                }

                metrics::record_provider_search(id, "success", elapsed.as_secs_f64());
                debug!(
                    provider = %id,
                    results = results.len(),
                    duration_ms = elapsed.as_millis() as u64,
                    "Provider search succeeded"
                );
                Ok(ProviderBatch {
                    priority: registration.priority(),
                    sequence: registration.sequence(),
                    results,
                })
            }
            Err(failure) => {
                metrics::record_provider_search(id, failure.kind().as_str(), elapsed.as_secs_f64());
                warn!(
                    provider = %id,
                    kind = failure.kind().as_str(),
                    duration_ms = elapsed.as_millis() as u64,
                    "Provider search failed: {}",
                    failure
                );
                Err(ProviderError::new(id, provider.name(), &failure))
            }
        }
    }
}

/// Errors for explicitly requested IDs that are not in the registry.
fn unregistered_errors(missing: &[String]) -> Vec<ProviderError> {
    missing
        .iter()
        .map(|id| {
            warn!(provider = %id, "Requested provider is not registered");
            ProviderError::new(
                id.as_str(),
                id.as_str(),
                &ProviderFailure::NotRegistered(id.clone()),
            )
        })
        .collect()
}
