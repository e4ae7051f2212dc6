//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Federated searches (count, merged result sizes)
//! - Individual provider calls (outcome, latency)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Search Engine
// =============================================================================

/// Federated searches executed.
pub static SEARCHES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("findarr_searches_total", "Total federated searches executed").unwrap()
});

/// Merged result count per search.
pub static SEARCH_RESULTS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "findarr_search_results",
            "Number of merged results returned per search",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Providers
// =============================================================================

/// Provider calls by outcome.
pub static PROVIDER_SEARCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "findarr_provider_searches_total",
            "Total provider search calls",
        ),
        &["provider", "outcome"], // outcome: "success" or a failure kind
    )
    .unwrap()
});

/// Provider call latency in seconds.
pub static PROVIDER_SEARCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "findarr_provider_search_duration_seconds",
            "Duration of individual provider searches",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["provider"],
    )
    .unwrap()
});

/// Record one provider call.
pub fn record_provider_search(provider: &str, outcome: &str, duration_secs: f64) {
    PROVIDER_SEARCHES
        .with_label_values(&[provider, outcome])
        .inc();
    PROVIDER_SEARCH_DURATION
        .with_label_values(&[provider])
        .observe(duration_secs);
}

/// Record one completed federated search.
pub fn record_search(result_count: usize) {
    SEARCHES_TOTAL.inc();
    SEARCH_RESULTS
        .with_label_values(&[])
        .observe(result_count as f64);
}

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SEARCHES_TOTAL.clone()),
        Box::new(SEARCH_RESULTS.clone()),
        Box::new(PROVIDER_SEARCHES.clone()),
        Box::new(PROVIDER_SEARCH_DURATION.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_provider_search() {
        let before = PROVIDER_SEARCHES
            .with_label_values(&["metrics-test", "success"])
            .get();
        record_provider_search("metrics-test", "success", 0.02);
        let after = PROVIDER_SEARCHES
            .with_label_values(&["metrics-test", "success"])
            .get();
        assert_eq!(after, before + 1);
    }

    #[test]
    fn test_all_metrics_register_cleanly() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
    }
}
