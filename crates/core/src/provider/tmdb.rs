//! TMDB (The Movie Database) metadata provider.
//!
//! TMDB requires an API key for access.
//! Rate limits are generous (around 40 requests per second).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::TmdbConfig;
use crate::media::{MediaResult, MediaType};

use super::{Provider, ProviderFailure, ProviderKind};

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Metadata resolver for movies and TV shows.
pub struct TmdbProvider {
    client: Client,
    id: String,
    name: String,
    base_url: String,
    api_key: String,
    language: Option<String>,
    timeout: Duration,
}

impl TmdbProvider {
    pub fn new(config: TmdbConfig) -> Result<Self, ProviderFailure> {
        if config.api_key.is_empty() {
            return Err(ProviderFailure::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let timeout = Duration::from_secs(config.timeout_secs as u64);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderFailure::NotConfigured(e.to_string()))?;

        Ok(Self {
            client,
            name: config.name.unwrap_or_else(|| "TMDB".to_string()),
            id: config.id,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: config.api_key,
            language: config.language,
            timeout,
        })
    }

    fn convert(&self, results: Vec<TmdbMultiResult>) -> Vec<MediaResult> {
        let items: Vec<_> = results
            .into_iter()
            .filter_map(|r| {
                let media_type = match r.media_type.as_str() {
                    "movie" => MediaType::Movie,
                    "tv" => MediaType::Show,
                    _ => return None,
                };
                let title = r.title.clone().or_else(|| r.name.clone())?;
                let title = title.trim().to_string();
                if title.is_empty() {
                    return None;
                }
                Some((media_type, title, r))
            })
            .collect();

        // TMDB returns results by relevance; expose that order as a score in (0, 1].
        let total = items.len() as f64;
        items
            .into_iter()
            .enumerate()
            .map(|(position, (media_type, title, r))| {
                let source_id = format!("{}:{}", r.media_type, r.id);
                let mut result = MediaResult::new(&self.id, source_id, title, media_type)
                    .with_score(1.0 - position as f64 / total)
                    .with_metadata("tmdb_id", r.id);

                let date = r.release_date.or(r.first_air_date);
                if let Some(year) = date.as_deref().and_then(year_from_date) {
                    result = result.with_year(year);
                }
                if let Some(original) = r.original_title.or(r.original_name) {
                    result = result.with_metadata("original_title", original);
                }
                if let Some(overview) = r.overview.filter(|o| !o.is_empty()) {
                    result = result.with_metadata("overview", overview);
                }
                if let Some(poster) = r.poster_path {
                    result = result.with_metadata("poster_path", poster);
                }
                if let Some(vote) = r.vote_average {
                    result = result.with_metadata("vote_average", vote);
                }
                result
            })
            .collect()
    }
}

#[async_trait]
impl Provider for TmdbProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Metadata
    }

    async fn search(&self, query: &str) -> Result<Vec<MediaResult>, ProviderFailure> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/search/multi", self.base_url.trim_end_matches('/'));
        debug!("TMDB multi search: query='{}'", query);

        let mut request = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("query", query)]);
        if let Some(language) = &self.language {
            request = request.query(&[("language", language.as_str())]);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderFailure::Timeout(self.timeout)
            } else if e.is_connect() {
                ProviderFailure::ConnectionFailed(e.to_string())
            } else {
                ProviderFailure::Api(e.to_string())
            }
        })?;

        let status = response.status();
        if status == 401 {
            return Err(ProviderFailure::NotConfigured(
                "Invalid TMDB API key".to_string(),
            ));
        }
        if status == 429 {
            return Err(ProviderFailure::Api("Rate limit exceeded".to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderFailure::Api(format!("HTTP {}: {}", status, body)));
        }

        let search_result: TmdbSearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderFailure::Parse(format!("TMDB multi search: {}", e)))?;

        Ok(self.convert(search_result.results))
    }
}

/// "2010-07-15" -> "2010"
fn year_from_date(date: &str) -> Option<String> {
    let year = date.split('-').next()?.trim();
    (year.len() == 4 && year.chars().all(|c| c.is_ascii_digit())).then(|| year.to_string())
}

// TMDB API response types

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    results: Vec<TmdbMultiResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbMultiResult {
    id: u64,
    #[serde(default)]
    media_type: String,
    title: Option<String>,
    name: Option<String>,
    original_title: Option<String>,
    original_name: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f64>,
}
