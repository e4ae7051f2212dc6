//! Jackett indexer provider.
//!
//! Queries a single Jackett indexer (or the `all` aggregate) through the
//! JSON results API and maps each release onto a [`MediaResult`].

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::JackettConfig;
use crate::media::{MediaResult, MediaType};

use super::{Provider, ProviderFailure, ProviderKind};

/// Torrent indexer backed by a Jackett server.
pub struct JackettProvider {
    client: Client,
    config: JackettConfig,
    name: String,
    timeout: Duration,
}

impl JackettProvider {
    pub fn new(config: JackettConfig) -> Result<Self, ProviderFailure> {
        if config.url.trim().is_empty() {
            return Err(ProviderFailure::NotConfigured(
                "Jackett URL is required".to_string(),
            ));
        }

        let timeout = Duration::from_secs(config.timeout_secs as u64);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderFailure::NotConfigured(e.to_string()))?;

        let name = config
            .name
            .clone()
            .unwrap_or_else(|| format!("Jackett ({})", config.indexer));

        Ok(Self {
            client,
            config,
            name,
            timeout,
        })
    }

    /// Build the Jackett API URL for a search.
    fn build_search_url(&self, query: &str) -> String {
        format!(
            "{}/api/v2.0/indexers/{}/results?apikey={}&Query={}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(&self.config.indexer),
            urlencoding::encode(&self.config.api_key),
            urlencoding::encode(query)
        )
    }

    fn to_media_result(&self, r: JackettResult) -> Option<MediaResult> {
        let title = r.Title.trim().to_string();
        if title.is_empty() {
            return None;
        }

        let source_id = r
            .InfoHash
            .as_ref()
            .map(|h| h.to_lowercase())
            .or_else(|| r.Guid.clone())
            .or_else(|| r.Details.clone())
            .or_else(|| r.Link.clone())
            .unwrap_or_else(|| title.clone());

        let media_type = r
            .CategoryDesc
            .as_deref()
            .map(category_to_media_type)
            .unwrap_or(MediaType::Other);

        let mut result = MediaResult::new(&self.config.id, source_id, &title, media_type);
        if let Some(year) = extract_year(&title) {
            result = result.with_year(year.to_string());
        }

        let seeders = r.Seeders.unwrap_or(0).max(0);
        let leechers = r.Peers.unwrap_or(0).saturating_sub(seeders).max(0);
        result = result
            .with_metadata("size_bytes", r.Size.unwrap_or(0).max(0))
            .with_metadata("seeders", seeders)
            .with_metadata("leechers", leechers);

        if let Some(tracker) = r.Tracker {
            result = result.with_metadata("indexer", tracker);
        }
        if let Some(magnet) = r.MagnetUri {
            result = result.with_metadata("magnet_uri", magnet);
        }
        if let Some(link) = r.Link {
            result = result.with_metadata("torrent_url", link);
        }
        if let Some(details) = r.Details {
            result = result.with_metadata("details_url", details);
        }
        if let Some(category) = r.CategoryDesc {
            result = result.with_metadata("category", category);
        }
        if let Some(date) = r.PublishDate.as_deref().and_then(parse_jackett_date) {
            result = result.with_metadata("publish_date", date.to_rfc3339());
        }

        Some(result)
    }
}

#[async_trait]
impl Provider for JackettProvider {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Torrent
    }

    async fn search(&self, query: &str) -> Result<Vec<MediaResult>, ProviderFailure> {
        // Jackett has no browse mode
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let url = self.build_search_url(query);
        debug!(provider = %self.config.id, indexer = %self.config.indexer, "Searching Jackett");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderFailure::Timeout(self.timeout)
            } else if e.is_connect() {
                ProviderFailure::ConnectionFailed(e.to_string())
            } else {
                ProviderFailure::Api(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderFailure::Api(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let jackett_response: JackettResponse = response
            .json()
            .await
            .map_err(|e| ProviderFailure::Parse(e.to_string()))?;

        debug!(
            provider = %self.config.id,
            results = jackett_response.Results.len(),
            "Jackett search complete"
        );

        Ok(jackett_response
            .Results
            .into_iter()
            .filter_map(|r| self.to_media_result(r))
            .collect())
    }
}

/// Map a Jackett category description ("Movies/HD", "TV/WEB-DL", ...) to a media type.
fn category_to_media_type(category: &str) -> MediaType {
    let top = category.split('/').next().unwrap_or(category).trim();
    match top.to_lowercase().as_str() {
        "movies" => MediaType::Movie,
        "tv" => MediaType::Show,
        "audio" => MediaType::Music,
        "books" => MediaType::Book,
        _ => MediaType::Other,
    }
}

/// Pull a plausible release year out of a release title.
///
/// The last standalone four digit number between 1900 and next year wins, so
/// "Blade Runner 2049 (2017)" yields 2017.
fn extract_year(title: &str) -> Option<i32> {
    let max_year = Utc::now().year() + 1;
    title
        .split(|c: char| !c.is_ascii_digit())
        .filter(|token| token.len() == 4)
        .filter_map(|token| token.parse::<i32>().ok())
        .filter(|year| (1900..=max_year).contains(year))
        .last()
}

/// Parse Jackett's date format.
fn parse_jackett_date(date_str: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}

// Jackett API response types
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResponse {
    Results: Vec<JackettResult>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResult {
    Title: String,
    Guid: Option<String>,
    Tracker: Option<String>,
    MagnetUri: Option<String>,
    Link: Option<String>,
    InfoHash: Option<String>,
    Size: Option<i64>,
    Seeders: Option<i64>,
    Peers: Option<i64>,
    CategoryDesc: Option<String>,
    PublishDate: Option<String>,
    Details: Option<String>,
}
