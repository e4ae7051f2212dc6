//! Federated search API handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use findarr_core::{ProviderKind, SearchRequest, SearchResults};
use serde::Deserialize;
use tracing::debug;

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Request types
// ============================================================================

/// Query string for `GET /search`. List fields are comma separated.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub kinds: Option<String>,
    #[serde(default)]
    pub providers: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

/// JSON body for `POST /search`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchBody {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub kinds: Option<Vec<ProviderKind>>,
    #[serde(default)]
    pub providers: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

impl SearchParams {
    fn into_body(self) -> Result<SearchBody, ApiError> {
        let kinds = split_list(self.kinds.as_deref())
            .map(|names| {
                names
                    .iter()
                    .map(|name| name.parse::<ProviderKind>())
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;

        Ok(SearchBody {
            query: self.q.unwrap_or_default(),
            kinds,
            providers: split_list(self.providers.as_deref()),
            limit: self.limit,
            deadline_ms: self.deadline_ms,
        })
    }
}

impl TryFrom<SearchBody> for SearchRequest {
    type Error = ApiError;

    fn try_from(body: SearchBody) -> Result<Self, Self::Error> {
        let mut request = SearchRequest::new(body.query);
        if let Some(kinds) = body.kinds {
            request = request.with_kinds(kinds);
        }
        if let Some(providers) = body.providers {
            request = request.with_providers(providers);
        }
        if let Some(limit) = body.limit {
            request = request.with_limit(limit);
        }
        match body.deadline_ms {
            Some(0) => {
                return Err(api_error(
                    StatusCode::BAD_REQUEST,
                    "deadline_ms must be greater than 0",
                ))
            }
            Some(ms) => request = request.with_deadline(Duration::from_millis(ms)),
            None => {}
        }
        Ok(request)
    }
}

/// Split a comma separated list, dropping blank entries. None when nothing remains.
fn split_list(value: Option<&str>) -> Option<Vec<String>> {
    let items: Vec<String> = value?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    (!items.is_empty()).then_some(items)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/search?q=&kinds=&providers=&limit=&deadline_ms=
pub async fn search_get(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResults>, ApiError> {
    let request = SearchRequest::try_from(params.into_body()?)?;
    Ok(run_search(&state, request).await)
}

/// POST /api/v1/search
///
/// Provider failures do not change the status code; they are listed in `errors`.
pub async fn search_post(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SearchBody>,
) -> Result<Json<SearchResults>, ApiError> {
    let request = SearchRequest::try_from(body)?;
    Ok(run_search(&state, request).await)
}

async fn run_search(state: &AppState, request: SearchRequest) -> Json<SearchResults> {
    debug!(query = %request.query, "Search requested");
    Json(state.search_service().search(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(Some("a, b,,c ")),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(split_list(Some(" , ")), None);
        assert_eq!(split_list(None), None);
    }

    #[test]
    fn test_params_parse_kinds() {
        let params = SearchParams {
            q: Some("dune".to_string()),
            kinds: Some("metadata,Catalog".to_string()),
            ..Default::default()
        };
        let body = params.into_body().unwrap();
        assert_eq!(body.query, "dune");
        assert_eq!(
            body.kinds,
            Some(vec![ProviderKind::Metadata, ProviderKind::Catalog])
        );
    }

    #[test]
    fn test_params_reject_unknown_kind() {
        let params = SearchParams {
            kinds: Some("movie".to_string()),
            ..Default::default()
        };
        let (status, _) = params.into_body().unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_zero_deadline_rejected() {
        let body = SearchBody {
            deadline_ms: Some(0),
            ..Default::default()
        };
        let (status, _) = SearchRequest::try_from(body).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_body_into_request() {
        let body = SearchBody {
            query: "dune".to_string(),
            providers: Some(vec!["tmdb".to_string()]),
            limit: Some(5),
            deadline_ms: Some(250),
            ..Default::default()
        };
        let request = SearchRequest::try_from(body).unwrap();
        assert_eq!(request.query, "dune");
        assert_eq!(request.providers, Some(vec!["tmdb".to_string()]));
        assert_eq!(request.limit, Some(5));
        assert_eq!(request.deadline, Some(Duration::from_millis(250)));
    }
}
