use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::handlers::{ApiError, AppState, error_response};
use crate::models::{AnnotatedProfile, SearchMode};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub viewer_id: i32,
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub by: SearchMode,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub by: SearchMode,
    pub results: Vec<AnnotatedProfile>,
}

pub async fn search_profiles(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, (StatusCode, Json<ApiError>)> {
    let results = state
        .service
        .search_profiles(query.viewer_id, &query.q, query.by)
        .await
        .map_err(error_response)?;

    Ok(Json(SearchResponse {
        query: query.q.trim().to_string(),
        by: query.by,
        results,
    }))
}
