use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::search;
use crate::AppState;
use route_matcher::MatcherConfig;
use shared::{AnalyzeRequest, AnalyzeResponse, SearchRequest, SearchResponse};

/// Health check
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Drawing → shape features
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let features = search::analyze(&state, request.drawing).await?;
    let summary = features.summary();
    Ok(Json(AnalyzeResponse { features, summary }))
}

/// Drawing + place → ranked routes
pub async fn search_routes(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let response = search::search(&state, request).await?;
    Ok(Json(response))
}

/// Effective matcher configuration
pub async fn matcher_config(State(state): State<AppState>) -> Json<MatcherConfig> {
    Json(state.matcher.config().clone())
}
