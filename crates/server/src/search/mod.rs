//! Route search: analyze → locate → (AI) → fetch + match with fallback.

use shared::{
    FallbackStage, ResolvedLocation, Route, SearchRequest, SearchResponse, SearchStrategy,
    ShapeFeatures, ShapeSummary,
};

use crate::{ai, geocode, streets, AppState};
use route_matcher::{FallbackStrategy, MatchError, SearchContext};

/// Analyze off the async runtime; rejects unusable drawings before any fetch
pub async fn analyze(state: &AppState, drawing: shared::Drawing) -> Result<ShapeFeatures, MatchError> {
    let matcher = state.matcher.clone();
    tokio::task::spawn_blocking(move || matcher.analyze_shape(&drawing))
        .await
        .map_err(join_error)?
}

fn join_error(err: tokio::task::JoinError) -> MatchError {
    tracing::error!(error = %err, "shape analysis task failed");
    MatchError::Internal("shape analysis did not complete".to_string())
}

async fn locate(state: &AppState, request: &SearchRequest) -> Result<ResolvedLocation, MatchError> {
    match request.center {
        Some(center) if center.is_finite() => Ok(geocode::explicit_location(
            &request.location,
            center,
            state.config.matcher.collector.radius_km,
        )),
        // without a center there is nothing to search around, so a geocoder
        // outage is returned to the caller instead of entering the fallback chain
        _ => geocode::resolve_location(state, &request.location).await,
    }
}

pub async fn search(state: &AppState, request: SearchRequest) -> Result<SearchResponse, MatchError> {
    let search_id = uuid::Uuid::new_v4().to_string();
    let features = analyze(state, request.drawing.clone()).await?;
    let shape = features.summary();
    let location = locate(state, &request).await?;
    tracing::info!(
        %search_id,
        class = %shape.class,
        location = %location.display_name,
        mode = request.mode.label(),
        "route search"
    );

    if request.strategy == SearchStrategy::Ai {
        if let Some(routes) = ai_routes(state, &shape, &location, &request).await {
            return Ok(SearchResponse {
                search_id,
                location,
                stage: FallbackStage::Ai,
                shape,
                routes,
            });
        }
    }

    let ctx = SearchContext {
        features: &features,
        center: location.center,
        mode: request.mode,
        profile: request.creativity,
    };
    let outcome = FallbackStrategy::new(&state.matcher)
        .run(&ctx, |query| streets::fetch_geometries(state, query))
        .await;
    tracing::info!(%search_id, stage = ?outcome.stage, routes = outcome.routes.len(), "search finished");

    Ok(SearchResponse {
        search_id,
        location,
        stage: outcome.stage,
        shape,
        routes: outcome.routes,
    })
}

/// AI routes, or `None` when the geometric pipeline should take over
async fn ai_routes(
    state: &AppState,
    shape: &ShapeSummary,
    location: &ResolvedLocation,
    request: &SearchRequest,
) -> Option<Vec<Route>> {
    if state.config.ai_api_key.is_none() {
        tracing::info!("no AI key configured, using geometric matching");
        return None;
    }
    match ai::generate_routes(state, shape, location, request.mode).await {
        Ok(routes) if !routes.is_empty() => Some(routes),
        Ok(_) => {
            tracing::warn!("AI returned no routes, using geometric matching");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "AI route generation failed, using geometric matching");
            None
        }
    }
}
