use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use route_matcher::RouteMatcher;

mod ai;
mod config;
mod error;
mod geocode;
mod routes;
mod search;
mod streets;

use config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub matcher: Arc<RouteMatcher>,
    pub http: reqwest::Client,
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/analyze", post(routes::analyze))
        .route("/api/routes/search", post(routes::search_routes))
        .route("/api/config", get(routes::matcher_config))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,route_matcher=info".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let matcher = RouteMatcher::new(config.matcher.clone())?;
    if config.ai_api_key.is_none() {
        tracing::info!("ANTHROPIC_API_KEY not set, AI search falls back to geometric matching");
    }

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        config: Arc::new(config),
        matcher: Arc::new(matcher),
        http: reqwest::Client::new(),
    };

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server running on http://{}", bind_addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
