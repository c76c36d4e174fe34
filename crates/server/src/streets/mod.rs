//! Street-network geometry from an Overpass API endpoint.

use serde::Deserialize;
use shared::{GeoPoint, RawGeometry};
use std::collections::BTreeMap;

use crate::error::provider_unavailable;
use crate::AppState;
use route_matcher::{GeometryQuery, MatchError};

/// Upper bound on ways requested per query
pub const MAX_WAYS: usize = 1500;

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
struct Element {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    tags: BTreeMap<String, String>,
    #[serde(default)]
    geometry: Vec<Option<LatLon>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct LatLon {
    lat: f64,
    lon: f64,
}

/// Overpass QL for the query's bounding box and way classes
pub fn build_query(query: &GeometryQuery, timeout_secs: u64) -> String {
    let b = &query.bounds;
    let classes = query
        .way_classes
        .iter()
        .map(|c| regex_escape(c))
        .collect::<Vec<_>>()
        .join("|");
    let length_filter = query
        .max_length_km
        .map(|km| format!("(if: length() < {:.0})", km * 1000.0))
        .unwrap_or_default();
    format!(
        "[out:json][timeout:{}];\nway[\"highway\"~\"^({})$\"]({:.6},{:.6},{:.6},{:.6}){};\nout geom {};",
        timeout_secs, classes, b.south, b.west, b.north, b.east, length_filter, MAX_WAYS
    )
}

fn regex_escape(class: &str) -> String {
    class
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Ways of an `out geom` answer; elements without usable geometry are dropped
pub fn parse_response(body: &str) -> Result<Vec<RawGeometry>, MatchError> {
    let response: OverpassResponse =
        serde_json::from_str(body).map_err(|e| provider_unavailable("street network", e))?;

    let total = response.elements.len();
    let geometries: Vec<RawGeometry> = response
        .elements
        .into_iter()
        .filter(|e| e.kind.is_empty() || e.kind == "way")
        .filter_map(|mut e| {
            let points: Vec<GeoPoint> = e
                .geometry
                .into_iter()
                .flatten()
                .map(|p| GeoPoint::new(p.lat, p.lon))
                .collect();
            if points.len() < 2 {
                return None;
            }
            let name = e.tags.remove("name");
            Some(RawGeometry {
                name,
                tags: e.tags,
                points,
            })
        })
        .take(MAX_WAYS)
        .collect();

    tracing::debug!(elements = total, ways = geometries.len(), "parsed street network");
    Ok(geometries)
}

pub async fn fetch_geometries(state: &AppState, query: GeometryQuery) -> Result<Vec<RawGeometry>, MatchError> {
    let timeout = state.config.overpass_timeout;
    let ql = build_query(&query, timeout.as_secs());
    tracing::debug!(radius_km = query.radius_km, classes = query.way_classes.len(), "fetching street network");

    let request = state
        .http
        .post(&state.config.overpass_url)
        .form(&[("data", ql)])
        .send();
    let response = tokio::time::timeout(timeout, request)
        .await
        .map_err(|_| provider_unavailable("street network", "timed out"))?
        .and_then(|r| r.error_for_status())
        .map_err(|e| provider_unavailable("street network", e))?;
    let body = response
        .text()
        .await
        .map_err(|e| provider_unavailable("street network", e))?;

    let geometries = parse_response(&body)?;
    tracing::info!(ways = geometries.len(), radius_km = query.radius_km, "street network fetched");
    Ok(geometries)
}
