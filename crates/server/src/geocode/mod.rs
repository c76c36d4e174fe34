//! Place name → center and bounds, via a Nominatim-compatible geocoder.

use serde::Deserialize;
use shared::{GeoBounds, GeoPoint, ResolvedLocation};

use crate::error::provider_unavailable;
use crate::AppState;
use route_matcher::MatchError;

const USER_AGENT: &str = concat!("route-matcher/", env!("CARGO_PKG_VERSION"));

/// Nominatim search hit; coordinates arrive as strings
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
    /// `[south, north, west, east]`
    #[serde(default)]
    boundingbox: Vec<String>,
    #[serde(default)]
    importance: f64,
}

pub async fn resolve_location(state: &AppState, query: &str) -> Result<ResolvedLocation, MatchError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(MatchError::LocationNotFound(String::new()));
    }

    let url = format!("{}/search", state.config.nominatim_url.trim_end_matches('/'));
    let request = state
        .http
        .get(url)
        .header("user-agent", USER_AGENT)
        .query(&[("q", query), ("format", "json"), ("limit", "1")])
        .send();

    let response = tokio::time::timeout(state.config.geocode_timeout, request)
        .await
        .map_err(|_| provider_unavailable("geocoder", "timed out"))?
        .and_then(|r| r.error_for_status())
        .map_err(|e| provider_unavailable("geocoder", e))?;
    let body = response
        .text()
        .await
        .map_err(|e| provider_unavailable("geocoder", e))?;

    let location = parse_places(&body)?.ok_or_else(|| MatchError::LocationNotFound(query.to_string()))?;
    tracing::info!(query, name = %location.display_name, "resolved location");
    Ok(location)
}

/// First usable hit of a Nominatim JSON answer
fn parse_places(body: &str) -> Result<Option<ResolvedLocation>, MatchError> {
    let places: Vec<Place> =
        serde_json::from_str(body).map_err(|e| provider_unavailable("geocoder", e))?;
    Ok(places.into_iter().find_map(to_location))
}

fn to_location(place: Place) -> Option<ResolvedLocation> {
    let center = GeoPoint::new(place.lat.parse().ok()?, place.lon.parse().ok()?);
    if !center.is_finite() {
        return None;
    }
    let edges: Vec<f64> = place
        .boundingbox
        .iter()
        .filter_map(|v| v.parse().ok())
        .collect();
    let bounds = match edges[..] {
        [south, north, west, east] => GeoBounds {
            south,
            west,
            north,
            east,
        },
        _ => GeoBounds::around(center, 1.0),
    };
    Some(ResolvedLocation {
        display_name: place.display_name,
        center,
        bounds,
        importance: place.importance,
    })
}

/// Location used when the request already carries a center
pub fn explicit_location(label: &str, center: GeoPoint, radius_km: f64) -> ResolvedLocation {
    ResolvedLocation {
        display_name: if label.trim().is_empty() {
            format!("{:.5}, {:.5}", center.lat, center.lon)
        } else {
            label.trim().to_string()
        },
        center,
        bounds: GeoBounds::around(center, radius_km),
        importance: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_hit() {
        let body = r#"[
            {"lat": "52.5170365", "lon": "13.3888599", "display_name": "Berlin, Deutschland",
             "boundingbox": ["52.3382448", "52.6755087", "13.0883450", "13.7611609"],
             "importance": 0.85},
            {"lat": "39.0", "lon": "-76.0", "display_name": "Berlin, Maryland"}
        ]"#;
        let location = parse_places(body).unwrap().unwrap();
        assert_eq!(location.display_name, "Berlin, Deutschland");
        assert!((location.center.lat - 52.517).abs() < 1e-3);
        assert_eq!(location.bounds.south, 52.3382448);
        assert_eq!(location.bounds.east, 13.7611609);
        assert!(location.bounds.contains(&location.center));
    }

    #[test]
    fn test_skips_unparseable_hits() {
        let body = r#"[
            {"lat": "north", "lon": "13.0"},
            {"lat": "48.85", "lon": "2.35", "display_name": "Paris"}
        ]"#;
        let location = parse_places(body).unwrap().unwrap();
        assert_eq!(location.display_name, "Paris");
        // no bounding box: 1 km around the center
        assert!(location.bounds.contains(&location.center));
    }

    #[test]
    fn test_no_hits() {
        assert!(parse_places("[]").unwrap().is_none());
    }

    #[test]
    fn test_malformed_body_is_provider_error() {
        let err = parse_places("<html>rate limited</html>").unwrap_err();
        assert_eq!(err.kind(), "data_provider_unavailable");
    }

    #[test]
    fn test_explicit_location_label() {
        let center = GeoPoint::new(52.52, 13.405);
        assert_eq!(explicit_location("", center, 2.0).display_name, "52.52000, 13.40500");
        assert_eq!(explicit_location(" Mitte ", center, 2.0).display_name, "Mitte");
    }
}
