use shared::{ConfidenceTier, ResolvedLocation, Route, RouteSource, ShapeSummary, TransportMode};

use crate::error::provider_unavailable;
use crate::AppState;
use route_matcher::MatchError;

const SYSTEM_PROMPT: &str = r#"
You are a route planner. A user drew a shape and wants a real-world route in a
given city whose path traces that shape.

Answer with a JSON array only. Each element describes one route:
{
    "routeName": string,
    "description": string,
    "distanceKm": number,
    "durationMin": number,
    "similarityScore": number between 0 and 1 (how well the route traces the shape),
    "path": [ { "lat": number, "lon": number }, ... ],
    "matchingIssues": [ string, ... ]
}

Prefer routes on streets and paths usable by the requested transport mode.
Be honest in similarityScore; a poor fit is better reported than hidden.
"#;

const MAX_AI_ROUTES: usize = 5;

pub fn build_prompt(shape: &ShapeSummary, location: &ResolvedLocation, mode: TransportMode) -> String {
    format!(
        "Shape: {}.\nShape class: {} (confidence {:.2}), aspect ratio {:.2}, {} sharp turn(s).\n\
         Location: {} (center {:.5}, {:.5}).\nTransport mode: {}.\n\
         Suggest up to {} routes.",
        shape.describe(),
        shape.class,
        shape.class_confidence,
        shape.aspect_ratio,
        shape.sharp_turns,
        location.display_name,
        location.center.lat,
        location.center.lon,
        mode.label(),
        MAX_AI_ROUTES
    )
}

pub async fn generate_routes(
    state: &AppState,
    shape: &ShapeSummary,
    location: &ResolvedLocation,
    mode: TransportMode,
) -> Result<Vec<Route>, MatchError> {
    let api_key = state
        .config
        .ai_api_key
        .as_ref()
        .ok_or_else(|| MatchError::DataProviderUnavailable("AI route generator is not configured".to_string()))?;

    let request = state
        .http
        .post("https://api.anthropic.com/v1/messages")
        .header("x-api-key", api_key)
        .header("anthropic-version", "2023-06-01")
        .header("content-type", "application/json")
        .json(&serde_json::json!({
            "model": "claude-sonnet-4-20250514",
            "max_tokens": 4096,
            "system": SYSTEM_PROMPT,
            "messages": [
                { "role": "user", "content": build_prompt(shape, location, mode) }
            ]
        }))
        .send();

    let response = tokio::time::timeout(state.config.ai_timeout, request)
        .await
        .map_err(|_| provider_unavailable("AI route generator", "timed out"))?
        .and_then(|r| r.error_for_status())
        .map_err(|e| provider_unavailable("AI route generator", e))?;
    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| provider_unavailable("AI route generator", e))?;

    let content_text = body["content"]
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(|block| block["text"].as_str())
        .unwrap_or("[]");

    let routes = parse_routes(content_text);
    tracing::info!(routes = routes.len(), "AI routes received");
    Ok(routes)
}

/// Route objects from a model answer, which may wrap the array in prose
pub fn parse_routes(text: &str) -> Vec<Route> {
    let json = match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => return Vec::new(),
    };
    let values: Vec<serde_json::Value> = match serde_json::from_str(json) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(error = %e, "AI answer is not a JSON array");
            return Vec::new();
        }
    };

    values
        .into_iter()
        .filter_map(|v| serde_json::from_value::<Route>(v).ok())
        .filter(|r| !r.route_name.trim().is_empty())
        .take(MAX_AI_ROUTES)
        .map(|mut route| {
            route.similarity_score = route.similarity_score.clamp(0.0, 1.0);
            route.confidence_tier = Some(ConfidenceTier::from_confidence(route.similarity_score));
            route.geometric_similarity = None;
            route.source = RouteSource::Ai;
            route
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{GeoBounds, GeoPoint, ShapeClass, Symmetry};

    #[test]
    fn test_parse_routes_in_prose() {
        let text = r#"Here are two ideas:
        [
            {"routeName": "Tiergarten square", "distanceKm": 4.1, "similarityScore": 1.4,
             "path": [{"lat": 52.51, "lon": 13.35}]},
            {"routeName": "", "distanceKm": 1.0},
            {"distanceKm": "far"},
            {"routeName": "Spree bend", "similarityScore": 0.3}
        ]
        Enjoy!"#;
        let routes = parse_routes(text);
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].route_name, "Tiergarten square");
        assert_eq!(routes[0].similarity_score, 1.0);
        assert_eq!(routes[0].confidence_tier, Some(ConfidenceTier::High));
        assert_eq!(routes[1].confidence_tier, Some(ConfidenceTier::Low));
        assert!(routes.iter().all(|r| r.source == RouteSource::Ai));
    }

    #[test]
    fn test_parse_routes_without_array() {
        assert!(parse_routes("Sorry, I cannot help with that.").is_empty());
        assert!(parse_routes("] [").is_empty());
        assert!(parse_routes("[not json]").is_empty());
    }

    #[test]
    fn test_prompt_mentions_shape_and_place() {
        let shape = ShapeSummary {
            class: ShapeClass::Triangle,
            class_confidence: 0.9,
            is_closed: true,
            corner_count: 3,
            sharp_turns: 3,
            aspect_ratio: 1.0,
            complexity: 0.3,
            symmetry: Symmetry::default(),
        };
        let center = GeoPoint::new(48.1374, 11.5755);
        let location = ResolvedLocation {
            display_name: "München".to_string(),
            center,
            bounds: GeoBounds::around(center, 5.0),
            importance: 0.8,
        };
        let prompt = build_prompt(&shape, &location, TransportMode::Cycling);
        assert!(prompt.contains("triangle"));
        assert!(prompt.contains("München"));
        assert!(prompt.contains("cycling"));
    }
}
