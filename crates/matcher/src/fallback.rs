//! Fallback chain: Primary → Degraded → Synthetic.
//!
//! Data shortages never fail a search. When full scoring yields nothing the
//! search is widened and ranked by a cheap length/proximity heuristic; when
//! that yields nothing too, clearly labeled placeholder loops are generated
//! around the center so the caller always gets at least one route.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use shared::{
    ConfidenceTier, CreativityProfile, FallbackStage, GeoBounds, GeoPoint, RawGeometry, Route,
    RouteSource, ShapeFeatures, TransportMode,
};
use std::f64::consts::PI;
use std::future::Future;

use crate::aggregate::round_to;
use crate::collector::{CandidateQuery, RouteCandidate};
use crate::error::MatchError;
use crate::geometry::{geo_centroid, geo_path_length_km, haversine_km, offset_km};
use crate::pipeline::RouteMatcher;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Radius multiplier of the degraded search
    pub widen_factor: f64,
    /// Heuristic score a degraded candidate needs
    pub heuristic_min_score: f64,
    pub synthetic_count: usize,
    /// Points per synthetic loop (before closing)
    pub synthetic_points: usize,
    /// Relative radius jitter of synthetic loops
    pub synthetic_jitter: f64,
    pub seed: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            widen_factor: 2.0,
            heuristic_min_score: 0.2,
            synthetic_count: 3,
            synthetic_points: 24,
            synthetic_jitter: 0.15,
            seed: 0x5eed_cafe,
        }
    }
}

/// What to ask the street-network provider for
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryQuery {
    pub center: GeoPoint,
    pub radius_km: f64,
    pub bounds: GeoBounds,
    /// `highway=*` classes to include
    pub way_classes: Vec<String>,
    /// Ways longer than this are not useful
    pub max_length_km: Option<f64>,
    pub mode: TransportMode,
}

/// Everything a search needs besides the geometry
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    pub features: &'a ShapeFeatures,
    pub center: GeoPoint,
    pub mode: TransportMode,
    pub profile: CreativityProfile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FallbackOutcome {
    pub stage: FallbackStage,
    /// Never empty
    pub routes: Vec<Route>,
}

pub struct FallbackStrategy<'a> {
    matcher: &'a RouteMatcher,
}

impl<'a> FallbackStrategy<'a> {
    pub fn new(matcher: &'a RouteMatcher) -> Self {
        Self { matcher }
    }

    fn expected_length_km(&self, ctx: &SearchContext<'_>) -> f64 {
        self.matcher
            .collector()
            .expected_length_km(ctx.features, ctx.mode)
    }

    fn max_length_km(&self, ctx: &SearchContext<'_>) -> Option<f64> {
        self.matcher
            .config()
            .collector
            .length_filter
            .map(|f| self.expected_length_km(ctx) * f.max_ratio)
    }

    /// Mode way classes within the configured radius
    pub fn primary_query(&self, ctx: &SearchContext<'_>) -> GeometryQuery {
        let collector = &self.matcher.config().collector;
        GeometryQuery {
            center: ctx.center,
            radius_km: collector.radius_km,
            bounds: GeoBounds::around(ctx.center, collector.radius_km),
            way_classes: collector.way_classes.for_mode(ctx.mode).to_vec(),
            max_length_km: self.max_length_km(ctx),
            mode: ctx.mode,
        }
    }

    /// Widened way classes within `radius × widen_factor`
    pub fn degraded_query(&self, ctx: &SearchContext<'_>) -> GeometryQuery {
        let config = self.matcher.config();
        let radius_km = config.collector.radius_km * config.fallback.widen_factor;
        GeometryQuery {
            center: ctx.center,
            radius_km,
            bounds: GeoBounds::around(ctx.center, radius_km),
            way_classes: config.collector.way_classes.widened(ctx.mode),
            max_length_km: None,
            mode: ctx.mode,
        }
    }

    /// `0.5 · length agreement + 0.5 · exp(−centroid distance / radius)`
    pub fn heuristic_score(&self, candidate: &RouteCandidate, expected_km: f64, ctx: &SearchContext<'_>) -> f64 {
        let longer = expected_km.max(candidate.distance_km);
        let length = if longer > 0.0 {
            expected_km.min(candidate.distance_km) / longer
        } else {
            0.0
        };
        let radius = self.degraded_query(ctx).radius_km;
        let proximity = geo_centroid(&candidate.geo_path)
            .map(|c| (-haversine_km(&c, &ctx.center) / radius).exp())
            .unwrap_or(0.0);
        (0.5 * length + 0.5 * proximity).clamp(0.0, 1.0)
    }

    /// Rank geometries by the length/proximity heuristic only
    pub fn degraded_routes(&self, ctx: &SearchContext<'_>, geometries: &[RawGeometry]) -> Vec<Route> {
        let config = self.matcher.config();
        let query = CandidateQuery::new(ctx.center, ctx.mode, self.degraded_query(ctx).radius_km);
        let candidates = self.matcher.collector().collect(geometries, &query);
        let expected = self.expected_length_km(ctx);

        let mut scored: Vec<(f64, &RouteCandidate)> = candidates
            .iter()
            .map(|c| (self.heuristic_score(c, expected, ctx), c))
            .filter(|(score, _)| *score >= config.fallback.heuristic_min_score)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.index.cmp(&b.1.index)));
        scored.truncate(config.scoring.max_results);

        scored
            .into_iter()
            .enumerate()
            .map(|(i, (score, c))| Route {
                route_name: c
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("Nearby route {}", i + 1)),
                description: format!(
                    "Nearby {:.1} km {} route; chosen by length and distance, shape not compared",
                    c.distance_km,
                    ctx.mode.label()
                ),
                distance_km: round_to(c.distance_km, 2),
                duration_min: c.estimated_duration_min.round(),
                similarity_score: round_to(score, 3),
                geometric_similarity: None,
                path: c.geo_path.clone(),
                matching_issues: Some(vec![
                    "Ranked by length and proximity only; no close shape match was found".to_string(),
                ]),
                confidence_tier: Some(ConfidenceTier::Low),
                source: RouteSource::Heuristic,
            })
            .collect()
    }

    /// Placeholder loops around the center; deterministic per center and seed
    pub fn synthetic_routes(&self, ctx: &SearchContext<'_>) -> Vec<Route> {
        let config = self.matcher.config();
        let fallback = &config.fallback;
        let mut rng = StdRng::seed_from_u64(
            fallback.seed ^ ctx.center.lat.to_bits() ^ ctx.center.lon.to_bits().rotate_left(32),
        );
        let loop_km = self.expected_length_km(ctx).max(0.5);
        let radius_km = (loop_km / (2.0 * PI)).min(config.collector.radius_km / 2.0);

        (0..fallback.synthetic_count)
            .map(|i| {
                let origin = if i == 0 {
                    ctx.center
                } else {
                    let bearing = 2.0 * PI * i as f64 / fallback.synthetic_count as f64;
                    offset_km(&ctx.center, radius_km, bearing)
                };
                let mut path: Vec<GeoPoint> = (0..fallback.synthetic_points)
                    .map(|j| {
                        let bearing = 2.0 * PI * j as f64 / fallback.synthetic_points as f64;
                        let jitter = rng.gen_range(-1.0..=1.0) * fallback.synthetic_jitter;
                        offset_km(&origin, radius_km * (1.0 + jitter), bearing)
                    })
                    .collect();
                if let Some(first) = path.first().copied() {
                    path.push(first);
                }
                let distance_km = geo_path_length_km(&path);
                Route {
                    route_name: format!("Placeholder loop {}", i + 1),
                    description: format!(
                        "Synthetic placeholder: a {:.1} km loop near the search center, not based on street data",
                        distance_km
                    ),
                    distance_km: round_to(distance_km, 2),
                    duration_min: config.collector.speeds.duration_min(ctx.mode, distance_km).round(),
                    similarity_score: 0.0,
                    geometric_similarity: None,
                    path,
                    matching_issues: Some(vec![
                        "Placeholder route generated without street data".to_string(),
                    ]),
                    confidence_tier: Some(ConfidenceTier::Low),
                    source: RouteSource::Synthetic,
                }
            })
            .collect()
    }

    /// Drive the chain, fetching geometry through `fetch`.
    ///
    /// Fetch errors are logged and absorbed; the outcome always holds at least
    /// one route.
    pub async fn run<F, Fut>(&self, ctx: &SearchContext<'_>, mut fetch: F) -> FallbackOutcome
    where
        F: FnMut(GeometryQuery) -> Fut,
        Fut: Future<Output = Result<Vec<RawGeometry>, MatchError>>,
    {
        let primary = match fetch(self.primary_query(ctx)).await {
            Ok(geometries) => Some(geometries),
            Err(e) => {
                tracing::warn!(error = %e, "primary geometry fetch failed");
                None
            }
        };

        if let Some(geometries) = &primary {
            let routes = self.matcher.find_matching_routes(
                ctx.features,
                geometries,
                ctx.center,
                ctx.mode,
                ctx.profile,
            );
            if !routes.is_empty() {
                return FallbackOutcome {
                    stage: FallbackStage::Primary,
                    routes,
                };
            }
        }

        tracing::info!("no primary match, widening the search");
        let widened = match fetch(self.degraded_query(ctx)).await {
            Ok(geometries) => Some(geometries),
            Err(e) => {
                tracing::warn!(error = %e, "widened geometry fetch failed, reusing primary data");
                primary
            }
        };
        if let Some(geometries) = widened {
            let routes = self.degraded_routes(ctx, &geometries);
            if !routes.is_empty() {
                return FallbackOutcome {
                    stage: FallbackStage::Degraded,
                    routes,
                };
            }
        }

        tracing::info!("no degraded match, generating placeholder loops");
        FallbackOutcome {
            stage: FallbackStage::Synthetic,
            routes: self.synthetic_routes(ctx),
        }
    }
}
