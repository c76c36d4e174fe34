//! Candidate collection: raw path geometries → vetted `RouteCandidate`s.
//!
//! The collector drops geometries it cannot use (too few points, non-finite
//! coordinates, too far from the search center, implausible length), simplifies
//! the rest with Douglas–Peucker, measures them on the sphere and normalizes
//! them for comparison.

use geo::{LineString, Simplify};
use serde::{Deserialize, Serialize};
use shared::{GeoPoint, ModeSpeeds, RawGeometry, ShapeFeatures, TransportMode, WayClassTable};
use std::collections::BTreeMap;

use crate::geometry::{geo_path_length_km, haversine_km};
use crate::normalize::{NormalizedPath, PathNormalizer};

/// Accepted candidate length relative to the length expected from the drawing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthFilter {
    pub min_ratio: f64,
    pub max_ratio: f64,
}

impl Default for LengthFilter {
    fn default() -> Self {
        Self {
            min_ratio: 0.2,
            max_ratio: 5.0,
        }
    }
}

/// Kilometers on the ground per unit of normalized drawing length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LengthScale {
    pub walking_km: f64,
    pub cycling_km: f64,
    pub driving_km: f64,
}

impl Default for LengthScale {
    fn default() -> Self {
        Self {
            walking_km: 1.0,
            cycling_km: 3.0,
            driving_km: 8.0,
        }
    }
}

impl LengthScale {
    pub fn km_per_unit(&self, mode: TransportMode) -> f64 {
        match mode {
            TransportMode::Walking => self.walking_km,
            TransportMode::Cycling => self.cycling_km,
            TransportMode::Driving => self.driving_km,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Candidates starting farther than this from the center are dropped
    pub radius_km: f64,
    /// Douglas–Peucker tolerance in degrees
    pub simplify_tolerance_deg: f64,
    /// Upper bound on vetted candidates passed to scoring
    pub max_candidates: usize,
    /// `None` disables length pruning
    pub length_filter: Option<LengthFilter>,
    pub length_scale: LengthScale,
    pub speeds: ModeSpeeds,
    pub way_classes: WayClassTable,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            radius_km: 10.0,
            simplify_tolerance_deg: 0.00005,
            max_candidates: 200,
            length_filter: Some(LengthFilter::default()),
            length_scale: LengthScale::default(),
            speeds: ModeSpeeds::default(),
            way_classes: WayClassTable::default(),
        }
    }
}

/// Where and how to collect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateQuery {
    pub center: GeoPoint,
    pub mode: TransportMode,
    pub radius_km: f64,
    /// Enables the length filter when set
    pub expected_length_km: Option<f64>,
}

impl CandidateQuery {
    pub fn new(center: GeoPoint, mode: TransportMode, radius_km: f64) -> Self {
        Self {
            center,
            mode,
            radius_km,
            expected_length_km: None,
        }
    }

    pub fn with_expected_length(mut self, km: f64) -> Self {
        self.expected_length_km = Some(km);
        self
    }
}

/// Vetted, simplified and normalized candidate path.
///
/// Immutable once collected; scores live in `ScoredCandidate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteCandidate {
    /// Position in the raw geometry list; breaks ranking ties
    pub index: usize,
    pub name: Option<String>,
    pub way_class: Option<String>,
    pub tags: BTreeMap<String, String>,
    /// Simplified geographic path
    pub geo_path: Vec<GeoPoint>,
    /// Great-circle length of the unsimplified path
    pub distance_km: f64,
    pub estimated_duration_min: f64,
    pub normalized: NormalizedPath,
}

/// Why a geometry did not become a candidate
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    TooFewPoints(usize),
    NonFinite,
    OutOfRadius { distance_km: f64 },
    TooShort { length_km: f64, min_km: f64 },
    TooLong { length_km: f64, max_km: f64 },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::TooFewPoints(n) => write!(f, "only {} point(s)", n),
            Rejection::NonFinite => write!(f, "non-finite coordinates"),
            Rejection::OutOfRadius { distance_km } => {
                write!(f, "starts {:.2} km from the center", distance_km)
            }
            Rejection::TooShort { length_km, min_km } => {
                write!(f, "{:.2} km is shorter than {:.2} km", length_km, min_km)
            }
            Rejection::TooLong { length_km, max_km } => {
                write!(f, "{:.2} km is longer than {:.2} km", length_km, max_km)
            }
        }
    }
}

pub struct CandidateCollector<'a> {
    config: &'a CollectorConfig,
    normalizer: PathNormalizer,
}

impl<'a> CandidateCollector<'a> {
    pub fn new(config: &'a CollectorConfig, normalizer: PathNormalizer) -> Self {
        Self { config, normalizer }
    }

    /// Ground length the drawing suggests for `mode`
    pub fn expected_length_km(&self, features: &ShapeFeatures, mode: TransportMode) -> f64 {
        features.normalized_length() * self.config.length_scale.km_per_unit(mode)
    }

    /// Vet every geometry; keeps input order and caps at `max_candidates`
    pub fn collect(&self, geometries: &[RawGeometry], query: &CandidateQuery) -> Vec<RouteCandidate> {
        let mut candidates = Vec::new();
        let mut rejected = 0usize;
        for (index, geometry) in geometries.iter().enumerate() {
            if candidates.len() >= self.config.max_candidates {
                tracing::debug!(
                    cap = self.config.max_candidates,
                    remaining = geometries.len() - index,
                    "candidate cap reached"
                );
                break;
            }
            match self.vet(index, geometry, query) {
                Ok(candidate) => candidates.push(candidate),
                Err(reason) => {
                    rejected += 1;
                    tracing::debug!(index, name = ?geometry.name, %reason, "rejected geometry");
                }
            }
        }
        tracing::debug!(
            accepted = candidates.len(),
            rejected,
            mode = query.mode.label(),
            "collected candidates"
        );
        candidates
    }

    /// Turn one geometry into a candidate or explain why not
    pub fn vet(
        &self,
        index: usize,
        geometry: &RawGeometry,
        query: &CandidateQuery,
    ) -> Result<RouteCandidate, Rejection> {
        let points = &geometry.points;
        if points.len() < 2 {
            return Err(Rejection::TooFewPoints(points.len()));
        }
        if !points.iter().all(GeoPoint::is_finite) {
            return Err(Rejection::NonFinite);
        }

        let start_distance = haversine_km(&query.center, &points[0]);
        if start_distance > query.radius_km {
            return Err(Rejection::OutOfRadius {
                distance_km: start_distance,
            });
        }

        let distance_km = geo_path_length_km(points);
        if let (Some(filter), Some(expected)) = (self.config.length_filter, query.expected_length_km) {
            if expected > 0.0 {
                let min_km = expected * filter.min_ratio;
                let max_km = expected * filter.max_ratio;
                if distance_km < min_km {
                    return Err(Rejection::TooShort {
                        length_km: distance_km,
                        min_km,
                    });
                }
                if distance_km > max_km {
                    return Err(Rejection::TooLong {
                        length_km: distance_km,
                        max_km,
                    });
                }
            }
        }

        let geo_path = simplify(points, self.config.simplify_tolerance_deg);
        let normalized = self.normalizer.normalize_geo(&geo_path);
        Ok(RouteCandidate {
            index,
            name: geometry.name.clone().filter(|n| !n.trim().is_empty()),
            way_class: geometry.way_class().map(str::to_string),
            tags: geometry.tags.clone(),
            geo_path,
            distance_km,
            estimated_duration_min: self.config.speeds.duration_min(query.mode, distance_km),
            normalized,
        })
    }
}

/// Douglas–Peucker over lon/lat; endpoints are always kept
pub fn simplify(points: &[GeoPoint], tolerance_deg: f64) -> Vec<GeoPoint> {
    if tolerance_deg <= 0.0 || points.len() < 3 {
        return points.to_vec();
    }
    let line: LineString<f64> = points.iter().map(|p| (p.lon, p.lat)).collect();
    line.simplify(&tolerance_deg)
        .coords()
        .map(|c| GeoPoint::new(c.y, c.x))
        .collect()
}
