//! Shape analysis: feature extraction from a raw drawing.
//!
//! The analyzer flattens all strokes into one ordered sequence and derives the
//! bounding box, corners, curvature, closed-loop flag, complexity, symmetry and a
//! cosmetic classification. It is a pure function of the drawing and config.

use serde::{Deserialize, Serialize};
use shared::{BoundingBox, Corner, Drawing, Point2D, ShapeFeatures, Symmetry};

use crate::classify::classify;
use crate::error::MatchError;
use crate::geometry::{
    distance_to_polyline, menger_curvature, path_length, polyline_centroid, vertex_angle_deg,
    EPSILON,
};
use crate::normalize::{resample, to_unit_square};
use crate::validation::DrawingValidator;

/// Thresholds for shape analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Minimum number of flattened points
    pub min_points: usize,
    /// Minimum bounding-box width and height, pixels
    pub min_dimension_px: f64,
    /// Interior angles below this are corners (degrees)
    pub corner_angle_deg: f64,
    /// Interior angles below this are sharp turns (degrees)
    pub sharp_turn_angle_deg: f64,
    /// Closed if first/last gap ≤ tolerance · min(width, height)
    pub closed_tolerance: f64,
    /// Mirror match distance in the unit frame
    pub symmetry_tolerance: f64,
    /// Triangles smaller than this (unit frame) have zero curvature
    pub min_triangle_area: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_points: 3,
            min_dimension_px: 5.0,
            corner_angle_deg: 135.0,
            sharp_turn_angle_deg: 90.0,
            closed_tolerance: 0.15,
            symmetry_tolerance: 0.1,
            min_triangle_area: 1e-9,
        }
    }
}

/// Extracts `ShapeFeatures` from drawings
#[derive(Debug, Clone, Default)]
pub struct ShapeAnalyzer {
    config: AnalyzerConfig,
}

impl ShapeAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze a drawing.
    ///
    /// Fails with `InsufficientData` when the drawing has too few points or a
    /// bounding box below the minimum size in either dimension.
    pub fn analyze(&self, drawing: &Drawing) -> Result<ShapeFeatures, MatchError> {
        DrawingValidator::new(drawing, &self.config)
            .validate_all()
            .into_result()?;

        let points = drawing.flatten();
        let bbox = BoundingBox::from_points(&points).ok_or_else(|| MatchError::InsufficientData {
            issues: vec!["Drawing contains no points".to_string()],
            recommendations: vec!["Draw a shape on the canvas before searching".to_string()],
        })?;

        let unit = to_unit_square(&points);
        let is_closed = is_closed_loop(&points, &bbox, self.config.closed_tolerance);
        let corners = detect_corners(&points, is_closed, &self.config);
        let curvature = curvature_samples(&unit, self.config.min_triangle_area);
        let total_length = path_length(&points);
        let normalized_length = total_length / bbox.max_dimension();
        let complexity = complexity_score(corners.len(), normalized_length, &curvature);
        let symmetry = symmetry_scores(&unit, self.config.symmetry_tolerance);
        let classification = classify(&unit, &corners, is_closed);

        tracing::debug!(
            points = points.len(),
            corners = corners.len(),
            is_closed,
            complexity,
            class = %classification.class,
            "analyzed drawing"
        );

        Ok(ShapeFeatures {
            bounding_box: bbox,
            centroid: polyline_centroid(&points),
            aspect_ratio: bbox.width() / bbox.height(),
            total_length,
            corners,
            curvature,
            is_closed,
            complexity,
            symmetry,
            normalized_path: unit,
            classification,
            point_count: points.len(),
        })
    }
}

/// `distance(first, last) ≤ tolerance · min(width, height)`
pub fn is_closed_loop(points: &[Point2D], bbox: &BoundingBox, tolerance: f64) -> bool {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() >= 3 => {
            first.distance(last) <= tolerance * bbox.min_dimension()
        }
        _ => false,
    }
}

/// Vertices whose interior angle is below the corner threshold.
///
/// Interior points are always checked; for closed paths the seam vertex (index 0,
/// preceded by the last point distinct from it) is checked too.
pub fn detect_corners(points: &[Point2D], closed: bool, config: &AnalyzerConfig) -> Vec<Corner> {
    let n = points.len();
    let mut corners = Vec::new();
    if n < 3 {
        return corners;
    }

    let mut check = |index: usize, prev: &Point2D, next: &Point2D| {
        let cur = &points[index];
        if let Some(angle) = vertex_angle_deg(prev, cur, next) {
            if angle < config.corner_angle_deg {
                corners.push(Corner {
                    index,
                    point: *cur,
                    angle_deg: angle,
                    sharp: angle < config.sharp_turn_angle_deg,
                });
            }
        }
    };

    // neighbors are the nearest points distinct from the vertex, so repeated
    // samples (stroke joins, pauses) neither hide nor duplicate a corner
    let distinct = |p: &&Point2D, from: &Point2D| p.distance(from) > EPSILON;

    if closed {
        let seam_prev = points[1..].iter().rev().find(|p| distinct(p, &points[0]));
        let seam_next = points[1..].iter().find(|p| distinct(p, &points[0]));
        if let (Some(prev), Some(next)) = (seam_prev, seam_next) {
            check(0, prev, next);
        }
    }
    for i in 1..n - 1 {
        if !distinct(&&points[i], &points[i - 1]) {
            continue;
        }
        let prev = points[..i].iter().rev().find(|p| distinct(p, &points[i]));
        let next = points[i + 1..].iter().find(|p| distinct(p, &points[i]));
        if let (Some(prev), Some(next)) = (prev, next) {
            check(i, prev, next);
        }
    }
    corners
}

/// Menger curvature of every interior triple
pub fn curvature_samples(points: &[Point2D], min_area: f64) -> Vec<f64> {
    points
        .windows(3)
        .map(|w| menger_curvature(&w[0], &w[1], &w[2], min_area))
        .collect()
}

/// Population variance; 0 for an empty slice
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Blend of corner density and curvature variance, in [0, 1].
///
/// `normalized_length` is the path length in units of the larger bounding-box side.
pub fn complexity_score(corner_count: usize, normalized_length: f64, curvature: &[f64]) -> f64 {
    let density = if normalized_length > EPSILON {
        corner_count as f64 / normalized_length
    } else {
        0.0
    };
    let density_score = (density / 3.0).min(1.0);
    let var = variance(curvature);
    let curvature_score = var / (1.0 + var);
    (0.6 * density_score + 0.4 * curvature_score).clamp(0.0, 1.0)
}

/// Complexity of an arbitrary path, computed the same way as for drawings
pub fn path_complexity(points: &[Point2D], config: &AnalyzerConfig) -> f64 {
    let Some(bbox) = BoundingBox::from_points(points) else {
        return 0.0;
    };
    let max_dim = bbox.max_dimension();
    if max_dim <= EPSILON {
        return 0.0;
    }
    let unit = to_unit_square(points);
    let closed = is_closed_loop(points, &bbox, config.closed_tolerance);
    let corners = detect_corners(points, closed, config);
    let curvature = curvature_samples(&unit, config.min_triangle_area);
    complexity_score(corners.len(), path_length(points) / max_dim, &curvature)
}

/// Arc-length samples the symmetry check runs on, whatever the drawing's size
pub const SYMMETRY_SAMPLES: usize = 96;

/// Mirror symmetry about the horizontal and vertical axes through the centroid.
///
/// Share of evenly spaced path samples whose mirror image lies within
/// `tolerance` of the path polyline.
pub fn symmetry_scores(unit: &[Point2D], tolerance: f64) -> Symmetry {
    if unit.len() < 2 {
        return Symmetry::default();
    }
    let c = polyline_centroid(unit);
    let samples = resample(unit, SYMMETRY_SAMPLES);
    Symmetry {
        horizontal: mirror_match(&samples, tolerance, |p| Point2D::new(p.x, 2.0 * c.y - p.y)),
        vertical: mirror_match(&samples, tolerance, |p| Point2D::new(2.0 * c.x - p.x, p.y)),
    }
}

fn mirror_match(points: &[Point2D], tolerance: f64, mirror: impl Fn(&Point2D) -> Point2D) -> f64 {
    let matched = points
        .iter()
        .filter(|p| distance_to_polyline(&mirror(p), points) <= tolerance)
        .count();
    matched as f64 / points.len() as f64
}
