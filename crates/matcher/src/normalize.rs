//! Path normalization: one comparable frame for drawings and map paths.
//!
//! Every path is mapped into a y-up planar frame, resampled to a fixed number of
//! points spaced evenly along its arc length, translated to its bounding-box
//! origin and scaled uniformly so the longer side becomes 1.0.

use serde::{Deserialize, Serialize};
use shared::{BoundingBox, GeoPoint, Point2D};

use crate::geometry::{lerp, path_length, EPSILON};

/// Native unit of a path handed to the normalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathUnit {
    /// Screen pixels, y grows downward
    Pixels,
    /// Planar coordinates with y growing upward (meters, unit frames, ...)
    Planar,
}

/// Fixed-count, unit-scaled point sequence; all coordinates lie in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPath {
    points: Vec<Point2D>,
}

impl NormalizedPath {
    /// Wrap points that already lie in the unit square; `None` otherwise
    pub fn from_unit_points(points: Vec<Point2D>) -> Option<Self> {
        let inside = |v: f64| (0.0..=1.0).contains(&v);
        points
            .iter()
            .all(|p| inside(p.x) && inside(p.y))
            .then_some(Self { points })
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Point2D> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point2D> {
        self.points.last()
    }

    /// Width / height; large for flat paths
    pub fn aspect_ratio(&self) -> f64 {
        match BoundingBox::from_points(&self.points) {
            Some(b) => b.width() / b.height().max(1e-6),
            None => 1.0,
        }
    }

    /// Start-to-end distance over path length; 0 for a zero-length path
    pub fn straightness(&self) -> f64 {
        let total = path_length(&self.points);
        match (self.first(), self.last()) {
            (Some(a), Some(b)) if total > EPSILON => (a.distance(b) / total).min(1.0),
            _ => 0.0,
        }
    }
}

/// Resamples and scales paths into `NormalizedPath`s
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathNormalizer {
    sample_count: usize,
}

impl Default for PathNormalizer {
    fn default() -> Self {
        Self::new(16)
    }
}

impl PathNormalizer {
    /// `sample_count` is raised to at least 2
    pub fn new(sample_count: usize) -> Self {
        Self {
            sample_count: sample_count.max(2),
        }
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Normalize a planar path given in `unit`
    pub fn normalize(&self, points: &[Point2D], unit: PathUnit) -> NormalizedPath {
        let planar: Vec<Point2D> = match unit {
            PathUnit::Pixels => points.iter().map(|p| Point2D::new(p.x, -p.y)).collect(),
            PathUnit::Planar => points.to_vec(),
        };
        self.finish(&planar)
    }

    /// Normalize a geographic path (projected around its mid latitude)
    pub fn normalize_geo(&self, points: &[GeoPoint]) -> NormalizedPath {
        self.finish(&project_geo(points))
    }

    fn finish(&self, planar: &[Point2D]) -> NormalizedPath {
        let resampled = resample(planar, self.sample_count);
        NormalizedPath {
            points: to_unit_square(&resampled),
        }
    }
}

/// Translate to the bounding-box origin and scale by the larger dimension.
///
/// Aspect ratio is preserved. A path without extent collapses onto the origin.
pub fn to_unit_square(points: &[Point2D]) -> Vec<Point2D> {
    let Some(bbox) = BoundingBox::from_points(points) else {
        return Vec::new();
    };
    let scale = bbox.max_dimension();
    if scale <= EPSILON {
        return vec![Point2D::default(); points.len()];
    }
    points
        .iter()
        .map(|p| {
            Point2D::new(
                ((p.x - bbox.min_x) / scale).clamp(0.0, 1.0),
                ((p.y - bbox.min_y) / scale).clamp(0.0, 1.0),
            )
        })
        .collect()
}

/// Resample to `count` points evenly spaced along the arc length.
///
/// First and last points are kept. A single point or a zero-length path yields
/// `count` copies of the first point.
pub fn resample(points: &[Point2D], count: usize) -> Vec<Point2D> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![*first];
    }

    let mut cumulative = Vec::with_capacity(points.len());
    cumulative.push(0.0);
    for w in points.windows(2) {
        let prev = cumulative[cumulative.len() - 1];
        cumulative.push(prev + w[0].distance(&w[1]));
    }
    let total = cumulative[cumulative.len() - 1];
    if points.len() == 1 || total <= EPSILON {
        return vec![*first; count];
    }

    let step = total / (count - 1) as f64;
    let mut out = Vec::with_capacity(count);
    out.push(*first);
    let mut seg = 0;
    for k in 1..count - 1 {
        let target = step * k as f64;
        while seg + 2 < points.len() && cumulative[seg + 1] < target {
            seg += 1;
        }
        let seg_len = cumulative[seg + 1] - cumulative[seg];
        let p = if seg_len <= EPSILON {
            points[seg + 1]
        } else {
            let t = ((target - cumulative[seg]) / seg_len).clamp(0.0, 1.0);
            lerp(&points[seg], &points[seg + 1], t)
        };
        out.push(p);
    }
    out.push(points[points.len() - 1]);
    out
}

/// Equirectangular projection around the path's mid latitude (x = east, y = north)
pub fn project_geo(points: &[GeoPoint]) -> Vec<Point2D> {
    if points.is_empty() {
        return Vec::new();
    }
    let (min_lat, max_lat) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.lat), hi.max(p.lat))
        });
    let cos_lat = ((min_lat + max_lat) / 2.0).to_radians().cos();
    points
        .iter()
        .map(|p| Point2D::new(p.lon * cos_lat, p.lat))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2D {
        Point2D::new(x, y)
    }

    #[test]
    fn test_resample_straight_line_evenly() {
        let pts = vec![p(0.0, 0.0), p(10.0, 0.0)];
        let out = resample(&pts, 11);
        assert_eq!(out.len(), 11);
        for (i, q) in out.iter().enumerate() {
            assert!((q.x - i as f64).abs() < 1e-9, "{} -> {:?}", i, q);
        }
    }

    #[test]
    fn test_resample_keeps_endpoints() {
        let pts = vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 5.0), p(-3.0, 5.0)];
        let out = resample(&pts, 7);
        assert_eq!(out[0], pts[0]);
        assert_eq!(out[6], pts[3]);
    }

    #[test]
    fn test_resample_skips_duplicate_points() {
        let pts = vec![p(0.0, 0.0), p(0.0, 0.0), p(4.0, 0.0), p(4.0, 0.0)];
        let out = resample(&pts, 5);
        assert_eq!(out.len(), 5);
        assert!((out[1].x - 1.0).abs() < 1e-9);
        assert!((out[3].x - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_resample_degenerate() {
        assert!(resample(&[], 8).is_empty());
        let out = resample(&[p(2.0, 3.0), p(2.0, 3.0)], 4);
        assert_eq!(out, vec![p(2.0, 3.0); 4]);
    }

    #[test]
    fn test_unit_square_preserves_aspect() {
        let pts = vec![p(10.0, 10.0), p(50.0, 10.0), p(50.0, 30.0)];
        let out = to_unit_square(&pts);
        assert_eq!(out[0], p(0.0, 0.0));
        assert_eq!(out[1], p(1.0, 0.0));
        assert!((out[2].y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_normalized_is_scale_and_translation_invariant() {
        let normalizer = PathNormalizer::new(12);
        let small = vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 5.0)];
        let big: Vec<Point2D> = small.iter().map(|q| p(q.x * 7.0 + 300.0, q.y * 7.0 - 40.0)).collect();
        let a = normalizer.normalize(&small, PathUnit::Pixels);
        let b = normalizer.normalize(&big, PathUnit::Pixels);
        for (qa, qb) in a.points().iter().zip(b.points()) {
            assert!(qa.distance(qb) < 1e-9);
        }
    }

    #[test]
    fn test_pixels_are_flipped_to_y_up() {
        let normalizer = PathNormalizer::new(2);
        // drawn downward on screen → ends at the bottom in a y-up frame
        let path = normalizer.normalize(&[p(0.0, 0.0), p(0.0, 10.0)], PathUnit::Pixels);
        assert_eq!(path.points()[0], p(0.0, 1.0));
        assert_eq!(path.points()[1], p(0.0, 0.0));
    }

    #[test]
    fn test_normalized_points_in_unit_square() {
        let normalizer = PathNormalizer::default();
        let geo = vec![
            GeoPoint::new(52.50, 13.40),
            GeoPoint::new(52.51, 13.42),
            GeoPoint::new(52.49, 13.45),
        ];
        let path = normalizer.normalize_geo(&geo);
        assert_eq!(path.len(), 16);
        assert!(path
            .points()
            .iter()
            .all(|q| (0.0..=1.0).contains(&q.x) && (0.0..=1.0).contains(&q.y)));
    }

    #[test]
    fn test_from_unit_points_rejects_outside() {
        assert!(NormalizedPath::from_unit_points(vec![p(0.0, 0.0), p(1.0, 0.5)]).is_some());
        assert!(NormalizedPath::from_unit_points(vec![p(0.0, 0.0), p(1.2, 0.5)]).is_none());
        assert!(NormalizedPath::from_unit_points(vec![p(f64::NAN, 0.0)]).is_none());
    }

    #[test]
    fn test_straightness_and_aspect() {
        let normalizer = PathNormalizer::new(8);
        let line = normalizer.normalize(&[p(0.0, 0.0), p(10.0, 0.0)], PathUnit::Planar);
        assert!((line.straightness() - 1.0).abs() < 1e-9);
        assert!(line.aspect_ratio() > 1000.0);

        // four samples land exactly on the U's corners
        let u = PathNormalizer::new(4).normalize(
            &[p(0.0, 10.0), p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0)],
            PathUnit::Planar,
        );
        assert!((u.straightness() - 10.0 / 30.0).abs() < 1e-9);
        assert!((u.aspect_ratio() - 1.0).abs() < 1e-9);
    }
}
