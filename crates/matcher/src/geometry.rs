//! Planar and geographic helpers shared by the analyzer, normalizer and metrics.
//!
//! Planar math goes through kurbo (`Point`/`Vec2`), great-circle math through geo.

use geo::{Distance, Haversine};
use kurbo::{Point, Vec2};
use shared::{GeoPoint, Point2D};

/// Shorter edges are treated as zero length
pub const EPSILON: f64 = 1e-9;

// ============================================================================
// Kurbo helpers
// ============================================================================

/// Convert to kurbo Point
pub fn to_point(p: &Point2D) -> Point {
    Point::new(p.x, p.y)
}

/// Convert from kurbo Point
pub fn from_point(p: Point) -> Point2D {
    Point2D::new(p.x, p.y)
}

/// Polyline length
pub fn path_length(points: &[Point2D]) -> f64 {
    points.windows(2).map(|w| w[0].distance(&w[1])).sum()
}

/// Arithmetic mean of the points; origin for an empty slice
pub fn centroid(points: &[Point2D]) -> Point2D {
    if points.is_empty() {
        return Point2D::default();
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point2D::new(sx / n, sy / n)
}

/// Length-weighted centroid of the polyline (its "wire" centroid).
///
/// Insensitive to uneven point spacing; falls back to the point mean for a
/// zero-length path.
pub fn polyline_centroid(points: &[Point2D]) -> Point2D {
    let mut total = 0.0;
    let (mut sx, mut sy) = (0.0, 0.0);
    for w in points.windows(2) {
        let len = w[0].distance(&w[1]);
        sx += (w[0].x + w[1].x) / 2.0 * len;
        sy += (w[0].y + w[1].y) / 2.0 * len;
        total += len;
    }
    if total <= EPSILON {
        return centroid(points);
    }
    Point2D::new(sx / total, sy / total)
}

/// Interior angle at `cur` in degrees (180 = straight).
///
/// `None` when either adjacent edge has zero length.
pub fn vertex_angle_deg(prev: &Point2D, cur: &Point2D, next: &Point2D) -> Option<f64> {
    let a: Vec2 = to_point(prev) - to_point(cur);
    let b: Vec2 = to_point(next) - to_point(cur);
    let la = a.hypot();
    let lb = b.hypot();
    if la < EPSILON || lb < EPSILON {
        return None;
    }
    let cos = (a.dot(b) / (la * lb)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Signed turn direction at `cur`: positive for counter-clockwise in a y-up frame
pub fn turn_sign(prev: &Point2D, cur: &Point2D, next: &Point2D) -> f64 {
    let a: Vec2 = to_point(cur) - to_point(prev);
    let b: Vec2 = to_point(next) - to_point(cur);
    a.cross(b).signum()
}

/// Signed turning angle at `cur` in radians, in (-π, π]
pub fn turning_angle(prev: &Point2D, cur: &Point2D, next: &Point2D) -> f64 {
    let a: Vec2 = to_point(cur) - to_point(prev);
    let b: Vec2 = to_point(next) - to_point(cur);
    if a.hypot() < EPSILON || b.hypot() < EPSILON {
        return 0.0;
    }
    a.cross(b).atan2(a.dot(b))
}

/// Discrete (Menger) curvature of a point triple.
///
/// Returns 0 when any pairwise distance is zero or the triangle area is below
/// `min_area` (locally straight).
pub fn menger_curvature(p0: &Point2D, p1: &Point2D, p2: &Point2D, min_area: f64) -> f64 {
    let d01 = p0.distance(p1);
    let d12 = p1.distance(p2);
    let d02 = p0.distance(p2);
    if d01 < EPSILON || d12 < EPSILON || d02 < EPSILON {
        return 0.0;
    }
    let a: Vec2 = to_point(p1) - to_point(p0);
    let b: Vec2 = to_point(p2) - to_point(p0);
    let area = a.cross(b).abs() / 2.0;
    if area < min_area {
        return 0.0;
    }
    4.0 * area / (d01 * d12 * d02)
}

/// Distance from `p` to the segment `a`–`b`
pub fn point_segment_distance(p: &Point2D, a: &Point2D, b: &Point2D) -> f64 {
    let ab: Vec2 = to_point(b) - to_point(a);
    let ap: Vec2 = to_point(p) - to_point(a);
    let len_sq = ab.hypot2();
    if len_sq < EPSILON * EPSILON {
        return p.distance(a);
    }
    let t = (ap.dot(ab) / len_sq).clamp(0.0, 1.0);
    let closest = to_point(a) + ab * t;
    to_point(p).distance(closest)
}

/// Distance from `p` to the nearest point of the polyline
pub fn distance_to_polyline(p: &Point2D, points: &[Point2D]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => p.distance(only),
        _ => points
            .windows(2)
            .map(|w| point_segment_distance(p, &w[0], &w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Linear interpolation between two points
pub fn lerp(a: &Point2D, b: &Point2D, t: f64) -> Point2D {
    from_point(to_point(a).lerp(to_point(b), t))
}

// ============================================================================
// Geographic helpers
// ============================================================================

/// Great-circle distance in kilometers
pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let pa = geo::Point::new(a.lon, a.lat);
    let pb = geo::Point::new(b.lon, b.lat);
    Haversine::distance(pa, pb) / 1000.0
}

/// Great-circle length of a geographic polyline in kilometers
pub fn geo_path_length_km(points: &[GeoPoint]) -> f64 {
    points.windows(2).map(|w| haversine_km(&w[0], &w[1])).sum()
}

/// Mean latitude/longitude; `None` for an empty slice
pub fn geo_centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat, lon) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p.lat, lon + p.lon));
    Some(GeoPoint::new(lat / n, lon / n))
}

/// Point at `distance_km` and `bearing` (radians, clockwise from north) from `origin`.
///
/// Equirectangular offset; fine for the few-kilometer loops it is used for.
pub fn offset_km(origin: &GeoPoint, distance_km: f64, bearing: f64) -> GeoPoint {
    let dlat = distance_km * bearing.cos() / 111.32;
    let cos_lat = origin.lat.to_radians().cos().abs().max(1e-6);
    let dlon = distance_km * bearing.sin() / (111.32 * cos_lat);
    GeoPoint::new(origin.lat + dlat, origin.lon + dlon)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2D {
        Point2D::new(x, y)
    }

    #[test]
    fn test_path_length() {
        let pts = vec![p(0.0, 0.0), p(3.0, 4.0), p(3.0, 10.0)];
        assert!((path_length(&pts) - 11.0).abs() < 1e-12);
        assert_eq!(path_length(&pts[..1]), 0.0);
    }

    #[test]
    fn test_polyline_centroid_ignores_point_density() {
        // many points crowded on the left half of the segment
        let mut pts: Vec<Point2D> = (0..10).map(|i| p(i as f64 * 0.1, 0.0)).collect();
        pts.push(p(10.0, 0.0));
        assert!((polyline_centroid(&pts).x - 5.0).abs() < 1e-9);
        assert!(centroid(&pts).x < 2.0);
        assert_eq!(polyline_centroid(&[p(3.0, 4.0)]), p(3.0, 4.0));
    }

    #[test]
    fn test_vertex_angle() {
        let right = vertex_angle_deg(&p(0.0, 0.0), &p(1.0, 0.0), &p(1.0, 1.0)).unwrap();
        assert!((right - 90.0).abs() < 1e-9);

        let straight = vertex_angle_deg(&p(0.0, 0.0), &p(1.0, 0.0), &p(2.0, 0.0)).unwrap();
        assert!((straight - 180.0).abs() < 1e-9);

        assert!(vertex_angle_deg(&p(0.0, 0.0), &p(0.0, 0.0), &p(1.0, 0.0)).is_none());
    }

    #[test]
    fn test_turning_angle_sign() {
        let left = turning_angle(&p(0.0, 0.0), &p(1.0, 0.0), &p(1.0, 1.0));
        assert!((left - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        let right = turning_angle(&p(0.0, 0.0), &p(1.0, 0.0), &p(1.0, -1.0));
        assert!((right + std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert_eq!(turn_sign(&p(0.0, 0.0), &p(1.0, 0.0), &p(1.0, 1.0)), 1.0);
    }

    #[test]
    fn test_menger_curvature_of_circle_points() {
        // Three points on a circle of radius 2 → curvature 1/2
        let k = menger_curvature(&p(2.0, 0.0), &p(0.0, 2.0), &p(-2.0, 0.0), 1e-12);
        assert!((k - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_menger_curvature_degenerate() {
        assert_eq!(menger_curvature(&p(0.0, 0.0), &p(1.0, 0.0), &p(2.0, 0.0), 1e-12), 0.0);
        assert_eq!(menger_curvature(&p(0.0, 0.0), &p(0.0, 0.0), &p(2.0, 1.0), 1e-12), 0.0);
    }

    #[test]
    fn test_distance_to_polyline() {
        let line = vec![p(0.0, 0.0), p(10.0, 0.0)];
        assert!((distance_to_polyline(&p(5.0, 3.0), &line) - 3.0).abs() < 1e-12);
        assert!((distance_to_polyline(&p(-4.0, 3.0), &line) - 5.0).abs() < 1e-12);
        assert!(distance_to_polyline(&p(0.0, 0.0), &[]).is_infinite());
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        let d = haversine_km(&GeoPoint::new(0.0, 0.0), &GeoPoint::new(1.0, 0.0));
        assert!((d - 111.19).abs() < 0.1, "got {}", d);
    }

    #[test]
    fn test_offset_km_roundtrip_distance() {
        let origin = GeoPoint::new(52.52, 13.405);
        let east = offset_km(&origin, 2.0, std::f64::consts::FRAC_PI_2);
        let d = haversine_km(&origin, &east);
        assert!((d - 2.0).abs() < 0.02, "got {}", d);
        assert!(east.lon > origin.lon);
    }

    #[test]
    fn test_geo_centroid() {
        let pts = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(2.0, 4.0)];
        assert_eq!(geo_centroid(&pts), Some(GeoPoint::new(1.0, 2.0)));
        assert!(geo_centroid(&[]).is_none());
    }
}
