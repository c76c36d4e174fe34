//! Factory functions for drawings and candidate geometries used in tests.
//!
//! Drawings are in pixel space (y grows downward). Geometry factories place
//! paths around a geographic center so they survive the collector's radius and
//! length checks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{Drawing, GeoPoint, Point2D, RawGeometry, ShapeFeatures};
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Search center used throughout the tests
pub const BERLIN: GeoPoint = GeoPoint {
    lat: 52.52,
    lon: 13.405,
};

// ── Drawings ────────────────────────────────────────────────────

/// 8-point single-stroke square that returns near its start.
pub fn square_drawing() -> Drawing {
    Drawing::from_points(&[
        (0.0, 0.0),
        (100.0, 0.0),
        (100.0, 50.0),
        (100.0, 100.0),
        (50.0, 100.0),
        (0.0, 100.0),
        (0.0, 50.0),
        (0.0, 5.0),
    ])
}

/// Closed polygon approximating a circle of `radius` pixels with `segments` edges.
pub fn circle_drawing(segments: usize, radius: f64) -> Drawing {
    let segments = segments.max(3);
    let points: Vec<(f64, f64)> = (0..=segments)
        .map(|i| {
            let t = 2.0 * PI * i as f64 / segments as f64;
            (radius + 10.0 + radius * t.cos(), radius + 10.0 + radius * t.sin())
        })
        .collect();
    Drawing::from_points(&points)
}

/// Closed triangle with its apex at the top of the canvas.
pub fn triangle_drawing() -> Drawing {
    Drawing::from_points(&[(0.0, 100.0), (50.0, 0.0), (100.0, 100.0), (0.0, 100.0)])
}

/// Straight diagonal stroke.
pub fn line_drawing() -> Drawing {
    let points: Vec<(f64, f64)> = (0..=8).map(|i| (i as f64 * 30.0, i as f64 * 3.0)).collect();
    Drawing::from_points(&points)
}

/// Open zigzag with four alternating sharp turns.
pub fn zigzag_drawing() -> Drawing {
    Drawing::from_points(&[
        (0.0, 100.0),
        (40.0, 0.0),
        (80.0, 100.0),
        (120.0, 0.0),
        (160.0, 100.0),
        (200.0, 0.0),
    ])
}

/// Archimedean spiral winding outward through two full turns.
pub fn spiral_drawing() -> Drawing {
    let steps = 80;
    let points: Vec<(f64, f64)> = (0..=steps)
        .map(|i| {
            let t = 4.0 * PI * i as f64 / steps as f64;
            let r = 5.0 + 10.0 * t;
            (200.0 + r * t.cos(), 200.0 + r * t.sin())
        })
        .collect();
    Drawing::from_points(&points)
}

/// Two strokes forming an "L"; exercises stroke flattening.
pub fn two_stroke_drawing() -> Drawing {
    Drawing::new(vec![
        shared::Stroke::new(vec![Point2D::new(0.0, 0.0), Point2D::new(0.0, 80.0)]),
        shared::Stroke::new(vec![Point2D::new(0.0, 80.0), Point2D::new(60.0, 80.0)]),
    ])
}

// ── Candidate geometries ────────────────────────────────────────

/// Street geometry with a `highway` tag.
pub fn street(name: &str, highway: &str, points: Vec<GeoPoint>) -> RawGeometry {
    let mut tags = BTreeMap::new();
    tags.insert("highway".to_string(), highway.to_string());
    RawGeometry {
        name: Some(name.to_string()),
        tags,
        points,
    }
}

/// Map a unit-square drawing path onto the ground, `extent_km` across, centered
/// on `center`. The result normalizes back to the drawing's own shape.
pub fn unit_path_to_geo(unit: &[Point2D], center: GeoPoint, extent_km: f64) -> Vec<GeoPoint> {
    let dlat = extent_km / 111.32;
    let dlon = dlat / center.lat.to_radians().cos();
    unit.iter()
        .map(|p| GeoPoint::new(center.lat + (0.5 - p.y) * dlat, center.lon + (p.x - 0.5) * dlon))
        .collect()
}

/// Candidate that is an exact copy of the analyzed drawing, 1 km across.
pub fn duplicate_geometry(features: &ShapeFeatures, center: GeoPoint) -> RawGeometry {
    street(
        "Duplicate Street",
        "footway",
        unit_path_to_geo(&features.normalized_path, center, 1.0),
    )
}

/// Path through `count` uniformly random points inside the same
/// 1 km box the duplicate occupies.
pub fn random_geometry(seed: u64, count: usize, center: GeoPoint) -> RawGeometry {
    let mut rng = StdRng::seed_from_u64(seed);
    let unit: Vec<Point2D> = (0..count)
        .map(|_| Point2D::new(rng.gen_range(0.0..=1.0), rng.gen_range(0.0..=1.0)))
        .collect();
    street(
        &format!("Random Path {}", seed),
        "footway",
        unit_path_to_geo(&unit, center, 1.0),
    )
}

/// Straight east-west street `length_km` long starting at `start`.
pub fn straight_street(name: &str, highway: &str, start: GeoPoint, length_km: f64) -> RawGeometry {
    let dlon = length_km / (111.32 * start.lat.to_radians().cos());
    let points = (0..=4)
        .map(|i| GeoPoint::new(start.lat, start.lon + dlon * i as f64 / 4.0))
        .collect();
    street(name, highway, points)
}
