//! Cosmetic shape classification.
//!
//! A small decision tree over the closed flag, corner count, corner-angle
//! spread, radial spread around the centroid and total winding. The label is
//! shown to users and fed to prompts; nothing in matching reads it.

use shared::{Classification, Corner, Point2D, ShapeClass};
use std::f64::consts::PI;

use crate::analyzer::variance;
use crate::geometry::{path_length, polyline_centroid, turn_sign, turning_angle, EPSILON};

/// Closed paths with less radial spread than this read as circles
const CIRCLE_MAX_RADIAL_CV: f64 = 0.15;
/// Open paths at least this straight read as lines
const LINE_MIN_STRAIGHTNESS: f64 = 0.9;
/// Fraction of consecutive corners that must flip turn direction for a zigzag
const ZIGZAG_MIN_ALTERNATION: f64 = 0.7;
/// Full turns an open path must wind through to count as a spiral
const SPIRAL_MIN_TURNS: f64 = 1.1;

/// Classify a flattened path.
///
/// `points` are the unit-square points; `corners` index into the same sequence.
pub fn classify(points: &[Point2D], corners: &[Corner], is_closed: bool) -> Classification {
    let length = path_length(points);
    if points.len() < 3 || length <= EPSILON {
        return label(ShapeClass::Line, 0.3);
    }

    if is_closed {
        classify_closed(points, corners)
    } else {
        classify_open(points, corners, length)
    }
}

fn classify_closed(points: &[Point2D], corners: &[Corner]) -> Classification {
    let cv = radial_cv(points);
    match corners.len() {
        n if n <= 2 && cv < CIRCLE_MAX_RADIAL_CV => {
            label(ShapeClass::Circle, (1.0 - cv * 2.0).clamp(0.5, 0.95))
        }
        3 => label(
            ShapeClass::Triangle,
            0.5 + 0.45 * angle_regularity(corners, 60.0),
        ),
        4 => label(
            ShapeClass::Rectangle,
            0.5 + 0.45 * angle_regularity(corners, 90.0),
        ),
        n if n <= 2 => label(ShapeClass::Circle, 0.45),
        _ => label(ShapeClass::Complex, 0.5),
    }
}

fn classify_open(points: &[Point2D], corners: &[Corner], length: f64) -> Classification {
    let straightness = match (points.first(), points.last()) {
        (Some(a), Some(b)) => (a.distance(b) / length).min(1.0),
        _ => 0.0,
    };
    if straightness >= LINE_MIN_STRAIGHTNESS {
        return label(ShapeClass::Line, straightness);
    }

    if corners.len() >= 3 {
        let alternation = corner_alternation(points, corners);
        if alternation >= ZIGZAG_MIN_ALTERNATION {
            return label(ShapeClass::Zigzag, 0.4 + 0.5 * alternation);
        }
    }

    let (turns, consistency) = winding(points);
    if turns >= SPIRAL_MIN_TURNS && consistency >= 0.9 {
        return label(ShapeClass::Spiral, (0.5 + 0.2 * turns).min(0.9));
    }

    if corners.len() <= 1 {
        label(ShapeClass::Curve, 0.6)
    } else {
        label(ShapeClass::Complex, 0.4)
    }
}

fn label(class: ShapeClass, confidence: f64) -> Classification {
    Classification {
        class,
        confidence: confidence.clamp(0.0, 1.0),
    }
}

/// Coefficient of variation of the distances to the centroid
fn radial_cv(points: &[Point2D]) -> f64 {
    let c = polyline_centroid(points);
    let radii: Vec<f64> = points.iter().map(|p| p.distance(&c)).collect();
    let mean = radii.iter().sum::<f64>() / radii.len() as f64;
    if mean <= EPSILON {
        return f64::INFINITY;
    }
    variance(&radii).sqrt() / mean
}

/// 1.0 when every corner angle equals `target`, falling off with spread and bias
fn angle_regularity(corners: &[Corner], target: f64) -> f64 {
    if corners.is_empty() {
        return 0.0;
    }
    let angles: Vec<f64> = corners.iter().map(|c| c.angle_deg).collect();
    let mean = angles.iter().sum::<f64>() / angles.len() as f64;
    let bias = 1.0 - ((mean - target).abs() / target).min(1.0);
    let spread = 1.0 - (variance(&angles).sqrt() / 45.0).min(1.0);
    bias * spread
}

/// Fraction of consecutive corner pairs that turn in opposite directions
fn corner_alternation(points: &[Point2D], corners: &[Corner]) -> f64 {
    let signs: Vec<f64> = corners
        .iter()
        .filter(|c| c.index > 0 && c.index + 1 < points.len())
        .map(|c| turn_sign(&points[c.index - 1], &points[c.index], &points[c.index + 1]))
        .collect();
    if signs.len() < 2 {
        return 0.0;
    }
    let flips = signs.windows(2).filter(|w| w[0] * w[1] < 0.0).count();
    flips as f64 / (signs.len() - 1) as f64
}

/// Net full turns and the share of turning that goes in the net direction
fn winding(points: &[Point2D]) -> (f64, f64) {
    let angles: Vec<f64> = points
        .windows(3)
        .map(|w| turning_angle(&w[0], &w[1], &w[2]))
        .collect();
    let net: f64 = angles.iter().sum();
    let total: f64 = angles.iter().map(|a| a.abs()).sum();
    if total <= EPSILON {
        return (0.0, 0.0);
    }
    let along: f64 = angles
        .iter()
        .filter(|a| a.signum() == net.signum())
        .map(|a| a.abs())
        .sum();
    (net.abs() / (2.0 * PI), along / total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::ShapeAnalyzer;
    use crate::fixtures;
    use shared::Drawing;

    fn class_of(drawing: &Drawing) -> ShapeClass {
        ShapeAnalyzer::default()
            .analyze(drawing)
            .unwrap()
            .classification
            .class
    }

    #[test]
    fn test_fixture_classes() {
        assert_eq!(class_of(&fixtures::square_drawing()), ShapeClass::Rectangle);
        assert_eq!(class_of(&fixtures::circle_drawing(32, 80.0)), ShapeClass::Circle);
        assert_eq!(class_of(&fixtures::triangle_drawing()), ShapeClass::Triangle);
        assert_eq!(class_of(&fixtures::line_drawing()), ShapeClass::Line);
        assert_eq!(class_of(&fixtures::zigzag_drawing()), ShapeClass::Zigzag);
        assert_eq!(class_of(&fixtures::spiral_drawing()), ShapeClass::Spiral);
    }

    #[test]
    fn test_regular_square_is_confident() {
        let features = ShapeAnalyzer::default()
            .analyze(&fixtures::square_drawing())
            .unwrap();
        assert!(features.classification.confidence > 0.9);
    }

    #[test]
    fn test_degenerate_input_is_low_confidence_line() {
        let c = classify(&[Point2D::new(0.5, 0.5); 4], &[], false);
        assert_eq!(c.class, ShapeClass::Line);
        assert!(c.confidence < 0.5);
    }

    #[test]
    fn test_open_arc_is_curve() {
        let arc: Vec<Point2D> = (0..=20)
            .map(|i| {
                let t = PI * i as f64 / 20.0;
                Point2D::new(0.5 + 0.5 * t.cos(), 0.5 * t.sin())
            })
            .collect();
        assert_eq!(classify(&arc, &[], false).class, ShapeClass::Curve);
    }
}
