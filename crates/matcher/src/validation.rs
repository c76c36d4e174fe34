//! Drawing validation.
//!
//! `DrawingValidator` checks that a drawing carries enough geometry to be
//! analyzed and pairs every issue with a recommendation the user can act on.

use shared::{BoundingBox, Drawing};

use crate::analyzer::AnalyzerConfig;
use crate::error::MatchError;

/// Issues found in a drawing, each paired with a remediation hint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    fn push(&mut self, issue: String, recommendation: &str) {
        self.issues.push(issue);
        if !self.recommendations.iter().any(|r| r == recommendation) {
            self.recommendations.push(recommendation.to_string());
        }
    }

    /// `Ok` for a clean report, `InsufficientData` otherwise
    pub fn into_result(self) -> Result<(), MatchError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(MatchError::InsufficientData {
                issues: self.issues,
                recommendations: self.recommendations,
            })
        }
    }
}

/// Validator for `Drawing` input
pub struct DrawingValidator<'a> {
    drawing: &'a Drawing,
    config: &'a AnalyzerConfig,
}

impl<'a> DrawingValidator<'a> {
    pub fn new(drawing: &'a Drawing, config: &'a AnalyzerConfig) -> Self {
        Self { drawing, config }
    }

    pub fn has_strokes(&self) -> bool {
        !self.drawing.strokes.is_empty()
    }

    /// At least one stroke with two or more points
    pub fn has_continuous_stroke(&self) -> bool {
        self.drawing.strokes.iter().any(|s| s.points.len() >= 2)
    }

    pub fn are_coordinates_finite(&self) -> bool {
        self.drawing
            .strokes
            .iter()
            .all(|s| s.points.iter().all(|p| p.is_finite()))
    }

    /// Run all checks
    pub fn validate_all(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        if !self.has_strokes() {
            report.push(
                "Drawing contains no strokes".to_string(),
                "Draw a shape on the canvas before searching",
            );
            return report;
        }

        if !self.has_continuous_stroke() {
            report.push(
                "No stroke has at least two points".to_string(),
                "Draw with one continuous motion instead of tapping",
            );
        }

        if !self.are_coordinates_finite() {
            report.push(
                "Drawing contains invalid coordinates".to_string(),
                "Clear the canvas and draw the shape again",
            );
            return report;
        }

        let count = self.drawing.point_count();
        if count < self.config.min_points {
            report.push(
                format!(
                    "Drawing has only {} point(s); at least {} are required",
                    count, self.config.min_points
                ),
                "Draw a longer stroke so the shape has more detail",
            );
        }

        if let Some(bbox) = BoundingBox::from_points(&self.drawing.flatten()) {
            let min = self.config.min_dimension_px;
            if bbox.width() <= min {
                report.push(
                    format!(
                        "Shape is too narrow ({:.1} px wide, must exceed {:.0} px)",
                        bbox.width(),
                        min
                    ),
                    "Draw the shape larger so both its width and height are visible",
                );
            }
            if bbox.height() <= min {
                report.push(
                    format!(
                        "Shape is too flat ({:.1} px tall, must exceed {:.0} px)",
                        bbox.height(),
                        min
                    ),
                    "Draw the shape larger so both its width and height are visible",
                );
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Point2D, Stroke};

    fn validate(drawing: &Drawing) -> ValidationReport {
        let config = AnalyzerConfig::default();
        DrawingValidator::new(drawing, &config).validate_all()
    }

    #[test]
    fn test_valid_drawing() {
        let d = Drawing::from_points(&[(0.0, 0.0), (50.0, 0.0), (50.0, 40.0)]);
        let report = validate(&d);
        assert!(report.is_valid(), "{:?}", report);
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_empty_drawing() {
        let report = validate(&Drawing::default());
        assert_eq!(report.issues, vec!["Drawing contains no strokes".to_string()]);
        assert_eq!(report.recommendations.len(), 1);
    }

    #[test]
    fn test_taps_only() {
        let d = Drawing::new(vec![
            Stroke::new(vec![Point2D::new(0.0, 0.0)]),
            Stroke::new(vec![Point2D::new(40.0, 40.0)]),
        ]);
        let report = validate(&d);
        assert!(report.issues.iter().any(|i| i.contains("two points")));
        assert!(report.issues.iter().any(|i| i.contains("only 2 point")));
    }

    #[test]
    fn test_flat_drawing_reports_height() {
        let d = Drawing::from_points(&[(0.0, 0.0), (50.0, 1.0), (100.0, 0.0)]);
        let report = validate(&d);
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].contains("too flat"));
    }

    #[test]
    fn test_dimension_at_minimum_is_rejected() {
        let exact = Drawing::from_points(&[(0.0, 0.0), (5.0, 20.0), (0.0, 40.0)]);
        let report = validate(&exact);
        assert_eq!(report.issues.len(), 1, "{:?}", report);
        assert!(report.issues[0].contains("too narrow"));

        let wider = Drawing::from_points(&[(0.0, 0.0), (5.001, 20.0), (0.0, 40.0)]);
        assert!(validate(&wider).is_valid());
    }

    #[test]
    fn test_tiny_drawing_dedupes_recommendations() {
        let d = Drawing::from_points(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        let report = validate(&d);
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.recommendations.len(), 1);
    }

    #[test]
    fn test_non_finite_coordinates() {
        let d = Drawing::from_points(&[(0.0, 0.0), (f64::NAN, 10.0), (20.0, 20.0)]);
        let report = validate(&d);
        assert!(report.issues.iter().any(|i| i.contains("invalid coordinates")));
        match report.into_result() {
            Err(MatchError::InsufficientData { issues, .. }) => assert!(!issues.is_empty()),
            other => panic!("expected InsufficientData, got {:?}", other),
        }
    }
}
