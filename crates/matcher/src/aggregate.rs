//! Score aggregation: weights, confidence, filtering, ranking and formatting.

use serde::{Deserialize, Serialize};
use shared::{ConfidenceTier, CreativityProfile, CreativityTable, Route, RouteSource, ShapeSummary};

use crate::collector::RouteCandidate;
use crate::similarity::{MetricConfig, MetricScores};

/// Weight of the aggregate in the ranking key; confidence gets the rest
const RANK_AGGREGATE_WEIGHT: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub creativity: CreativityTable,
    /// Candidates below this confidence are dropped regardless of profile
    pub confidence_floor: f64,
    pub max_results: usize,
    /// Metrics below this are reported as matching issues
    pub weak_metric_threshold: f64,
    pub metrics: MetricConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            creativity: CreativityTable::default(),
            confidence_floor: 0.2,
            max_results: 5,
            weak_metric_threshold: 0.3,
            metrics: MetricConfig::default(),
        }
    }
}

/// A candidate with the derived fields the aggregator attaches
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate<'a> {
    pub candidate: &'a RouteCandidate,
    pub scores: MetricScores,
    /// Profile-weighted sum of the metrics
    pub aggregate: f64,
    pub confidence: f64,
}

impl ScoredCandidate<'_> {
    pub fn rank_key(&self) -> f64 {
        RANK_AGGREGATE_WEIGHT * self.aggregate + (1.0 - RANK_AGGREGATE_WEIGHT) * self.confidence
    }
}

/// `mean × (1 − stddev)`: high only when the metrics agree
pub fn confidence(scores: &MetricScores) -> f64 {
    (scores.mean() * (1.0 - scores.stddev())).clamp(0.0, 1.0)
}

pub struct ScoreAggregator<'a> {
    config: &'a ScoringConfig,
}

impl<'a> ScoreAggregator<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self { config }
    }

    /// Attach aggregate and confidence to each candidate, keeping order
    pub fn combine<'c>(
        &self,
        candidates: &'c [RouteCandidate],
        scores: &[MetricScores],
        profile: CreativityProfile,
    ) -> Vec<ScoredCandidate<'c>> {
        let weights = &self.config.creativity.get(profile).weights;
        candidates
            .iter()
            .zip(scores)
            .map(|(candidate, scores)| ScoredCandidate {
                candidate,
                scores: *scores,
                aggregate: scores.weighted(weights).clamp(0.0, 1.0),
                confidence: confidence(scores),
            })
            .collect()
    }

    /// Drop candidates under the profile minimum or the confidence floor, then
    /// stable-sort by rank key (ties keep candidate order) and cap
    pub fn rank<'c>(
        &self,
        mut scored: Vec<ScoredCandidate<'c>>,
        profile: CreativityProfile,
    ) -> Vec<ScoredCandidate<'c>> {
        let min_similarity = self.config.creativity.get(profile).min_similarity;
        let before = scored.len();
        scored.retain(|s| s.aggregate >= min_similarity && s.confidence >= self.config.confidence_floor);
        tracing::debug!(
            kept = scored.len(),
            dropped = before - scored.len(),
            min_similarity,
            "filtered scored candidates"
        );
        scored.sort_by(|a, b| {
            b.rank_key()
                .total_cmp(&a.rank_key())
                .then(a.candidate.index.cmp(&b.candidate.index))
        });
        scored.truncate(self.config.max_results);
        scored
    }

    /// Present one ranked candidate as a `Route`; `position` is zero-based
    pub fn format(&self, scored: &ScoredCandidate<'_>, position: usize, shape: &ShapeSummary) -> Route {
        let candidate = scored.candidate;
        let tier = ConfidenceTier::from_confidence(scored.confidence);
        let along = candidate.way_class.as_deref().unwrap_or("mixed paths");
        Route {
            route_name: route_name(candidate, position),
            description: format!(
                "{}, traced along {} ({} confidence match)",
                shape.describe(),
                along,
                tier.label()
            ),
            distance_km: round_to(candidate.distance_km, 2),
            duration_min: candidate.estimated_duration_min.round(),
            similarity_score: round_to(scored.aggregate, 3),
            geometric_similarity: Some(round_to(scored.scores.mean(), 3)),
            path: candidate.geo_path.clone(),
            matching_issues: self.matching_issues(scored),
            confidence_tier: Some(tier),
            source: RouteSource::Matched,
        }
    }

    fn matching_issues(&self, scored: &ScoredCandidate<'_>) -> Option<Vec<String>> {
        let mut issues: Vec<String> = scored
            .scores
            .weak(self.config.weak_metric_threshold)
            .into_iter()
            .map(|kind| format!("Weak {} ({:.2})", kind.label(), scored.scores.get(kind)))
            .collect();
        if ConfidenceTier::from_confidence(scored.confidence) == ConfidenceTier::Low {
            issues.push(format!(
                "Similarity metrics disagree (confidence {:.2})",
                scored.confidence
            ));
        }
        (!issues.is_empty()).then_some(issues)
    }

    /// Combine, rank and format in one pass
    pub fn aggregate(
        &self,
        candidates: &[RouteCandidate],
        scores: &[MetricScores],
        profile: CreativityProfile,
        shape: &ShapeSummary,
    ) -> Vec<Route> {
        let ranked = self.rank(self.combine(candidates, scores, profile), profile);
        ranked
            .iter()
            .enumerate()
            .map(|(i, s)| self.format(s, i, shape))
            .collect()
    }
}

fn route_name(candidate: &RouteCandidate, position: usize) -> String {
    match (&candidate.name, &candidate.way_class) {
        (Some(name), _) => name.clone(),
        (None, Some(class)) => format!("Unnamed {}", class.replace('_', " ")),
        (None, None) => format!("Route {}", position + 1),
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::NormalizedPath;
    use shared::{GeoPoint, Point2D, ShapeClass, Symmetry};
    use std::collections::BTreeMap;

    fn candidate(index: usize, name: Option<&str>, way_class: Option<&str>) -> RouteCandidate {
        RouteCandidate {
            index,
            name: name.map(str::to_string),
            way_class: way_class.map(str::to_string),
            tags: BTreeMap::new(),
            geo_path: vec![GeoPoint::new(52.5, 13.4), GeoPoint::new(52.51, 13.4)],
            distance_km: 1.23456,
            estimated_duration_min: 14.8,
            normalized: NormalizedPath::from_unit_points(vec![
                Point2D::new(0.0, 0.0),
                Point2D::new(0.0, 1.0),
            ])
            .unwrap(),
        }
    }

    fn summary() -> ShapeSummary {
        ShapeSummary {
            class: ShapeClass::Rectangle,
            class_confidence: 0.9,
            is_closed: true,
            corner_count: 4,
            sharp_turns: 0,
            aspect_ratio: 1.0,
            complexity: 0.3,
            symmetry: Symmetry::default(),
        }
    }

    #[test]
    fn test_confidence_penalizes_disagreement() {
        assert!((confidence(&MetricScores::uniform(0.8)) - 0.8).abs() < 1e-12);
        let split = MetricScores::from_array([1.0, 1.0, 0.0, 0.0, 0.5]);
        let expected = 0.5 * (1.0 - 0.2f64.sqrt());
        assert!((confidence(&split) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_filter_by_profile_minimum_and_floor() {
        let config = ScoringConfig::default();
        let aggregator = ScoreAggregator::new(&config);
        let candidates = vec![candidate(0, Some("a"), None), candidate(1, Some("b"), None)];
        let scores = vec![MetricScores::uniform(0.6), MetricScores::uniform(0.3)];

        let strict = aggregator.rank(
            aggregator.combine(&candidates, &scores, CreativityProfile::Strict),
            CreativityProfile::Strict,
        );
        assert!(strict.is_empty());

        let creative = aggregator.rank(
            aggregator.combine(&candidates, &scores, CreativityProfile::Creative),
            CreativityProfile::Creative,
        );
        assert_eq!(creative.len(), 2);

        // passes the creative minimum (0.3) but confidence is 0.2 · 0.6 = 0.12
        let disagreeing = vec![MetricScores::from_array([0.0, 0.0, 1.0, 0.0, 0.0]); 2];
        let floored = aggregator.rank(
            aggregator.combine(&candidates, &disagreeing, CreativityProfile::Creative),
            CreativityProfile::Creative,
        );
        assert!(floored.is_empty(), "confidence {:?}", confidence(&disagreeing[0]));
    }

    #[test]
    fn test_rank_is_stable_and_capped() {
        let config = ScoringConfig {
            max_results: 3,
            ..Default::default()
        };
        let aggregator = ScoreAggregator::new(&config);
        let candidates: Vec<_> = (0..5).map(|i| candidate(i, None, None)).collect();
        let scores = vec![
            MetricScores::uniform(0.7),
            MetricScores::uniform(0.9),
            MetricScores::uniform(0.7),
            MetricScores::uniform(0.7),
            MetricScores::uniform(0.8),
        ];
        let ranked = aggregator.rank(
            aggregator.combine(&candidates, &scores, CreativityProfile::Balanced),
            CreativityProfile::Balanced,
        );
        let order: Vec<_> = ranked.iter().map(|s| s.candidate.index).collect();
        assert_eq!(order, vec![1, 4, 0]);
    }

    #[test]
    fn test_format_rounds_and_names() {
        let config = ScoringConfig::default();
        let aggregator = ScoreAggregator::new(&config);
        let candidates = vec![
            candidate(0, None, Some("living_street")),
            candidate(1, None, None),
        ];
        let scores = vec![MetricScores::uniform(0.87654); 2];
        let routes = aggregator.aggregate(&candidates, &scores, CreativityProfile::Balanced, &summary());
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].route_name, "Unnamed living street");
        assert_eq!(routes[1].route_name, "Route 2");
        assert_eq!(routes[0].distance_km, 1.23);
        assert_eq!(routes[0].duration_min, 15.0);
        assert_eq!(routes[0].similarity_score, 0.877);
        assert_eq!(routes[0].confidence_tier, Some(ConfidenceTier::High));
        assert!(routes[0].matching_issues.is_none());
        assert!(routes[0].description.contains("rectangle"));
        assert_eq!(routes[0].source, RouteSource::Matched);
    }

    #[test]
    fn test_weak_metrics_reported() {
        let config = ScoringConfig::default();
        let aggregator = ScoreAggregator::new(&config);
        let candidates = vec![candidate(0, Some("Weak Way"), None)];
        let scores = vec![MetricScores::from_array([0.9, 0.9, 0.9, 0.9, 0.1])];
        let routes = aggregator.aggregate(&candidates, &scores, CreativityProfile::Creative, &summary());
        let issues = routes[0].matching_issues.clone().unwrap();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].starts_with("Weak point placement"));
    }
}
