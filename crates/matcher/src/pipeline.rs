//! The matching pipeline: analyze → collect → score → aggregate.

use shared::{CreativityProfile, Drawing, GeoPoint, RawGeometry, Route, ShapeFeatures, TransportMode};

use crate::aggregate::{ScoreAggregator, ScoredCandidate};
use crate::analyzer::ShapeAnalyzer;
use crate::collector::{CandidateCollector, CandidateQuery, RouteCandidate};
use crate::config::MatcherConfig;
use crate::error::MatchError;
use crate::normalize::{NormalizedPath, PathNormalizer, PathUnit};
use crate::similarity::SimilarityEngine;

/// Analyze a drawing with the default configuration
pub fn analyze_shape(drawing: &Drawing) -> Result<ShapeFeatures, MatchError> {
    ShapeAnalyzer::default().analyze(drawing)
}

/// Stateless matcher; safe to share across requests
#[derive(Debug)]
pub struct RouteMatcher {
    config: MatcherConfig,
    analyzer: ShapeAnalyzer,
    normalizer: PathNormalizer,
    engine: SimilarityEngine,
}

impl RouteMatcher {
    pub fn new(config: MatcherConfig) -> Result<Self, MatchError> {
        config.validate()?;
        Ok(Self {
            analyzer: ShapeAnalyzer::new(config.analyzer.clone()),
            normalizer: PathNormalizer::new(config.sample_count),
            engine: SimilarityEngine::new(&config.scoring.metrics, &config.analyzer),
            config,
        })
    }

    /// Swap in a custom similarity engine
    pub fn with_engine(mut self, engine: SimilarityEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &PathNormalizer {
        &self.normalizer
    }

    pub fn analyze_shape(&self, drawing: &Drawing) -> Result<ShapeFeatures, MatchError> {
        self.analyzer.analyze(drawing)
    }

    /// The drawing as the engine sees it
    pub fn shape_path(&self, features: &ShapeFeatures) -> NormalizedPath {
        self.normalizer.normalize(&features.normalized_path, PathUnit::Pixels)
    }

    pub fn collector(&self) -> CandidateCollector<'_> {
        CandidateCollector::new(&self.config.collector, self.normalizer)
    }

    /// Primary collection query: configured radius, length filter on
    pub fn candidate_query(
        &self,
        features: &ShapeFeatures,
        center: GeoPoint,
        mode: TransportMode,
    ) -> CandidateQuery {
        let expected = self.collector().expected_length_km(features, mode);
        CandidateQuery::new(center, mode, self.config.collector.radius_km).with_expected_length(expected)
    }

    pub fn collect_candidates(
        &self,
        features: &ShapeFeatures,
        geometries: &[RawGeometry],
        center: GeoPoint,
        mode: TransportMode,
    ) -> Vec<RouteCandidate> {
        let query = self.candidate_query(features, center, mode);
        self.collector().collect(geometries, &query)
    }

    /// Every candidate with its metric scores, aggregate and confidence, in
    /// candidate order and unfiltered
    pub fn score_candidates<'c>(
        &self,
        features: &ShapeFeatures,
        candidates: &'c [RouteCandidate],
        profile: CreativityProfile,
    ) -> Vec<ScoredCandidate<'c>> {
        let shape = self.shape_path(features);
        let scores = self.engine.score_all(&shape, candidates);
        ScoreAggregator::new(&self.config.scoring).combine(candidates, &scores, profile)
    }

    /// Rank already-fetched geometries against the shape.
    ///
    /// Pure: no I/O, deterministic for identical inputs. May return an empty
    /// list; the fallback chain decides what happens then.
    pub fn find_matching_routes(
        &self,
        features: &ShapeFeatures,
        geometries: &[RawGeometry],
        center: GeoPoint,
        mode: TransportMode,
        profile: CreativityProfile,
    ) -> Vec<Route> {
        let candidates = self.collect_candidates(features, geometries, center, mode);
        if candidates.is_empty() {
            tracing::debug!(geometries = geometries.len(), "no usable candidates");
            return Vec::new();
        }
        let aggregator = ScoreAggregator::new(&self.config.scoring);
        let scored = self.score_candidates(features, &candidates, profile);
        let ranked = aggregator.rank(scored, profile);
        let summary = features.summary();
        let routes: Vec<Route> = ranked
            .iter()
            .enumerate()
            .map(|(i, s)| aggregator.format(s, i, &summary))
            .collect();
        tracing::info!(
            geometries = geometries.len(),
            candidates = candidates.len(),
            routes = routes.len(),
            ?profile,
            "matched routes"
        );
        routes
    }
}

impl Default for RouteMatcher {
    fn default() -> Self {
        let config = MatcherConfig::default();
        Self {
            analyzer: ShapeAnalyzer::new(config.analyzer.clone()),
            normalizer: PathNormalizer::new(config.sample_count),
            engine: SimilarityEngine::new(&config.scoring.metrics, &config.analyzer),
            config,
        }
    }
}
