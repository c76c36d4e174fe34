// Drawing-to-route shape matching engine.
// Pure and synchronous apart from the async fallback driver; all network I/O
// lives in the caller.

pub mod aggregate;
pub mod analyzer;
pub mod classify;
pub mod collector;
pub mod config;
pub mod error;
pub mod fallback;
pub mod fixtures;
pub mod geometry;
pub mod normalize;
pub mod pipeline;
pub mod similarity;
pub mod validation;

pub use aggregate::{ScoreAggregator, ScoredCandidate, ScoringConfig};
pub use analyzer::{AnalyzerConfig, ShapeAnalyzer};
pub use collector::{CandidateCollector, CandidateQuery, CollectorConfig, RouteCandidate};
pub use config::MatcherConfig;
pub use error::MatchError;
pub use fallback::{FallbackConfig, FallbackOutcome, FallbackStrategy, GeometryQuery, SearchContext};
pub use normalize::{NormalizedPath, PathNormalizer, PathUnit};
pub use pipeline::{analyze_shape, RouteMatcher};
pub use similarity::{MetricError, MetricKind, MetricScores, SimilarityEngine, SimilarityMetric};
