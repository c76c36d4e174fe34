//! Similarity engine: an ensemble of independent path metrics.
//!
//! Every metric maps a pair of `NormalizedPath`s to [0, 1]. A metric that fails
//! on one pair scores the configured floor for that pair only; the rest of the
//! batch is unaffected.

pub mod metrics;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use shared::MetricWeights;
use thiserror::Error;

use crate::analyzer::AnalyzerConfig;
use crate::collector::RouteCandidate;
use crate::normalize::NormalizedPath;

pub use metrics::{DtwMetric, FeatureMetric, FourierMetric, HausdorffMetric, SpatialMetric};

/// The five metrics of the ensemble, in weight order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Dtw,
    Hausdorff,
    Fourier,
    Feature,
    Spatial,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Dtw,
        MetricKind::Hausdorff,
        MetricKind::Fourier,
        MetricKind::Feature,
        MetricKind::Spatial,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Dtw => "sequence alignment",
            MetricKind::Hausdorff => "outline distance",
            MetricKind::Fourier => "overall form",
            MetricKind::Feature => "proportions",
            MetricKind::Spatial => "point placement",
        }
    }

    fn slot(&self) -> usize {
        match self {
            MetricKind::Dtw => 0,
            MetricKind::Hausdorff => 1,
            MetricKind::Fourier => 2,
            MetricKind::Feature => 3,
            MetricKind::Spatial => 4,
        }
    }
}

/// Per-pair metric failure; never escapes the engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    #[error("path has no points")]
    EmptyPath,

    #[error("path contains non-finite coordinates")]
    NonFinite,

    #[error("degenerate input: {0}")]
    Degenerate(String),
}

/// A pure similarity function over two normalized paths
pub trait SimilarityMetric: Send + Sync {
    fn kind(&self) -> MetricKind;

    /// Similarity in [0, 1]; 1.0 for identical paths
    fn similarity(&self, a: &NormalizedPath, b: &NormalizedPath) -> Result<f64, MetricError>;
}

/// Tunables of the individual metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfig {
    /// Hausdorff decay; d = 0.1 → e^-1
    pub hausdorff_k: f64,
    /// Lowest harmonics compared by the Fourier metric (k = 1..=n)
    pub fourier_harmonics: usize,
    /// Index-corresponding samples taken by the spatial metric
    pub spatial_samples: usize,
    /// Mean distance at which spatial similarity falls to e^-1
    pub spatial_reference_scale: f64,
    /// Score assigned when a metric fails
    pub metric_floor: f64,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            hausdorff_k: 10.0,
            fourier_harmonics: 8,
            spatial_samples: 10,
            spatial_reference_scale: 0.2,
            metric_floor: 0.0,
        }
    }
}

/// One score per metric, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricScores {
    pub dtw: f64,
    pub hausdorff: f64,
    pub fourier: f64,
    pub feature: f64,
    pub spatial: f64,
}

impl MetricScores {
    /// All five metrics at the same value
    pub fn uniform(value: f64) -> Self {
        Self::from_array([value; 5])
    }

    pub fn from_array(values: [f64; 5]) -> Self {
        let [dtw, hausdorff, fourier, feature, spatial] = values;
        Self {
            dtw,
            hausdorff,
            fourier,
            feature,
            spatial,
        }
    }

    pub fn as_array(&self) -> [f64; 5] {
        [self.dtw, self.hausdorff, self.fourier, self.feature, self.spatial]
    }

    pub fn get(&self, kind: MetricKind) -> f64 {
        self.as_array()[kind.slot()]
    }

    fn set(&mut self, kind: MetricKind, value: f64) {
        let mut values = self.as_array();
        values[kind.slot()] = value;
        *self = Self::from_array(values);
    }

    pub fn mean(&self) -> f64 {
        self.as_array().iter().sum::<f64>() / 5.0
    }

    /// Population standard deviation
    pub fn stddev(&self) -> f64 {
        let mean = self.mean();
        let var = self.as_array().iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 5.0;
        var.sqrt()
    }

    /// Weighted sum in metric order
    pub fn weighted(&self, weights: &MetricWeights) -> f64 {
        self.as_array()
            .iter()
            .zip(weights.as_array())
            .map(|(s, w)| s * w)
            .sum()
    }

    /// Metrics scoring below `threshold`
    pub fn weak(&self, threshold: f64) -> Vec<MetricKind> {
        MetricKind::ALL
            .iter()
            .copied()
            .filter(|k| self.get(*k) < threshold)
            .collect()
    }
}

/// Weighted-ensemble scorer holding one metric per `MetricKind`
pub struct SimilarityEngine {
    metrics: Vec<Box<dyn SimilarityMetric>>,
    floor: f64,
}

impl SimilarityEngine {
    /// Engine with the five standard metrics
    pub fn new(config: &MetricConfig, analyzer: &AnalyzerConfig) -> Self {
        Self {
            metrics: vec![
                Box::new(DtwMetric),
                Box::new(HausdorffMetric::new(config.hausdorff_k)),
                Box::new(FourierMetric::new(config.fourier_harmonics)),
                Box::new(FeatureMetric::new(analyzer.clone())),
                Box::new(SpatialMetric::new(
                    config.spatial_samples,
                    config.spatial_reference_scale,
                )),
            ],
            floor: config.metric_floor.clamp(0.0, 1.0),
        }
    }

    /// Replace the registered metric of the same kind
    pub fn with_metric(mut self, metric: Box<dyn SimilarityMetric>) -> Self {
        let kind = metric.kind();
        self.metrics.retain(|m| m.kind() != kind);
        self.metrics.push(metric);
        self
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// Score one pair; failing or non-finite metrics fall back to the floor
    pub fn score(&self, shape: &NormalizedPath, candidate: &NormalizedPath) -> MetricScores {
        let mut scores = MetricScores::uniform(self.floor);
        for metric in &self.metrics {
            let value = match metric.similarity(shape, candidate) {
                Ok(v) if v.is_finite() => v.clamp(0.0, 1.0),
                Ok(v) => {
                    tracing::debug!(metric = ?metric.kind(), value = v, "non-finite similarity, using floor");
                    self.floor
                }
                Err(e) => {
                    tracing::debug!(metric = ?metric.kind(), error = %e, "metric failed, using floor");
                    self.floor
                }
            };
            scores.set(metric.kind(), value);
        }
        scores
    }

    /// Score every candidate in parallel; output order matches input order
    pub fn score_all(&self, shape: &NormalizedPath, candidates: &[RouteCandidate]) -> Vec<MetricScores> {
        candidates
            .par_iter()
            .map(|c| self.score(shape, &c.normalized))
            .collect()
    }
}

impl std::fmt::Debug for SimilarityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityEngine")
            .field(
                "metrics",
                &self.metrics.iter().map(|m| m.kind()).collect::<Vec<_>>(),
            )
            .field("floor", &self.floor)
            .finish()
    }
}

/// Shared input checks for metric implementations
pub(crate) fn check_pair(a: &NormalizedPath, b: &NormalizedPath) -> Result<(), MetricError> {
    if a.is_empty() || b.is_empty() {
        return Err(MetricError::EmptyPath);
    }
    if !a.points().iter().chain(b.points()).all(|p| p.is_finite()) {
        return Err(MetricError::NonFinite);
    }
    Ok(())
}
