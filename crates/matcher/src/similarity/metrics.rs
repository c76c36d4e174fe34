//! The five standard similarity metrics.

use shared::Point2D;
use std::f64::consts::PI;

use super::{check_pair, MetricError, MetricKind, SimilarityMetric};
use crate::analyzer::{path_complexity, AnalyzerConfig};
use crate::geometry::EPSILON;
use crate::normalize::NormalizedPath;

// ============================================================================
// DTW
// ============================================================================

/// Dynamic time warping: `exp(-cost / max(n, m))`
#[derive(Debug, Clone, Copy, Default)]
pub struct DtwMetric;

impl SimilarityMetric for DtwMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Dtw
    }

    fn similarity(&self, a: &NormalizedPath, b: &NormalizedPath) -> Result<f64, MetricError> {
        check_pair(a, b)?;
        let cost = dtw_distance(a.points(), b.points());
        Ok((-cost / a.len().max(b.len()) as f64).exp())
    }
}

/// Cumulative DTW cost with Euclidean local cost; two rolling rows.
pub fn dtw_distance(a: &[Point2D], b: &[Point2D]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return f64::INFINITY;
    }
    let m = b.len();
    let mut prev = vec![f64::INFINITY; m + 1];
    let mut cur = vec![f64::INFINITY; m + 1];
    prev[0] = 0.0;
    for pa in a {
        cur[0] = f64::INFINITY;
        for j in 1..=m {
            let best = prev[j].min(cur[j - 1]).min(prev[j - 1]);
            cur[j] = pa.distance(&b[j - 1]) + best;
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[m]
}

// ============================================================================
// Hausdorff
// ============================================================================

/// Symmetric Hausdorff distance: `exp(-k · d)`
#[derive(Debug, Clone, Copy)]
pub struct HausdorffMetric {
    k: f64,
}

impl HausdorffMetric {
    pub fn new(k: f64) -> Self {
        Self { k }
    }
}

impl Default for HausdorffMetric {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl SimilarityMetric for HausdorffMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Hausdorff
    }

    fn similarity(&self, a: &NormalizedPath, b: &NormalizedPath) -> Result<f64, MetricError> {
        check_pair(a, b)?;
        Ok((-self.k * hausdorff_distance(a.points(), b.points())).exp())
    }
}

/// Max over `from` of the distance to the nearest point of `to`
pub fn directed_hausdorff(from: &[Point2D], to: &[Point2D]) -> f64 {
    from.iter()
        .map(|p| to.iter().map(|q| p.distance(q)).fold(f64::INFINITY, f64::min))
        .fold(0.0, f64::max)
}

pub fn hausdorff_distance(a: &[Point2D], b: &[Point2D]) -> f64 {
    directed_hausdorff(a, b).max(directed_hausdorff(b, a))
}

// ============================================================================
// Fourier descriptors
// ============================================================================

/// Low-harmonic magnitude comparison of the path as a complex signal
#[derive(Debug, Clone, Copy)]
pub struct FourierMetric {
    harmonics: usize,
}

impl FourierMetric {
    pub fn new(harmonics: usize) -> Self {
        Self { harmonics }
    }
}

impl Default for FourierMetric {
    fn default() -> Self {
        Self::new(8)
    }
}

impl SimilarityMetric for FourierMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Fourier
    }

    fn similarity(&self, a: &NormalizedPath, b: &NormalizedPath) -> Result<f64, MetricError> {
        check_pair(a, b)?;
        let shared = self.harmonics.min(a.len() - 1).min(b.len() - 1);
        if shared == 0 {
            return Err(MetricError::Degenerate(
                "too few points for a harmonic".to_string(),
            ));
        }
        let da = fourier_descriptors(a.points(), shared);
        let db = fourier_descriptors(b.points(), shared);
        let sum: f64 = da.iter().zip(&db).map(|(x, y)| (-(x - y).abs()).exp()).sum();
        Ok(sum / shared as f64)
    }
}

/// Magnitudes of harmonics 1..=`harmonics` of `x + iy`, normalized by N
pub fn fourier_descriptors(points: &[Point2D], harmonics: usize) -> Vec<f64> {
    let n = points.len() as f64;
    (1..=harmonics)
        .map(|k| {
            let (re, im) = points
                .iter()
                .enumerate()
                .fold((0.0, 0.0), |(re, im), (t, p)| {
                    let angle = -2.0 * PI * k as f64 * t as f64 / n;
                    let (s, c) = angle.sin_cos();
                    (re + p.x * c - p.y * s, im + p.x * s + p.y * c)
                });
            re.hypot(im) / n
        })
        .collect()
}

// ============================================================================
// Scalar features
// ============================================================================

/// Agreement of aspect ratio, complexity and straightness
#[derive(Debug, Clone, Default)]
pub struct FeatureMetric {
    analyzer: AnalyzerConfig,
}

impl FeatureMetric {
    pub fn new(analyzer: AnalyzerConfig) -> Self {
        Self { analyzer }
    }
}

impl SimilarityMetric for FeatureMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Feature
    }

    fn similarity(&self, a: &NormalizedPath, b: &NormalizedPath) -> Result<f64, MetricError> {
        check_pair(a, b)?;
        let pairs = [
            (a.aspect_ratio(), b.aspect_ratio()),
            (
                path_complexity(a.points(), &self.analyzer),
                path_complexity(b.points(), &self.analyzer),
            ),
            (a.straightness(), b.straightness()),
        ];
        let total: f64 = pairs.iter().map(|&(x, y)| relative_agreement(x, y)).sum();
        Ok(total / pairs.len() as f64)
    }
}

/// `1 - |a - b| / max(|a|, |b|)`; 1.0 when both are zero
pub fn relative_agreement(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale <= EPSILON {
        return 1.0;
    }
    (1.0 - (a - b).abs() / scale).clamp(0.0, 1.0)
}

// ============================================================================
// Spatial
// ============================================================================

/// Mean distance of index-corresponding samples: `exp(-mean / reference_scale)`
#[derive(Debug, Clone, Copy)]
pub struct SpatialMetric {
    samples: usize,
    reference_scale: f64,
}

impl SpatialMetric {
    pub fn new(samples: usize, reference_scale: f64) -> Self {
        Self {
            samples: samples.max(1),
            reference_scale,
        }
    }
}

impl Default for SpatialMetric {
    fn default() -> Self {
        Self::new(10, 0.2)
    }
}

impl SimilarityMetric for SpatialMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Spatial
    }

    fn similarity(&self, a: &NormalizedPath, b: &NormalizedPath) -> Result<f64, MetricError> {
        check_pair(a, b)?;
        if self.reference_scale <= EPSILON {
            return Err(MetricError::Degenerate(
                "reference scale must be positive".to_string(),
            ));
        }
        let total: f64 = (0..self.samples)
            .map(|i| {
                let pa = &a.points()[sample_index(i, self.samples, a.len())];
                let pb = &b.points()[sample_index(i, self.samples, b.len())];
                pa.distance(pb)
            })
            .sum();
        let mean = total / self.samples as f64;
        Ok((-mean / self.reference_scale).exp())
    }
}

/// Index of sample `i` of `samples` spread evenly over `len` points
fn sample_index(i: usize, samples: usize, len: usize) -> usize {
    if samples <= 1 || len <= 1 {
        return 0;
    }
    let idx = (i as f64 * (len - 1) as f64 / (samples - 1) as f64).round() as usize;
    idx.min(len - 1)
}
