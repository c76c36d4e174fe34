//! Matcher configuration, loadable from JSON.
//!
//! Every section defaults field by field, so a file only names what it overrides:
//!
//! ```json
//! { "scoring": { "max_results": 3 }, "collector": { "radius_km": 5.0 } }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::aggregate::ScoringConfig;
use crate::analyzer::AnalyzerConfig;
use crate::collector::CollectorConfig;
use crate::error::MatchError;
use crate::fallback::FallbackConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Points per normalized path
    pub sample_count: usize,
    pub analyzer: AnalyzerConfig,
    pub collector: CollectorConfig,
    pub scoring: ScoringConfig,
    pub fallback: FallbackConfig,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            sample_count: 16,
            analyzer: AnalyzerConfig::default(),
            collector: CollectorConfig::default(),
            scoring: ScoringConfig::default(),
            fallback: FallbackConfig::default(),
        }
    }
}

impl MatcherConfig {
    pub fn from_json_str(json: &str) -> Result<Self, MatchError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| MatchError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MatchError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| MatchError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), MatchError> {
        let invalid = |msg: String| Err(MatchError::InvalidConfig(msg));

        if self.sample_count < 2 {
            return invalid(format!("sample_count must be at least 2, got {}", self.sample_count));
        }
        let profiles = self.scoring.creativity.invalid_profiles();
        if !profiles.is_empty() {
            return invalid(format!(
                "weights of {:?} must be non-negative and sum to 1.0",
                profiles
            ));
        }
        for profile in shared::CreativityProfile::all() {
            let min = self.scoring.creativity.get(*profile).min_similarity;
            if !(0.0..=1.0).contains(&min) {
                return invalid(format!("min_similarity of {:?} is outside [0, 1]: {}", profile, min));
            }
        }
        if self.scoring.max_results == 0 {
            return invalid("max_results must be at least 1".to_string());
        }
        if self.scoring.metrics.spatial_reference_scale <= 0.0 {
            return invalid("spatial_reference_scale must be positive".to_string());
        }
        if self.collector.radius_km <= 0.0 {
            return invalid(format!("radius_km must be positive, got {}", self.collector.radius_km));
        }
        if let Some(filter) = self.collector.length_filter {
            if filter.min_ratio < 0.0 || filter.min_ratio >= filter.max_ratio {
                return invalid(format!(
                    "length filter needs 0 <= min_ratio < max_ratio, got {} / {}",
                    filter.min_ratio, filter.max_ratio
                ));
            }
        }
        if self.fallback.widen_factor < 1.0 {
            return invalid(format!(
                "widen_factor must be at least 1.0, got {}",
                self.fallback.widen_factor
            ));
        }
        if self.fallback.synthetic_count == 0 || self.fallback.synthetic_points < 3 {
            return invalid("synthetic fallback needs at least one loop of 3+ points".to_string());
        }
        Ok(())
    }
}
