//! Injectable lookup tables: mode speeds, way classes, creativity weights.
//!
//! Every table deserializes with defaults for missing fields, so a partial JSON
//! override only needs to name what it changes.

use crate::{CreativityProfile, TransportMode};
use serde::{Deserialize, Serialize};

/// Average travel speed per transport mode, km/h
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeSpeeds {
    pub walking_kmh: f64,
    pub cycling_kmh: f64,
    pub driving_kmh: f64,
}

impl Default for ModeSpeeds {
    fn default() -> Self {
        Self {
            walking_kmh: 5.0,
            cycling_kmh: 15.0,
            driving_kmh: 40.0,
        }
    }
}

impl ModeSpeeds {
    pub fn speed_kmh(&self, mode: TransportMode) -> f64 {
        match mode {
            TransportMode::Walking => self.walking_kmh,
            TransportMode::Cycling => self.cycling_kmh,
            TransportMode::Driving => self.driving_kmh,
        }
    }

    /// Travel time in minutes; zero for a non-positive speed
    pub fn duration_min(&self, mode: TransportMode, distance_km: f64) -> f64 {
        let speed = self.speed_kmh(mode);
        if speed > 0.0 {
            distance_km / speed * 60.0
        } else {
            0.0
        }
    }
}

/// Street way classes (`highway=*` values) usable per transport mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WayClassTable {
    pub walking: Vec<String>,
    pub cycling: Vec<String>,
    pub driving: Vec<String>,
    /// Added to every mode when the search is widened
    pub widened_extra: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for WayClassTable {
    fn default() -> Self {
        Self {
            walking: strings(&[
                "footway",
                "path",
                "pedestrian",
                "living_street",
                "residential",
                "steps",
            ]),
            cycling: strings(&[
                "cycleway",
                "path",
                "living_street",
                "residential",
                "tertiary",
                "unclassified",
            ]),
            driving: strings(&[
                "primary",
                "secondary",
                "tertiary",
                "residential",
                "unclassified",
                "trunk",
            ]),
            widened_extra: strings(&["service", "track", "road", "unclassified", "residential"]),
        }
    }
}

impl WayClassTable {
    pub fn for_mode(&self, mode: TransportMode) -> &[String] {
        match mode {
            TransportMode::Walking => &self.walking,
            TransportMode::Cycling => &self.cycling,
            TransportMode::Driving => &self.driving,
        }
    }

    /// Mode classes followed by the widened extras, without duplicates
    pub fn widened(&self, mode: TransportMode) -> Vec<String> {
        let mut classes = self.for_mode(mode).to_vec();
        for extra in &self.widened_extra {
            if !classes.contains(extra) {
                classes.push(extra.clone());
            }
        }
        classes
    }
}

/// Per-metric weights of the similarity ensemble
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricWeights {
    pub dtw: f64,
    pub hausdorff: f64,
    pub fourier: f64,
    pub feature: f64,
    pub spatial: f64,
}

impl MetricWeights {
    pub const fn new(dtw: f64, hausdorff: f64, fourier: f64, feature: f64, spatial: f64) -> Self {
        Self {
            dtw,
            hausdorff,
            fourier,
            feature,
            spatial,
        }
    }

    pub fn sum(&self) -> f64 {
        self.dtw + self.hausdorff + self.fourier + self.feature + self.spatial
    }

    /// Weights in metric order: DTW, Hausdorff, Fourier, feature, spatial
    pub fn as_array(&self) -> [f64; 5] {
        [self.dtw, self.hausdorff, self.fourier, self.feature, self.spatial]
    }

    /// Non-negative weights summing to 1.0 (within 1e-6)
    pub fn is_valid(&self) -> bool {
        self.as_array().iter().all(|w| w.is_finite() && *w >= 0.0) && (self.sum() - 1.0).abs() < 1e-6
    }
}

/// Weights and acceptance threshold of one creativity profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileSettings {
    pub weights: MetricWeights,
    /// Minimum aggregate similarity a candidate needs to be kept
    pub min_similarity: f64,
}

/// Creativity profile → weights + threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreativityTable {
    pub strict: ProfileSettings,
    pub balanced: ProfileSettings,
    pub creative: ProfileSettings,
}

impl Default for CreativityTable {
    fn default() -> Self {
        Self {
            strict: ProfileSettings {
                weights: MetricWeights::new(0.35, 0.35, 0.10, 0.10, 0.10),
                min_similarity: 0.65,
            },
            balanced: ProfileSettings {
                weights: MetricWeights::new(0.25, 0.20, 0.20, 0.15, 0.20),
                min_similarity: 0.45,
            },
            creative: ProfileSettings {
                weights: MetricWeights::new(0.10, 0.10, 0.30, 0.25, 0.25),
                min_similarity: 0.28,
            },
        }
    }
}

impl CreativityTable {
    pub fn get(&self, profile: CreativityProfile) -> &ProfileSettings {
        match profile {
            CreativityProfile::Strict => &self.strict,
            CreativityProfile::Balanced => &self.balanced,
            CreativityProfile::Creative => &self.creative,
        }
    }

    /// Profiles whose weights do not sum to 1.0
    pub fn invalid_profiles(&self) -> Vec<CreativityProfile> {
        CreativityProfile::all()
            .iter()
            .copied()
            .filter(|p| !self.get(*p).weights.is_valid())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_speeds_default() {
        let speeds = ModeSpeeds::default();
        assert_eq!(speeds.speed_kmh(TransportMode::Walking), 5.0);
        assert_eq!(speeds.speed_kmh(TransportMode::Cycling), 15.0);
        assert_eq!(speeds.speed_kmh(TransportMode::Driving), 40.0);
    }

    #[test]
    fn test_duration_minutes() {
        let speeds = ModeSpeeds::default();
        assert!((speeds.duration_min(TransportMode::Walking, 5.0) - 60.0).abs() < 1e-9);
        assert!((speeds.duration_min(TransportMode::Driving, 10.0) - 15.0).abs() < 1e-9);

        let stopped = ModeSpeeds {
            walking_kmh: 0.0,
            ..ModeSpeeds::default()
        };
        assert_eq!(stopped.duration_min(TransportMode::Walking, 3.0), 0.0);
    }

    #[test]
    fn test_way_classes_per_mode() {
        let table = WayClassTable::default();
        let has = |mode, class: &str| table.for_mode(mode).iter().any(|c| c == class);
        assert!(has(TransportMode::Walking, "footway"));
        assert!(!has(TransportMode::Driving, "footway"));
        assert!(has(TransportMode::Cycling, "cycleway"));
    }

    #[test]
    fn test_widened_has_no_duplicates() {
        let table = WayClassTable::default();
        let widened = table.widened(TransportMode::Walking);
        assert!(widened.len() > table.walking.len());
        assert!(widened.contains(&"service".to_string()));
        let residential = widened.iter().filter(|c| *c == "residential").count();
        assert_eq!(residential, 1);
        // mode classes come first
        assert_eq!(widened[0], "footway");
    }

    #[test]
    fn test_default_profiles_sum_to_one() {
        let table = CreativityTable::default();
        assert!(table.invalid_profiles().is_empty());
        for profile in CreativityProfile::all() {
            assert!((table.get(*profile).weights.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_strict_favors_pointwise_metrics() {
        let table = CreativityTable::default();
        let strict = table.strict.weights;
        let creative = table.creative.weights;
        assert!(strict.dtw + strict.hausdorff > creative.dtw + creative.hausdorff);
        assert!(
            creative.fourier + creative.feature + creative.spatial
                > strict.fourier + strict.feature + strict.spatial
        );
        assert!(table.strict.min_similarity > table.balanced.min_similarity);
        assert!(table.balanced.min_similarity > table.creative.min_similarity);
    }

    #[test]
    fn test_invalid_weights_detected() {
        let mut table = CreativityTable::default();
        table.creative.weights.spatial = 0.9;
        assert_eq!(table.invalid_profiles(), vec![CreativityProfile::Creative]);

        let negative = MetricWeights::new(1.2, -0.2, 0.0, 0.0, 0.0);
        assert!(!negative.is_valid());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let speeds: ModeSpeeds = serde_json::from_str(r#"{"cycling_kmh": 20.0}"#).unwrap();
        assert_eq!(speeds.cycling_kmh, 20.0);
        assert_eq!(speeds.walking_kmh, 5.0);

        let table: WayClassTable = serde_json::from_str(r#"{"walking": ["footway"]}"#).unwrap();
        assert_eq!(table.walking, vec!["footway".to_string()]);
        assert_eq!(table.driving, WayClassTable::default().driving);
    }
}
