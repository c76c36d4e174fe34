use std::time::Duration;

use route_matcher::{MatchError, MatcherConfig};

const DEFAULT_BIND: &str = "0.0.0.0:3001";
const DEFAULT_NOMINATIM: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_OVERPASS: &str = "https://overpass-api.de/api/interpreter";

/// Collaborator timeouts are clamped to this range (seconds)
const MIN_TIMEOUT_SECS: u64 = 15;
const MAX_TIMEOUT_SECS: u64 = 45;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub ai_api_key: Option<String>,
    pub nominatim_url: String,
    pub overpass_url: String,
    pub geocode_timeout: Duration,
    pub overpass_timeout: Duration,
    pub ai_timeout: Duration,
    pub matcher: MatcherConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, MatchError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys take their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MatchError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let matcher = match get("MATCHER_CONFIG") {
            Some(path) => MatcherConfig::from_file(path)?,
            None => MatcherConfig::default(),
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            ai_api_key: get("ANTHROPIC_API_KEY"),
            nominatim_url: get("NOMINATIM_URL").unwrap_or_else(|| DEFAULT_NOMINATIM.to_string()),
            overpass_url: get("OVERPASS_URL").unwrap_or_else(|| DEFAULT_OVERPASS.to_string()),
            geocode_timeout: timeout_secs(get("GEOCODE_TIMEOUT_SECS"), 15),
            overpass_timeout: timeout_secs(get("OVERPASS_TIMEOUT_SECS"), 30),
            ai_timeout: timeout_secs(get("AI_TIMEOUT_SECS"), 45),
            matcher,
        })
    }
}

fn timeout_secs(value: Option<String>, default: u64) -> Duration {
    let secs = value
        .and_then(|v| {
            v.trim()
                .parse::<u64>()
                .map_err(|_| tracing::warn!(value = %v, "ignoring malformed timeout"))
                .ok()
        })
        .unwrap_or(default);
    Duration::from_secs(secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, MatchError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr, DEFAULT_BIND);
        assert!(config.ai_api_key.is_none());
        assert_eq!(config.geocode_timeout, Duration::from_secs(15));
        assert_eq!(config.overpass_timeout, Duration::from_secs(30));
        assert_eq!(config.ai_timeout, Duration::from_secs(45));
        assert_eq!(config.matcher, MatcherConfig::default());
    }

    #[test]
    fn test_timeouts_are_clamped() {
        let config = config_from(&[
            ("GEOCODE_TIMEOUT_SECS", "2"),
            ("OVERPASS_TIMEOUT_SECS", "600"),
            ("AI_TIMEOUT_SECS", "20"),
        ])
        .unwrap();
        assert_eq!(config.ai_timeout, Duration::from_secs(20));
        assert_eq!(config.geocode_timeout, Duration::from_secs(15));
        assert_eq!(config.overpass_timeout, Duration::from_secs(45));
    }

    #[test]
    fn test_blank_key_is_unset() {
        let config = config_from(&[("ANTHROPIC_API_KEY", "  "), ("OVERPASS_TIMEOUT_SECS", "abc")]).unwrap();
        assert!(config.ai_api_key.is_none());
        assert_eq!(config.overpass_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_matcher_config_file() {
        let err = config_from(&[("MATCHER_CONFIG", "/no/such/matcher.json")]).unwrap_err();
        assert_eq!(err.kind(), "invalid_config");
    }
}
