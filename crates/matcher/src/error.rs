use shared::ErrorBody;
use thiserror::Error;

/// Errors surfaced by the matching pipeline.
///
/// Only `InsufficientData` and `LocationNotFound` are meant to reach the caller;
/// `DataProviderUnavailable` is absorbed by the fallback chain.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("drawing cannot be analyzed: {}", .issues.join("; "))]
    InsufficientData {
        issues: Vec<String>,
        recommendations: Vec<String>,
    },

    #[error("no location found for '{0}'")]
    LocationNotFound(String),

    #[error("data provider unavailable: {0}")]
    DataProviderUnavailable(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl MatchError {
    /// Stable, machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            MatchError::InsufficientData { .. } => "insufficient_data",
            MatchError::LocationNotFound(_) => "location_not_found",
            MatchError::DataProviderUnavailable(_) => "data_provider_unavailable",
            MatchError::InvalidConfig(_) => "invalid_config",
            MatchError::Internal(_) => "internal",
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let (issues, recommendations) = match self {
            MatchError::InsufficientData {
                issues,
                recommendations,
            } => (issues.clone(), recommendations.clone()),
            _ => (Vec::new(), Vec::new()),
        };
        ErrorBody {
            kind: self.kind().to_string(),
            message: self.to_string(),
            issues,
            recommendations,
        }
    }
}
