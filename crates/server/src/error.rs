use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use route_matcher::MatchError;
use shared::ErrorBody;

/// Error returned by the HTTP handlers
#[derive(Debug)]
pub struct ApiError(pub MatchError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            MatchError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            MatchError::LocationNotFound(_) => StatusCode::NOT_FOUND,
            MatchError::DataProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            MatchError::InvalidConfig(_) | MatchError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<MatchError> for ApiError {
    fn from(err: MatchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.0.kind(), "{}", self.0);
        }
        (status, Json(self.0.to_body())).into_response()
    }
}

/// Log a collaborator failure and hide its transport details
pub fn provider_unavailable(provider: &str, err: impl std::fmt::Display) -> MatchError {
    tracing::warn!(provider, error = %err, "provider request failed");
    MatchError::DataProviderUnavailable(format!("{} is not reachable", provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let insufficient = MatchError::InsufficientData {
            issues: vec!["too few points".to_string()],
            recommendations: vec![],
        };
        assert_eq!(ApiError(insufficient).status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            ApiError(MatchError::LocationNotFound("Atlantis".to_string())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(MatchError::DataProviderUnavailable("geocoder".to_string())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError(MatchError::Internal("analysis task panicked".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_provider_message_hides_details() {
        let err = provider_unavailable("overpass", "dns error: lookup failed for 10.0.0.7");
        assert_eq!(err.kind(), "data_provider_unavailable");
        assert!(!err.to_string().contains("10.0.0.7"));
    }
}
