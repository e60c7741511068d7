use crate::domain::errors::PredictionError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Body of every error response: `{"error": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<PredictionError> for ApiError {
    fn from(err: PredictionError) -> Self {
        if err.is_client_error() {
            Self::bad_request(err.to_string())
        } else {
            Self::internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{ArtifactError, FeatureError};

    #[test]
    fn test_status_mapping() {
        let missing: ApiError = PredictionError::from(FeatureError::MissingField { field: "town" }).into();
        assert_eq!(missing.status, StatusCode::BAD_REQUEST);
        assert_eq!(missing.message, "Missing required field: town");

        let absent: ApiError = PredictionError::from(ArtifactError::NotFound {
            path: "data/ml/rent_model.json".into(),
        })
        .into();
        assert_eq!(absent.status, StatusCode::INTERNAL_SERVER_ERROR);

        let unfitted: ApiError = PredictionError::from(FeatureError::NotFitted).into();
        assert_eq!(unfitted.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
