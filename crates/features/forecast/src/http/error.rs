use crate::error::{DispatchError, LegacyFieldError, ScoreError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Error body. Only the fields relevant to the failure are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error kind
    #[schema(example = "Invalid season")]
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<usize>,
    /// Zero-based position of the offending value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    /// Schema name of the offending value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    /// Name of the offending form field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl ErrorResponse {
    const fn new(error: &'static str) -> Self {
        Self { error, expected: None, received: None, position: None, feature: None, field: None }
    }
}

/// Failures of the forecast endpoints, each with a fixed status code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Missing form field '{field}'")]
    MissingField { field: &'static str },

    #[error(transparent)]
    LegacyField(#[from] LegacyFieldError),

    #[error("Legacy model failed: {source}")]
    LegacyScore {
        #[from]
        source: ScoreError,
    },

    #[error("Forecast slice is not available in this deployment")]
    SliceUnavailable,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, ErrorResponse) {
        match self {
            Self::Dispatch(DispatchError::UnknownSeason(_)) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new("Invalid season"))
            },
            Self::Dispatch(DispatchError::FeatureCountMismatch { expected, received }) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    expected: Some(*expected),
                    received: Some(*received),
                    ..ErrorResponse::new("Feature count mismatch")
                },
            ),
            Self::Dispatch(DispatchError::NonNumericFeature { position, feature }) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    position: Some(*position),
                    feature: Some(feature.clone()),
                    ..ErrorResponse::new("Non-numeric feature")
                },
            ),
            Self::MissingField { field } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse { field: Some(*field), ..ErrorResponse::new("Missing form field") },
            ),
            Self::LegacyField(LegacyFieldError::Missing { field }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse { field: Some(*field), ..ErrorResponse::new("Missing form field") },
            ),
            Self::LegacyField(LegacyFieldError::NonNumeric { field }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse { field: Some(*field), ..ErrorResponse::new("Invalid number") },
            ),
            Self::Dispatch(DispatchError::ModelInvocationFailure { .. })
            | Self::LegacyScore { .. }
            | Self::SliceUnavailable => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new("Internal server error"))
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();
        if status.is_server_error() {
            tracing::error!(error = %self, "Prediction request failed");
        } else {
            tracing::debug!(error = %self, "Prediction request rejected");
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::season::Season;

    #[test]
    fn status_codes() {
        let cases = [
            (ApiError::from(DispatchError::FeatureCountMismatch { expected: 9, received: 11 }), 400),
            (ApiError::MissingField { field: "season" }, 400),
            (ApiError::from(LegacyFieldError::Missing { field: "feature1" }), 422),
            (
                ApiError::from(DispatchError::ModelInvocationFailure {
                    season: Season::Fall,
                    source: ScoreError::NonFiniteOutput { value: f64::INFINITY },
                }),
                500,
            ),
            (ApiError::SliceUnavailable, 500),
        ];

        for (err, code) in cases {
            assert_eq!(err.parts().0.as_u16(), code, "{err}");
        }
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = ApiError::from(ScoreError::InputWidth { expected: 1, received: 2 });
        let body = serde_json::to_value(err.parts().1).unwrap();
        assert_eq!(body, serde_json::json!({"error": "Internal server error"}));
    }

    #[test]
    fn mismatch_body_carries_counts() {
        let err = ApiError::from(DispatchError::FeatureCountMismatch { expected: 9, received: 11 });
        let body = serde_json::to_value(err.parts().1).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"error": "Feature count mismatch", "expected": 9, "received": 11})
        );
    }
}
