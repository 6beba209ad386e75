use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::services::InvitationError;
use domain::stores::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by handlers that do not answer with `"0"`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request, such as a broken multipart body.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::Storage(_) => (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_code();
        let message = match self {
            ApiError::Validation(msg) | ApiError::Conflict(msg) => msg,
            ApiError::Storage(msg) => {
                tracing::error!(error = %msg, "Store failure");
                "The registration store is unavailable".to_string()
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                "An internal error occurred".to_string()
            }
        };

        (status, Json(ErrorBody { error, message })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(field) => {
                ApiError::Conflict(format!("Duplicate value for {}", field))
            }
            StoreError::Backend(msg) => ApiError::Storage(msg),
        }
    }
}

impl From<InvitationError> for ApiError {
    fn from(err: InvitationError) -> Self {
        match err {
            InvitationError::Store(e) => e.into(),
            InvitationError::Csv(msg) => ApiError::Internal(format!("CSV export failed: {}", msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::Storage("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_from_store_unique_violation() {
        let error: ApiError = StoreError::UniqueViolation("name".into()).into();
        match error {
            ApiError::Conflict(msg) => assert_eq!(msg, "Duplicate value for name"),
            other => panic!("Expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_from_store_backend() {
        let error: ApiError = StoreError::Backend("connection reset".into()).into();
        match error {
            ApiError::Storage(msg) => assert!(msg.contains("connection reset")),
            other => panic!("Expected Storage error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_invitation_csv_error() {
        let error: ApiError = InvitationError::Csv("broken".into()).into();
        assert!(matches!(error, ApiError::Internal(_)));
    }
}
