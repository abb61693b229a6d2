//! HTTP error mapping
//!
//! Handlers return `Result<_, ApiError>`. Every error renders as
//! `{"success": false, "error": ..., "details": ...}` with a status that
//! matches its cause. Storage and other internal failures are logged in full
//! and reported to the caller with a generic message.

use crate::error::{FieldError, MindwellError};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the HTTP layer
#[derive(Debug, Error)]
pub enum ApiError {
    /// One or more input fields failed validation
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// Request body or query string could not be decoded
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A required dependency is not configured
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Anything else, including store failures
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldError>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(fields) => ErrorBody {
                success: false,
                error: "Validation failed".to_string(),
                details: Some(fields),
            },
            ApiError::BadRequest(message) => ErrorBody {
                success: false,
                error: message,
                details: None,
            },
            ApiError::Unavailable(message) => {
                tracing::warn!(message = %message, "Request failed: dependency unavailable");
                ErrorBody {
                    success: false,
                    error: "Service temporarily unavailable".to_string(),
                    details: None,
                }
            }
            ApiError::Internal(message) => {
                tracing::error!(message = %message, "Internal server error");
                ErrorBody {
                    success: false,
                    error: "Internal server error".to_string(),
                    details: None,
                }
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<MindwellError>() {
            Some(MindwellError::Validation(fields)) => ApiError::Validation(fields.clone()),
            Some(MindwellError::Config(_)) | Some(MindwellError::Completion(_)) => {
                ApiError::Unavailable(err.to_string())
            }
            _ => ApiError::Internal(format!("{:#}", err)),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_400() {
        let err: ApiError =
            anyhow::Error::from(MindwellError::invalid("mood", "out of range")).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(matches!(err, ApiError::Validation(ref f) if f[0].field == "mood"));
    }

    #[test]
    fn test_completion_misconfiguration_maps_to_503() {
        let err: ApiError =
            anyhow::Error::from(MindwellError::Completion("no key".to_string())).into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_storage_maps_to_500() {
        let err: ApiError =
            anyhow::Error::from(MindwellError::Storage("disk gone".to_string())).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorBody {
            success: false,
            error: "Validation failed".to_string(),
            details: Some(vec![FieldError::new("content", "is required")]),
        };
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["details"][0]["field"], "content");
    }
}
