/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>` which automatically converts
/// to the appropriate HTTP status code and JSON body.
///
/// # Example
///
/// ```
/// use taskhive_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler(found: bool) -> ApiResult<Json<serde_json::Value>> {
///     if !found {
///         return Err(ApiError::NotFound("Task not found".to_string()));
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use taskhive_shared::auth::identity::IdentityError;
use taskhive_shared::auth::session::SessionError;
use taskhive_shared::models::invitation::InviteError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400) - message-carrying rejections
    BadRequest(String),

    /// Unauthorized (401) - missing or invalid credential
    Unauthorized(String),

    /// Forbidden (403) - valid credential, insufficient permission
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - e.g. duplicate pending invitation
    Conflict(String),

    /// Validation failed (400 with field-level details)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),

    /// Service unavailable (503) - a collaborator is unreachable
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,

    /// Correlates a 500 response with the server-side log line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Uuid>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Internal errors get a trace id so clients can reference the
        // server-side log line without seeing internal error text.
        if let ApiError::InternalError(msg) = &self {
            let trace_id = Uuid::new_v4();
            tracing::error!(trace_id = %trace_id, "Internal error: {}", msg);

            let body = Json(ErrorResponse {
                error: "internal_error".to_string(),
                message: "An internal error occurred".to_string(),
                details: None,
                trace_id: Some(trace_id),
            });
            return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
        }

        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
            ApiError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
            trace_id: None,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ApiError::Conflict("Resource already exists".to_string())
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert request validation failures to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let errors: Vec<ValidationErrorDetail> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        ApiError::ValidationError(errors)
    }
}

/// Convert session validation failures to API errors
impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Invalid => {
                ApiError::Unauthorized("Invalid or expired token".to_string())
            }
            SessionError::CreateError(msg) => {
                ApiError::InternalError(format!("Failed to issue session: {}", msg))
            }
        }
    }
}

/// Convert identity verification failures to API errors
impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Rejected => {
                ApiError::Unauthorized("Invalid or expired token".to_string())
            }
            IdentityError::Unavailable(msg) => {
                tracing::error!("Identity provider unavailable: {}", msg);
                ApiError::ServiceUnavailable("Identity provider unreachable".to_string())
            }
        }
    }
}

/// Convert invitation flow failures to API errors
impl From<InviteError> for ApiError {
    fn from(err: InviteError) -> Self {
        match err {
            InviteError::ProjectNotFound => ApiError::NotFound(err.to_string()),
            InviteError::NotPermitted => ApiError::Forbidden(err.to_string()),
            InviteError::UserNotFound
            | InviteError::UserIsOwner
            | InviteError::AlreadyMember => ApiError::BadRequest(err.to_string()),
            InviteError::AlreadyPending => ApiError::Conflict(err.to_string()),
            InviteError::Database(db_err) => db_err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");
    }

    #[test]
    fn test_validation_error_maps_to_400() {
        let errors = vec![ValidationErrorDetail {
            field: "title".to_string(),
            message: "Title is required".to_string(),
        }];

        let response = ApiError::ValidationError(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invite_error_status_mapping() {
        let cases = [
            (InviteError::ProjectNotFound, StatusCode::NOT_FOUND),
            (InviteError::NotPermitted, StatusCode::FORBIDDEN),
            (InviteError::UserNotFound, StatusCode::BAD_REQUEST),
            (InviteError::UserIsOwner, StatusCode::BAD_REQUEST),
            (InviteError::AlreadyMember, StatusCode::BAD_REQUEST),
            (InviteError::AlreadyPending, StatusCode::CONFLICT),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_invite_error_keeps_rejection_message() {
        let api_err = ApiError::from(InviteError::AlreadyMember);
        match api_err {
            ApiError::BadRequest(msg) => {
                assert_eq!(msg, "User is already a member of this project")
            }
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let response =
            ApiError::InternalError("connection pool exhausted".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let response = ApiError::from(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
