//! Error handling for SHELF HTTP layer
//!
//! Every failed request is classified into exactly one [`AppError`], rendered
//! once as a JSend body, and logged once. Internal detail never leaves the
//! process; only the trace id links a response to its log line.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

/// Message returned to clients for every 5xx response.
pub const INTERNAL_MESSAGE: &str = "An internal server error occurred";

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation {
        details: Vec<Value>,
        code: String,
        message: String,
    },

    #[error("conflict: {message}")]
    Conflict {
        details: Vec<Value>,
        code: String,
        message: String,
    },

    #[error("not found: {message}")]
    NotFound { message: String, code: String },

    #[error("unauthorized: {message}")]
    Unauthorized { message: String, code: String },

    #[error("bad request: {message}")]
    BadRequest { message: String, code: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error
    pub fn validation(details: Vec<Value>, message: impl Into<String>) -> Self {
        Self::Validation {
            details,
            code: "validation_error".to_string(),
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(details: Vec<Value>, message: impl Into<String>) -> Self {
        Self::Conflict {
            details,
            code: "conflict".to_string(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: "not_found".to_string(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
            code: "unauthorized".to_string(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            code: "bad_request".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let trace_id = Uuid::new_v4().to_string();
        let status = self.status();

        let body = match self {
            AppError::Validation {
                details,
                code,
                message,
            } => {
                tracing::warn!(%trace_id, error_code = %code, fields = details.len(), "{}", message);
                json!({ "status": "fail", "data": details, "trace_id": trace_id })
            }
            AppError::Conflict {
                details,
                code,
                message,
            } => {
                tracing::warn!(%trace_id, error_code = %code, "{}", message);
                json!({ "status": "fail", "message": message, "data": details, "trace_id": trace_id })
            }
            AppError::NotFound { message, code }
            | AppError::Unauthorized { message, code }
            | AppError::BadRequest { message, code } => {
                tracing::warn!(%trace_id, error_code = %code, status_code = status.as_u16(), "{}", message);
                json!({ "status": "fail", "message": message, "trace_id": trace_id })
            }
            AppError::Internal(e) => {
                let detail = format!("{e:#}");
                tracing::error!(%trace_id, error = %detail, "request failed");
                json!({ "status": "error", "message": INTERNAL_MESSAGE, "trace_id": trace_id })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_validation_error() {
        let details = vec![json!({"param": "book_id", "msg": "required"})];
        let error = AppError::validation(details.clone(), "Validation failed");

        match error {
            AppError::Validation {
                details: d,
                code,
                message,
            } => {
                assert_eq!(d, details);
                assert_eq!(code, "validation_error");
                assert_eq!(message, "Validation failed");
            }
            _ => panic!("Expected Validation error"),
        }
    }

    #[tokio::test]
    async fn test_validation_renders_fail_with_details() {
        let details = vec![json!({"param": "username", "msg": "too short"})];
        let response = AppError::validation(details.clone(), "bad").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["status"], "fail");
        assert_eq!(body["data"], Value::Array(details));
    }

    #[tokio::test]
    async fn test_not_found_mapping() {
        let response = AppError::not_found("Author not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["status"], "fail");
        assert_eq!(body["message"], "Author not found");
        assert!(body["trace_id"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let error = AppError::Internal(anyhow::anyhow!("database is locked at /var/lib/shelf.db"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], INTERNAL_MESSAGE);
        assert!(!body.to_string().contains("shelf.db"));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::unauthorized("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::conflict(vec![], "x").status(), StatusCode::CONFLICT);
    }
}
