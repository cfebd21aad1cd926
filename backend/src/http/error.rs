//! HTTP error handling and response types.
//!
//! Client errors carry no body; the reason is only logged. Server errors
//! render an [`ApiError`] JSON body.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::db::repository::RepositoryError;
use crate::security::{AuthError, REALM};

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Invalid request, unknown id included
    BadRequest(String),
    /// No route matched
    NotFound(String),
    /// Missing or rejected credentials
    Unauthorized(AuthError),
    /// Internal server error
    Internal(String),
    /// Repository error
    Repository(RepositoryError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(msg) => {
                debug!(reason = %msg, "rejecting request");
                StatusCode::BAD_REQUEST.into_response()
            }
            AppError::NotFound(msg) => {
                debug!(reason = %msg, "no matching route");
                StatusCode::NOT_FOUND.into_response()
            }
            AppError::Unauthorized(err) => {
                debug!(reason = %err, "authentication failed");
                let mut response = StatusCode::UNAUTHORIZED.into_response();
                if let Ok(challenge) =
                    HeaderValue::from_str(&format!("Basic realm=\"{}\"", REALM))
                {
                    response
                        .headers_mut()
                        .insert(header::WWW_AUTHENTICATE, challenge);
                }
                response
            }
            AppError::Internal(msg) => {
                error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiError::new("INTERNAL_ERROR", msg)),
                )
                    .into_response()
            }
            AppError::Repository(e) => {
                error!(error = %e, "repository failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiError::new("REPOSITORY_ERROR", e.to_string())),
                )
                    .into_response()
            }
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        if err.is_client_error() {
            AppError::Unauthorized(err)
        } else {
            AppError::Internal(err.to_string())
        }
    }
}
