//! API error type and its HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No caller identity could be resolved.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// A required field or parameter is missing or malformed. `field` is the
    /// JSON key when the problem is tied to one.
    #[error("{message}")]
    Validation {
        field: Option<&'static str>,
        message: String,
    },

    /// Caller is known but may not touch this resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Persistence or other server-side failure. Logged, never shown.
    #[error("Internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl ApiError {
    pub fn missing_field(field: &'static str, label: &str) -> Self {
        Self::Validation {
            field: Some(field),
            message: format!("{} is required", label),
        }
    }

    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: Some(field),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Validation {
            field: None,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(err) = &self {
            error!(error = %format!("{:#}", err), "Request failed");
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Validation { message, .. } => message.clone(),
            Self::Forbidden(msg) | Self::NotFound(msg) | Self::Conflict(msg) => msg.clone(),
            Self::Unauthenticated => self.to_string(),
        };

        let mut body = json!({
            "error": message,
            "code": self.code(),
        });
        if let Self::Validation { field: Some(field), .. } = &self {
            body["field"] = json!(field);
        }

        (self.status_code(), Json(body)).into_response()
    }
}
