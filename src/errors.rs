//! Error taxonomy and the normalizer that turns every failure into a stable
//! `{category, message, detail?}` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::{APP_ID_VAR, APP_KEY_VAR};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {field}: {message}")]
    BadRequest { field: String, message: String },
    #[error("unauthorized: {message}")]
    Unauthorized {
        code: &'static str,
        message: &'static str,
    },
    #[error("upstream returned status {status}")]
    Upstream { status: u16, body: String },
    #[error("upstream transport failure: {message}")]
    Transport { message: String, timed_out: bool },
    #[error("upstream credentials not configured")]
    NotConfigured { missing: Vec<&'static str> },
    #[error("malformed upstream payload: {message}")]
    Decode { message: String },
    #[error("internal error")]
    Internal { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    ClientError,
    UpstreamFailure,
    Unavailable,
    InternalError,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(code: &'static str, message: &'static str) -> Self {
        Self::Unauthorized { code, message }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::BadRequest { .. } | Self::Unauthorized { .. } => ErrorCategory::ClientError,
            Self::Upstream { .. } => ErrorCategory::UpstreamFailure,
            Self::Transport { .. } | Self::NotConfigured { .. } => ErrorCategory::Unavailable,
            Self::Decode { .. } | Self::Internal { .. } => ErrorCategory::InternalError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::Transport {
                timed_out: true, ..
            } => StatusCode::GATEWAY_TIMEOUT,
            Self::Transport { .. } | Self::NotConfigured { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Decode { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Renders the caller-facing error body. Internal details are logged, not returned.
    pub fn to_error_body(&self) -> ErrorBody {
        let (message, detail) = match self {
            Self::BadRequest { field, message } => {
                (message.clone(), Some(json!({ "field": field })))
            }
            Self::Unauthorized { code, message } => {
                (message.to_string(), Some(json!({ "code": code })))
            }
            Self::Upstream { status, body } => (
                format!("upstream API returned status {status}"),
                Some(json!({ "status": status, "body": body })),
            ),
            Self::Transport { message, timed_out } => {
                let summary = if *timed_out {
                    "upstream API request timed out"
                } else {
                    "upstream API is unreachable"
                };
                (summary.to_string(), Some(json!({ "reason": message })))
            }
            Self::NotConfigured { missing } => (
                format!(
                    "Adzuna API credentials not configured; set {APP_ID_VAR} and {APP_KEY_VAR}"
                ),
                Some(json!({ "missing": missing })),
            ),
            Self::Decode { message } => {
                tracing::error!(error = %message, "upstream payload could not be decoded");
                ("upstream API returned a malformed payload".to_string(), None)
            }
            Self::Internal { message } => {
                tracing::error!(error = %message, "request failed with internal error");
                ("internal server error".to_string(), None)
            }
        };

        ErrorBody {
            category: self.category(),
            message,
            detail,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_error_body())).into_response()
    }
}
