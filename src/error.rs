//! Error taxonomy shared by every handler, and its JSON envelope.
//!
//! All failures leave the service as `{"error", "code", "message"?, "details"?}`
//! so the client can branch on `code` instead of parsing text.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::google::GoogleError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Configuration(String),

    #[error("Missing Google provider token. Reconnection may be required.")]
    MissingProviderToken,

    #[error("{0}")]
    Upstream(#[from] GoogleError),

    #[error("database operation failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Wire shape of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorEnvelope {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub mod codes {
    pub const AUTHENTICATION: &str = "authentication_error";
    pub const VALIDATION: &str = "validation_error";
    pub const CONFIGURATION: &str = "configuration_error";
    pub const RECONNECT_REQUIRED: &str = "reconnect_required";
    pub const ACCESS_DENIED: &str = "access_denied";
    pub const API_NOT_ACTIVATED: &str = "api_not_activated";
    pub const UPSTREAM: &str = "upstream_error";
    pub const INTERNAL: &str = "internal_error";
}

impl ApiError {
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => codes::AUTHENTICATION,
            Self::Validation(_) => codes::VALIDATION,
            Self::Configuration(_) => codes::CONFIGURATION,
            Self::MissingProviderToken => codes::RECONNECT_REQUIRED,
            Self::Upstream(err) => upstream_code(err),
            Self::Database(_) | Self::Internal(_) => codes::INTERNAL,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            Self::Upstream(err) => ErrorEnvelope {
                error: format!("Google API error: {}", err.message()),
                code: self.code().to_string(),
                message: None,
                details: err.details().map(String::from),
            },
            // Database internals stay in the logs.
            Self::Database(_) => ErrorEnvelope {
                error: "Database operation failed".to_string(),
                code: self.code().to_string(),
                message: None,
                details: None,
            },
            other => ErrorEnvelope {
                error: other.to_string(),
                code: other.code().to_string(),
                message: None,
                details: None,
            },
        }
    }
}

pub fn upstream_code(err: &GoogleError) -> &'static str {
    if err.is_unauthorized() {
        codes::RECONNECT_REQUIRED
    } else if err.is_api_disabled() {
        codes::API_NOT_ACTIVATED
    } else if err.is_forbidden() {
        codes::ACCESS_DENIED
    } else {
        codes::UPSTREAM
    }
}

/// Upstream 4xx/5xx pass through; anything else (transport failures) is a 502.
pub fn upstream_status(err: &GoogleError) -> StatusCode {
    err.status()
        .and_then(|s| StatusCode::from_u16(s).ok())
        .filter(|s| s.is_client_error() || s.is_server_error())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Validation(_) | Self::Configuration(_) | Self::MissingProviderToken => {
                StatusCode::BAD_REQUEST
            }
            Self::Upstream(err) => upstream_status(err),
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            error!(error = %self, "request failed");
        }
        HttpResponse::build(self.status_code()).json(self.envelope())
    }
}
