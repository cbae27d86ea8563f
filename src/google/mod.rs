//! Thin wrappers over the Google Drive and Sheets REST APIs.
//!
//! Every call is a single request authorized with the user's provider token.
//! Nothing is retried; failures come back as [`GoogleError`] so the HTTP layer
//! can decide how to present them.

pub mod client;
pub mod models;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use client::GoogleClient;
pub use models::{SpreadsheetInfo, WorksheetInfo};

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

/// Scopes the provider token must carry for every feature of the app.
pub const REQUIRED_SCOPES: [&str; 2] = [SPREADSHEETS_SCOPE, DRIVE_READONLY_SCOPE];

// Markers Google uses when the Drive/Sheets API is disabled for the project.
const API_DISABLED_MARKERS: [&str; 4] = [
    "accessNotConfigured",
    "SERVICE_DISABLED",
    "has not been used",
    "is disabled",
];

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("Google API returned {status}: {message}")]
    Status {
        status: u16,
        message: String,
        details: String,
    },

    #[error("request to Google API failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid Google API url: {0}")]
    Url(String),
}

impl GoogleError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The upstream message, or the transport error text.
    pub fn message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Status { details, .. } => Some(details.as_str()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    /// True when Google refused the call because the API is not enabled for
    /// the project, as opposed to a plain permission problem.
    pub fn is_api_disabled(&self) -> bool {
        match self {
            Self::Status {
                status: 403,
                message,
                details,
            } => API_DISABLED_MARKERS
                .iter()
                .any(|marker| message.contains(marker) || details.contains(marker)),
            _ => false,
        }
    }
}

#[async_trait]
pub trait GoogleApi: Send + Sync {
    /// Drive `files.list`, restricted to spreadsheets.
    async fn list_spreadsheets(&self, token: &str) -> Result<Vec<SpreadsheetInfo>, GoogleError>;

    /// Sheets `spreadsheets.get` with only the sheet properties.
    async fn list_worksheets(
        &self,
        token: &str,
        spreadsheet_id: &str,
    ) -> Result<Vec<WorksheetInfo>, GoogleError>;

    /// Sheets `values.append` of a single row, returning Google's response body.
    async fn append_row(
        &self,
        token: &str,
        spreadsheet_id: &str,
        range: &str,
        row: &[String],
    ) -> Result<Value, GoogleError>;

    /// Scopes actually granted to `token`, as reported by the tokeninfo endpoint.
    async fn granted_scopes(&self, token: &str) -> Result<Vec<String>, GoogleError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16, message: &str, details: &str) -> GoogleError {
        GoogleError::Status {
            status,
            message: message.to_string(),
            details: details.to_string(),
        }
    }

    #[test]
    fn test_api_disabled_detected_from_reason() {
        let err = status(
            403,
            "Forbidden",
            r#"{"error":{"errors":[{"reason":"accessNotConfigured"}]}}"#,
        );
        assert!(err.is_api_disabled());
        assert!(err.is_forbidden());
    }

    #[test]
    fn test_api_disabled_detected_from_message() {
        let err = status(
            403,
            "Google Drive API has not been used in project 123 before or it is disabled.",
            "",
        );
        assert!(err.is_api_disabled());
    }

    #[test]
    fn test_plain_forbidden_is_not_api_disabled() {
        let err = status(403, "The caller does not have permission", "{}");
        assert!(!err.is_api_disabled());
        assert!(err.is_forbidden());
    }

    #[test]
    fn test_disabled_marker_ignored_outside_403() {
        let err = status(400, "SERVICE_DISABLED", "");
        assert!(!err.is_api_disabled());
    }

    #[test]
    fn test_unauthorized() {
        assert!(status(401, "Invalid Credentials", "").is_unauthorized());
        assert!(!GoogleError::Url("x".into()).is_unauthorized());
    }
}
