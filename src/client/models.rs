use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::codes;
use crate::google::SpreadsheetInfo;
use crate::sheets::models::SpreadsheetsResponse;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Configuration(String),

    #[error("Veuillez vous reconnecter pour accéder à Google Sheets")]
    ReconnectRequired,

    #[error("API error ({status}, {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Error body as the API sends it. Every field is optional so that a
/// proxy's HTML error page still maps to something.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireError {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ClientError {
    pub(crate) fn from_wire(status: u16, wire: WireError) -> Self {
        let message = wire
            .message
            .or(wire.error)
            .unwrap_or_else(|| format!("HTTP {status}"));

        match wire.code.as_deref() {
            Some(codes::VALIDATION) => Self::Validation(message),
            Some(codes::CONFIGURATION) => Self::Configuration(message),
            Some(codes::RECONNECT_REQUIRED) => Self::ReconnectRequired,
            Some(codes::AUTHENTICATION) => Self::NotAuthenticated,
            code => Self::Api {
                status,
                code: code.unwrap_or(codes::UPSTREAM).to_string(),
                message,
            },
        }
    }

    /// The user should sign in again with Google before retrying.
    pub fn needs_reconnect(&self) -> bool {
        matches!(self, Self::ReconnectRequired | Self::NotAuthenticated)
    }
}

/// Outcome of listing the user's spreadsheets, with the two non-error
/// special cases spelled out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpreadsheetListing {
    Files { files: Vec<SpreadsheetInfo> },
    Empty { message: String },
    ApiActivationRequired { activation_url: String },
}

impl From<SpreadsheetsResponse> for SpreadsheetListing {
    fn from(response: SpreadsheetsResponse) -> Self {
        if response.api_activation_required {
            return Self::ApiActivationRequired {
                activation_url: response.activation_url.unwrap_or_default(),
            };
        }

        if response.files.is_empty() {
            Self::Empty {
                message: response.message.unwrap_or_default(),
            }
        } else {
            Self::Files {
                files: response.files,
            }
        }
    }
}
