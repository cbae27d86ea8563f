use serde::{Deserialize, Serialize};

use crate::google::{SpreadsheetInfo, WorksheetInfo};

#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListSpreadsheetsRequest {
    #[serde(default)]
    pub google_token: Option<String>,
}

/// Every `/list-spreadsheets` answer, success or not, carries `files`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetsResponse {
    #[serde(default)]
    pub files: Vec<SpreadsheetInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub api_activation_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl SpreadsheetsResponse {
    pub fn files(files: Vec<SpreadsheetInfo>) -> Self {
        Self {
            files,
            ..Default::default()
        }
    }

    pub fn failure(code: &str, error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            error: Some(error.into()),
            code: Some(code.to_string()),
            details,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListWorksheetsRequest {
    #[serde(default)]
    pub google_token: Option<String>,
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct WorksheetsResponse {
    pub sheets: Vec<WorksheetInfo>,
    pub success: bool,
}
