use serde::{Deserialize, Serialize};

pub const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

pub const DRIVE_ACTIVATION_URL: &str =
    "https://console.developers.google.com/apis/api/drive.googleapis.com/overview";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub created_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct WorksheetInfo {
    pub title: String,
    pub index: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileList {
    #[serde(default)]
    pub files: Vec<SpreadsheetInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpreadsheetMetadata {
    #[serde(default)]
    pub sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SheetEntry {
    pub properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SheetProperties {
    pub title: String,
    #[serde(default)]
    pub index: u32,
}

impl From<SheetEntry> for WorksheetInfo {
    fn from(entry: SheetEntry) -> Self {
        WorksheetInfo {
            title: entry.properties.title,
            index: entry.properties.index,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ValueRange<'a> {
    pub values: [&'a [String]; 1],
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenInfo {
    #[serde(default)]
    pub scope: String,
}

/// Google's JSON error body: `{"error": {"code", "message", "status", ...}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub message: String,
}
