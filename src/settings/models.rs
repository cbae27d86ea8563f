use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// A user's target spreadsheet. Serialized as `{}` when nothing is stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
}

impl Settings {
    pub fn new(spreadsheet_id: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: Some(spreadsheet_id.into()),
            sheet_name: Some(sheet_name.into()),
        }
    }

    /// The append target, only when both fields are filled in.
    pub fn target(&self) -> Option<SheetTarget> {
        let spreadsheet_id = self.spreadsheet_id.as_deref().map(str::trim)?;
        let sheet_name = self.sheet_name.as_deref().map(str::trim)?;

        if spreadsheet_id.is_empty() || sheet_name.is_empty() {
            return None;
        }

        Some(SheetTarget {
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_name: sheet_name.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetTarget {
    pub spreadsheet_id: String,
    pub sheet_name: String,
}

impl SheetTarget {
    /// Columns A–E: Date, Commerçant, Montant TTC, Catégorie, Motif.
    pub fn range(&self) -> String {
        format!("{}!A:E", self.sheet_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveSettings {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub spreadsheet_id: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub sheet_name: String,
}

impl From<SaveSettings> for Settings {
    fn from(payload: SaveSettings) -> Self {
        Settings::new(payload.spreadsheet_id.trim(), payload.sheet_name.trim())
    }
}

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// One row of `user_settings`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct UserSettings {
    pub user_id: Uuid,
    #[schema(value_type = Settings)]
    pub settings: Json<Settings>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SaveSettingsResponse {
    pub success: bool,
    pub message: String,
    pub data: UserSettings,
}

/// Body of `/update-env-vars`. Keys mirror the environment variables they shadow.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EnvVars {
    #[serde(rename = "SPREADSHEET_ID", default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,
    #[serde(rename = "SHEET_NAME", default, skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
}

impl From<&Settings> for EnvVars {
    fn from(settings: &Settings) -> Self {
        EnvVars {
            spreadsheet_id: settings.spreadsheet_id.clone(),
            sheet_name: settings.sheet_name.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}
