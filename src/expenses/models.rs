use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::settings::models::not_blank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum Category {
    Restaurant,
    Transport,
    #[serde(rename = "Hébergement")]
    Hebergement,
    Fournitures,
    Autre,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Restaurant,
        Category::Transport,
        Category::Hebergement,
        Category::Fournitures,
        Category::Autre,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Restaurant => "Restaurant",
            Category::Transport => "Transport",
            Category::Hebergement => "Hébergement",
            Category::Fournitures => "Fournitures",
            Category::Autre => "Autre",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One expense as entered by the user. Never stored; it becomes one sheet row.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct ExpenseData {
    #[serde(default)]
    #[validate(custom(function = "iso_date"))]
    #[schema(example = "2024-01-01")]
    pub date: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub commercant: String,
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0))]
    pub montant_ttc: f64,
    #[serde(default)]
    #[validate(required)]
    pub categorie: Option<Category>,
    #[serde(default)]
    pub motif: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Provider token used for the Sheets call.
    #[serde(rename = "googleToken", default, skip_serializing_if = "Option::is_none")]
    pub google_token: Option<String>,
}

fn iso_date(value: &str) -> Result<(), ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ValidationError::new("iso_date"))
}

impl ExpenseData {
    pub fn new(
        date: impl Into<String>,
        commercant: impl Into<String>,
        montant_ttc: f64,
        categorie: Category,
        motif: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            commercant: commercant.into(),
            montant_ttc,
            categorie: Some(categorie),
            motif: Some(motif.into()),
            user_id: None,
            created_at: None,
            google_token: None,
        }
    }

    /// Names of the fields that fail validation, sorted.
    pub fn invalid_fields(&self) -> Vec<String> {
        match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => {
                let mut fields: Vec<String> = errors
                    .field_errors()
                    .keys()
                    .map(|k| k.to_string())
                    .collect();
                fields.sort();
                fields
            }
        }
    }

    /// Values for columns A–E in order: Date, Commerçant, Montant TTC, Catégorie, Motif.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.date.trim().to_string(),
            self.commercant.trim().to_string(),
            self.montant_ttc.to_string(),
            self.categorie.map(|c| c.label().to_string()).unwrap_or_default(),
            self.motif.clone().unwrap_or_default(),
        ]
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubmitExpenseResponse {
    pub success: bool,
    pub message: String,
    #[schema(value_type = Object)]
    pub details: Value,
}
