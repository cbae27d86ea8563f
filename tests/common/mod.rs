#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use actix_web::web;
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use receipt_api::auth::{Claims, JwtVerifier};
use receipt_api::config::{AuthConfig, FallbackTarget, DEFAULT_SHEET_NAME};
use receipt_api::google::{GoogleApi, GoogleError, SpreadsheetInfo, WorksheetInfo};
use receipt_api::settings::store::{InMemorySettingsStore, SettingsStore};
use receipt_api::state::AppState;
use serde_json::{json, Value};
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const AUDIENCE: &str = "authenticated";
pub const GOOGLE_TOKEN: &str = "ya29.test-provider-token";

#[derive(Debug, Clone, PartialEq)]
pub struct AppendCall {
    pub token: String,
    pub spreadsheet_id: String,
    pub range: String,
    pub row: Vec<String>,
}

/// Stand-in for Google that records what it was asked to do.
#[derive(Default)]
pub struct FakeGoogle {
    pub spreadsheets: Vec<SpreadsheetInfo>,
    pub worksheets: Vec<WorksheetInfo>,
    pub scopes: Vec<String>,
    failure: Mutex<Option<(u16, String)>>,
    pub appended: Mutex<Vec<AppendCall>>,
    pub list_calls: AtomicUsize,
}

impl FakeGoogle {
    pub fn with_spreadsheets(mut self, names: &[&str]) -> Self {
        self.spreadsheets = names
            .iter()
            .enumerate()
            .map(|(i, name)| SpreadsheetInfo {
                id: format!("sheet-{i}"),
                name: name.to_string(),
                created_time: "2024-01-01T00:00:00.000Z".to_string(),
            })
            .collect();
        self
    }

    pub fn with_worksheets(mut self, titles: &[&str]) -> Self {
        self.worksheets = titles
            .iter()
            .enumerate()
            .map(|(i, title)| WorksheetInfo {
                title: title.to_string(),
                index: i as u32,
            })
            .collect();
        self
    }

    pub fn with_scopes(mut self, scopes: &[&str]) -> Self {
        self.scopes = scopes.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Every subsequent call fails with this Google status and message.
    pub fn fail_with(&self, status: u16, message: &str) {
        *self.failure.lock().unwrap() = Some((status, message.to_string()));
    }

    pub fn appended(&self) -> Vec<AppendCall> {
        self.appended.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), GoogleError> {
        match self.failure.lock().unwrap().clone() {
            Some((status, message)) => Err(GoogleError::Status {
                status,
                details: json!({ "error": { "code": status, "message": message } }).to_string(),
                message,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GoogleApi for FakeGoogle {
    async fn list_spreadsheets(&self, _token: &str) -> Result<Vec<SpreadsheetInfo>, GoogleError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.spreadsheets.clone())
    }

    async fn list_worksheets(
        &self,
        _token: &str,
        _spreadsheet_id: &str,
    ) -> Result<Vec<WorksheetInfo>, GoogleError> {
        self.check()?;
        Ok(self.worksheets.clone())
    }

    async fn append_row(
        &self,
        token: &str,
        spreadsheet_id: &str,
        range: &str,
        row: &[String],
    ) -> Result<Value, GoogleError> {
        self.check()?;
        self.appended.lock().unwrap().push(AppendCall {
            token: token.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
            row: row.to_vec(),
        });
        Ok(json!({
            "spreadsheetId": spreadsheet_id,
            "updates": { "updatedRange": range, "updatedRows": 1 }
        }))
    }

    async fn granted_scopes(&self, _token: &str) -> Result<Vec<String>, GoogleError> {
        self.check()?;
        Ok(self.scopes.clone())
    }
}

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: JWT_SECRET.to_string(),
        audience: AUDIENCE.to_string(),
    }
}

pub fn verifier() -> web::Data<JwtVerifier> {
    web::Data::new(JwtVerifier::new(&auth_config()))
}

pub fn no_fallback() -> FallbackTarget {
    FallbackTarget {
        spreadsheet_id: None,
        sheet_name: DEFAULT_SHEET_NAME.to_string(),
    }
}

pub fn state(
    store: Arc<InMemorySettingsStore>,
    google: Arc<FakeGoogle>,
    fallback: FallbackTarget,
) -> web::Data<AppState> {
    let settings: Arc<dyn SettingsStore> = store;
    let google: Arc<dyn GoogleApi> = google;
    web::Data::new(AppState::new(settings, google, fallback))
}

pub fn token_for(user_id: Uuid) -> String {
    mint(user_id, JWT_SECRET)
}

pub fn mint(user_id: Uuid, secret: &str) -> String {
    let claims = Claims {
        sub: user_id,
        exp: (Utc::now().timestamp() + 3600) as usize,
        aud: Some(AUDIENCE.to_string()),
        email: Some("user@example.com".to_string()),
        role: Some("authenticated".to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn bearer(user_id: Uuid) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token_for(user_id)))
}
