//! Typed client for the receipt API, with the per-user query cache in front
//! of the read endpoints.

pub mod models;

use std::sync::Arc;

use chrono::Utc;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::cache::{QueryCache, Resource};
use crate::expenses::models::{ExpenseData, SubmitExpenseResponse};
use crate::google::WorksheetInfo;
use crate::session::{Session, SessionManager};
use crate::settings::models::{EnvVars, SaveSettingsResponse, Settings, SuccessResponse};
use crate::sheets::models::{
    ListSpreadsheetsRequest, ListWorksheetsRequest, SpreadsheetsResponse, WorksheetsResponse,
};
pub use models::{ClientError, SpreadsheetListing};
use models::WireError;

/// Shares the session manager's cache, and signs the user out when Google
/// rejects their provider token.
pub struct ApiClient {
    http: Client,
    base_url: String,
    sessions: Arc<SessionManager>,
    cache: Arc<QueryCache>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        sessions: Arc<SessionManager>,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            http: Client::builder().build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: sessions.cache().clone(),
            sessions,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        session: &Session,
    ) -> Result<T, ClientError> {
        let response = request.bearer_auth(&session.access_token).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let wire = response.json::<WireError>().await.unwrap_or_default();
        Err(ClientError::from_wire(status.as_u16(), wire))
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        session: &Session,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(self.http.post(self.url(path)).json(body), session)
            .await
    }

    pub async fn fetch_settings(&self, session: &Session) -> Result<Settings, ClientError> {
        self.cache
            .get_or_fetch(Resource::Settings, session.user.id, || async {
                info!("Fetching settings");
                self.send(self.http.get(self.url("get-settings")), session)
                    .await
            })
            .await
    }

    pub async fn save_settings(
        &self,
        session: &Session,
        settings: &Settings,
    ) -> Result<SaveSettingsResponse, ClientError> {
        if settings.target().is_none() {
            return Err(ClientError::Validation(
                "L'ID du Google Sheets et le nom de la feuille sont obligatoires".to_string(),
            ));
        }

        let saved: SaveSettingsResponse = self.post("save-settings", session, settings).await?;
        self.cache
            .invalidate_resource(&Resource::Settings, session.user.id);
        info!(user_id = %session.user.id, "Settings saved");

        // Not critical: the save already succeeded.
        if let Err(e) = self.update_env_vars(session, &EnvVars::from(settings)).await {
            warn!("Failed to update environment variables, continuing: {}", e);
        }

        Ok(saved)
    }

    pub async fn update_env_vars(
        &self,
        session: &Session,
        vars: &EnvVars,
    ) -> Result<SuccessResponse, ClientError> {
        self.post("update-env-vars", session, vars).await
    }

    pub async fn list_spreadsheets(
        &self,
        session: &Session,
    ) -> Result<SpreadsheetListing, ClientError> {
        let google_token = session
            .provider_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(ClientError::ReconnectRequired)?;

        let fetched = self
            .cache
            .get_or_fetch(Resource::Spreadsheets, session.user.id, || async {
                let body = ListSpreadsheetsRequest {
                    google_token: Some(google_token),
                };
                let response: SpreadsheetsResponse =
                    self.post("list-spreadsheets", session, &body).await?;
                Ok::<_, ClientError>(SpreadsheetListing::from(response))
            })
            .await;

        // A fresh login re-requests every scope.
        let listing = match fetched {
            Err(ClientError::ReconnectRequired) => {
                warn!(user_id = %session.user.id, "Google rejected the provider token, signing out");
                self.sessions.logout();
                return Err(ClientError::ReconnectRequired);
            }
            other => other?,
        };

        // The user is expected to enable the API and retry.
        if matches!(listing, SpreadsheetListing::ApiActivationRequired { .. }) {
            self.cache
                .invalidate_resource(&Resource::Spreadsheets, session.user.id);
        }

        Ok(listing)
    }

    pub async fn list_worksheets(
        &self,
        session: &Session,
        spreadsheet_id: &str,
    ) -> Result<Vec<WorksheetInfo>, ClientError> {
        let google_token = session
            .provider_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(ClientError::ReconnectRequired)?;

        self.cache
            .get_or_fetch(
                Resource::Worksheets(spreadsheet_id.to_string()),
                session.user.id,
                || async {
                    let body = ListWorksheetsRequest {
                        google_token: Some(google_token),
                        spreadsheet_id: Some(spreadsheet_id.to_string()),
                    };
                    let response: WorksheetsResponse =
                        self.post("list-worksheets", session, &body).await?;
                    Ok(response.sheets)
                },
            )
            .await
    }

    /// Refuses to send anything until the user's settings name a sheet.
    pub async fn submit_expense(
        &self,
        session: &Session,
        mut expense: ExpenseData,
    ) -> Result<SubmitExpenseResponse, ClientError> {
        let settings = self.fetch_settings(session).await?;
        if settings.target().is_none() {
            return Err(ClientError::Configuration(
                "Veuillez configurer vos paramètres Google Sheets avant de soumettre une dépense"
                    .to_string(),
            ));
        }

        expense.google_token = Some(
            session
                .provider_token
                .clone()
                .filter(|t| !t.is_empty())
                .ok_or(ClientError::ReconnectRequired)?,
        );
        expense.user_id = Some(session.user.id);
        expense.created_at = Some(Utc::now());

        self.post("submit-expense", session, &expense)
            .await
            .inspect_err(|e| error!("Error submitting expense: {}", e))
    }
}
