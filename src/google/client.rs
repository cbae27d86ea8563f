use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use super::models::{
    ErrorBody, FileList, SpreadsheetMetadata, TokenInfo, ValueRange, SPREADSHEET_MIME_TYPE,
};
use super::{GoogleApi, GoogleError, SpreadsheetInfo, WorksheetInfo};

const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";
const OAUTH_BASE_URL: &str = "https://oauth2.googleapis.com";

/// reqwest-backed [`GoogleApi`]. The provider token is per request, so one
/// client serves every user.
#[derive(Clone)]
pub struct GoogleClient {
    client: Client,
    drive_base_url: String,
    sheets_base_url: String,
    oauth_base_url: String,
}

impl GoogleClient {
    pub fn new(timeout: Duration) -> Result<Self, GoogleError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("receipt_api/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            drive_base_url: DRIVE_BASE_URL.to_string(),
            sheets_base_url: SHEETS_BASE_URL.to_string(),
            oauth_base_url: OAUTH_BASE_URL.to_string(),
        })
    }

    /// Points every API at `base_url` (e.g. a local proxy).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.drive_base_url = format!("{base}/drive/v3");
        self.sheets_base_url = format!("{base}/v4");
        self.oauth_base_url = base.to_string();
        self
    }

    fn sheets_url(&self, segments: &[&str]) -> Result<Url, GoogleError> {
        let mut url =
            Url::parse(&self.sheets_base_url).map_err(|e| GoogleError::Url(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| GoogleError::Url(self.sheets_base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        token: &str,
    ) -> Result<T, GoogleError> {
        let response = request.bearer_auth(token).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn check_status(response: Response) -> Result<Response, GoogleError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let details = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&details)
        .ok()
        .map(|body| body.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

    error!(status = status.as_u16(), %message, "Google API error");

    Err(GoogleError::Status {
        status: status.as_u16(),
        message,
        details,
    })
}

#[async_trait]
impl GoogleApi for GoogleClient {
    async fn list_spreadsheets(&self, token: &str) -> Result<Vec<SpreadsheetInfo>, GoogleError> {
        let query = format!("mimeType='{SPREADSHEET_MIME_TYPE}'");
        let request = self
            .client
            .get(format!("{}/files", self.drive_base_url))
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name,createdTime)"),
                ("pageSize", "1000"),
            ]);

        let list: FileList = self.send(request, token).await?;
        debug!(count = list.files.len(), "Drive files.list returned");
        Ok(list.files)
    }

    async fn list_worksheets(
        &self,
        token: &str,
        spreadsheet_id: &str,
    ) -> Result<Vec<WorksheetInfo>, GoogleError> {
        let url = self.sheets_url(&["spreadsheets", spreadsheet_id])?;
        let request = self
            .client
            .get(url)
            .query(&[("fields", "sheets.properties")]);

        let metadata: SpreadsheetMetadata = self.send(request, token).await?;
        Ok(metadata.sheets.into_iter().map(WorksheetInfo::from).collect())
    }

    async fn append_row(
        &self,
        token: &str,
        spreadsheet_id: &str,
        range: &str,
        row: &[String],
    ) -> Result<Value, GoogleError> {
        let append = format!("{range}:append");
        let url = self.sheets_url(&["spreadsheets", spreadsheet_id, "values", &append])?;
        let request = self
            .client
            .post(url)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&ValueRange { values: [row] });

        self.send(request, token).await
    }

    async fn granted_scopes(&self, token: &str) -> Result<Vec<String>, GoogleError> {
        let response = self
            .client
            .get(format!("{}/tokeninfo", self.oauth_base_url))
            .query(&[("access_token", token)])
            .send()
            .await?;
        let info: TokenInfo = check_status(response).await?.json().await?;

        Ok(info.scope.split_whitespace().map(String::from).collect())
    }
}
