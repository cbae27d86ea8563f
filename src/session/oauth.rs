use reqwest::Url;

use super::SessionError;
use crate::google::REQUIRED_SCOPES;

/// Where the identity provider lives and where it sends the user back.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub auth_base_url: String,
    pub redirect_to: String,
    pub provider: String,
}

impl OAuthConfig {
    pub fn new(auth_base_url: impl Into<String>, redirect_to: impl Into<String>) -> Self {
        Self {
            auth_base_url: auth_base_url.into(),
            redirect_to: redirect_to.into(),
            provider: "google".to_string(),
        }
    }

    /// Provider redirect requesting every required scope. `prompt=consent`
    /// makes Google re-issue the provider token with the full scope set.
    pub fn authorize_url(&self) -> Result<Url, SessionError> {
        let base = format!(
            "{}/auth/v1/authorize",
            self.auth_base_url.trim_end_matches('/')
        );
        let mut url = Url::parse(&base).map_err(|e| SessionError::InvalidAuthUrl(e.to_string()))?;

        url.query_pairs_mut()
            .append_pair("provider", &self.provider)
            .append_pair("redirect_to", &self.redirect_to)
            .append_pair("scopes", &REQUIRED_SCOPES.join(" "))
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent")
            .append_pair("include_granted_scopes", "true");

        Ok(url)
    }
}
