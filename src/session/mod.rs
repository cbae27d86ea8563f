//! Client-side session lifecycle for the identity provider.
//!
//! One [`SessionManager`] owns the current session, notifies listeners on
//! every transition and clears the departing user's cache entries.

pub mod oauth;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::QueryCache;
use crate::google::{GoogleApi, GoogleError, REQUIRED_SCOPES};
pub use oauth::OAuthConfig;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid identity provider url: {0}")]
    InvalidAuthUrl(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for this app's backend.
    pub access_token: String,
    /// Google token for the Drive/Sheets APIs.
    pub provider_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: SessionUser,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(SessionEvent, Option<&Session>) + Send + Sync>;

pub struct SessionManager {
    current: watch::Sender<Option<Session>>,
    listeners: DashMap<SubscriptionId, Listener>,
    next_id: AtomicU64,
    cache: Arc<QueryCache>,
    oauth: OAuthConfig,
}

impl SessionManager {
    pub fn new(oauth: OAuthConfig, cache: Arc<QueryCache>) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            current,
            listeners: DashMap::new(),
            next_id: AtomicU64::new(0),
            cache,
            oauth,
        }
    }

    /// The current session, unless its access token has expired.
    pub fn get_session(&self) -> Option<Session> {
        self.current
            .borrow()
            .as_ref()
            .filter(|session| !session.is_expired())
            .cloned()
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Async view of the session, for tasks that prefer awaiting changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.current.subscribe()
    }

    pub fn on_session_change<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(SessionEvent, Option<&Session>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.insert(id, Box::new(callback));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Signs out, then returns the provider URL to redirect the user to.
    pub fn login(&self) -> Result<Url, SessionError> {
        self.sign_out();
        let url = self.oauth.authorize_url()?;
        info!("Redirecting to identity provider");
        Ok(url)
    }

    /// Installs the session handed back by the provider redirect.
    pub fn complete_login(&self, session: Session) {
        info!(user_id = %session.user.id, "Signed in");
        self.current.send_replace(Some(session.clone()));
        self.notify(SessionEvent::SignedIn, Some(&session));
    }

    pub fn refresh(&self, session: Session) {
        debug!(user_id = %session.user.id, "Token refreshed");
        self.current.send_replace(Some(session.clone()));
        self.notify(SessionEvent::TokenRefreshed, Some(&session));
    }

    pub fn logout(&self) {
        self.sign_out();
    }

    fn sign_out(&self) {
        let previous = self.current.send_replace(None);

        if let Some(previous) = previous {
            self.cache.invalidate(previous.user.id);
            info!(user_id = %previous.user.id, "Signed out");
            self.notify(SessionEvent::SignedOut, None);
        }
    }

    fn notify(&self, event: SessionEvent, session: Option<&Session>) {
        for listener in self.listeners.iter() {
            (listener.value())(event, session);
        }
    }

    /// Cheap check: a provider token is present. Says nothing about its scopes.
    pub fn provider_token_present(&self) -> bool {
        self.get_session()
            .and_then(|s| s.provider_token)
            .is_some_and(|t| !t.is_empty())
    }

    /// Asks Google which scopes the provider token actually carries.
    /// A token Google rejects counts as lacking the scopes.
    pub async fn has_required_scopes(&self, google: &dyn GoogleApi) -> Result<bool, GoogleError> {
        let Some(token) = self.get_session().and_then(|s| s.provider_token) else {
            return Ok(false);
        };

        match google.granted_scopes(&token).await {
            Ok(granted) => Ok(REQUIRED_SCOPES
                .iter()
                .all(|required| granted.iter().any(|g| g == required))),
            Err(err) if err.status().is_some_and(|s| (400..500).contains(&s)) => Ok(false),
            Err(err) => Err(err),
        }
    }
}
