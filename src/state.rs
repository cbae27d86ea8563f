use std::sync::Arc;

use crate::config::FallbackTarget;
use crate::google::GoogleApi;
use crate::settings::store::SettingsStore;

/// Shared, read-only handles every handler needs. Holds no per-request state.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<dyn SettingsStore>,
    pub google: Arc<dyn GoogleApi>,
    pub fallback: FallbackTarget,
}

impl AppState {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        google: Arc<dyn GoogleApi>,
        fallback: FallbackTarget,
    ) -> Self {
        Self {
            settings,
            google,
            fallback,
        }
    }
}
