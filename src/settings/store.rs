use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Settings, UserSettings};

/// Persistence for per-user settings: one row per user, overwritten in place.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, user_id: Uuid) -> Result<Option<UserSettings>, sqlx::Error>;

    async fn upsert(&self, user_id: Uuid, settings: &Settings)
        -> Result<UserSettings, sqlx::Error>;
}

pub struct PgSettingsStore {
    pool: PgPool,
}

impl PgSettingsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<UserSettings>, sqlx::Error> {
        sqlx::query_as::<_, UserSettings>(
            "SELECT user_id, settings, updated_at FROM user_settings WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn upsert(
        &self,
        user_id: Uuid,
        settings: &Settings,
    ) -> Result<UserSettings, sqlx::Error> {
        sqlx::query_as::<_, UserSettings>(
            "INSERT INTO user_settings (user_id, settings, updated_at) VALUES ($1, $2, now()) \
             ON CONFLICT (user_id) DO UPDATE SET settings = EXCLUDED.settings, updated_at = now() \
             RETURNING user_id, settings, updated_at",
        )
        .bind(user_id)
        .bind(Json(settings))
        .fetch_one(&self.pool)
        .await
    }
}

/// Store backed by a concurrent map, for tests and local runs without Postgres.
#[derive(Default)]
pub struct InMemorySettingsStore {
    rows: DashMap<Uuid, UserSettings>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<UserSettings>, sqlx::Error> {
        Ok(self.rows.get(&user_id).map(|row| row.clone()))
    }

    async fn upsert(
        &self,
        user_id: Uuid,
        settings: &Settings,
    ) -> Result<UserSettings, sqlx::Error> {
        let row = UserSettings {
            user_id,
            settings: Json(settings.clone()),
            updated_at: Utc::now(),
        };
        self.rows.insert(user_id, row.clone());
        Ok(row)
    }
}
