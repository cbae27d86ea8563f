use std::env;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_SHEET_NAME: &str = "Dépenses";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime settings, read once at startup from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub auth: AuthConfig,
    pub fallback: FallbackTarget,
    pub google_timeout: Duration,
    pub allowed_origins: Vec<String>,
    pub rate_limit_burst: u32,
    pub rate_limit_period: Duration,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub audience: String,
}

/// Spreadsheet used by submit-expense when the user has no stored settings.
#[derive(Debug, Clone, Default)]
pub struct FallbackTarget {
    pub spreadsheet_id: Option<String>,
    pub sheet_name: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: optional("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed("PORT", 8080)?,
            db_max_connections: parsed("DB_MAX_CONNECTIONS", 5)?,
            auth: AuthConfig {
                jwt_secret: required("SUPABASE_JWT_SECRET")?,
                audience: optional("JWT_AUDIENCE").unwrap_or_else(|| "authenticated".to_string()),
            },
            fallback: FallbackTarget {
                spreadsheet_id: optional("SPREADSHEET_ID"),
                sheet_name: optional("SHEET_NAME")
                    .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string()),
            },
            google_timeout: Duration::from_secs(parsed("GOOGLE_API_TIMEOUT_SECS", 15)?),
            allowed_origins: optional("CORS_ALLOWED_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            rate_limit_burst: parsed("RATE_LIMIT_BURST", 10)?,
            rate_limit_period: Duration::from_millis(parsed("RATE_LIMIT_PERIOD_MS", 500)?),
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

fn parsed<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_falls_back_to_default() {
        assert_eq!(parsed("RECEIPT_API_TEST_UNSET_KEY", 42u16).unwrap(), 42);
    }

    #[test]
    fn test_parsed_rejects_garbage() {
        env::set_var("RECEIPT_API_TEST_BAD_PORT", "eighty");
        let err = parsed::<u16>("RECEIPT_API_TEST_BAD_PORT", 8080).unwrap_err();
        assert!(err.to_string().contains("RECEIPT_API_TEST_BAD_PORT"));
        env::remove_var("RECEIPT_API_TEST_BAD_PORT");
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        env::set_var("RECEIPT_API_TEST_BLANK", "   ");
        assert!(matches!(
            required("RECEIPT_API_TEST_BLANK"),
            Err(ConfigError::Missing("RECEIPT_API_TEST_BLANK"))
        ));
        env::remove_var("RECEIPT_API_TEST_BLANK");
    }
}
