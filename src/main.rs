use std::io;
use std::sync::Arc;

use receipt_api::api;
use receipt_api::auth::JwtVerifier;
use receipt_api::config::AppConfig;
use receipt_api::db;
use receipt_api::google::GoogleClient;
use receipt_api::settings::store::PgSettingsStore;
use receipt_api::state::AppState;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("receipt_api=info,actix_web=info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let db_pool = db::init_db(&config).await.map_err(io::Error::other)?;
    let google = GoogleClient::new(config.google_timeout).map_err(io::Error::other)?;

    let state = AppState::new(
        Arc::new(PgSettingsStore::new(db_pool)),
        Arc::new(google),
        config.fallback.clone(),
    );
    let verifier = JwtVerifier::new(&config.auth);

    api::run_api(&config, state, verifier).await
}
