pub mod models;
pub mod store;

use actix_web::{get, post, web, HttpResponse};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ErrorEnvelope};
use crate::state::AppState;
use models::{EnvVars, SaveSettings, SaveSettingsResponse, Settings, SuccessResponse};

#[utoipa::path(
    get,
    path = "/get-settings",
    responses(
        (status = 200, description = "Stored settings, or {} when none exist", body = Settings),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorEnvelope)
    ),
    security(("bearer" = []))
)]
#[get("/get-settings")]
pub async fn get_settings(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    info!(user_id = %user.id, "Fetching settings");

    let settings = match state.settings.get(user.id).await? {
        Some(row) => row.settings.0,
        None => {
            info!(user_id = %user.id, "No settings stored, returning empty object");
            Settings::default()
        }
    };

    Ok(HttpResponse::Ok().json(settings))
}

#[utoipa::path(
    post,
    path = "/save-settings",
    request_body = SaveSettings,
    responses(
        (status = 200, description = "Settings upserted", body = SaveSettingsResponse),
        (status = 400, description = "spreadsheetId or sheetName missing", body = ErrorEnvelope),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorEnvelope)
    ),
    security(("bearer" = []))
)]
#[post("/save-settings")]
pub async fn save_settings(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    payload: web::Json<SaveSettings>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();

    if payload.validate().is_err() {
        warn!(user_id = %user.id, "Missing required settings fields");
        return Err(ApiError::validation("Missing required settings fields"));
    }

    let settings = Settings::from(payload);
    let row = state.settings.upsert(user.id, &settings).await?;
    info!(user_id = %user.id, "Settings saved");

    record_env_vars(user.id, &EnvVars::from(&settings));

    Ok(HttpResponse::Ok().json(SaveSettingsResponse {
        success: true,
        message: "Settings saved successfully".to_string(),
        data: row,
    }))
}

#[utoipa::path(
    post,
    path = "/update-env-vars",
    request_body = EnvVars,
    responses(
        (status = 200, description = "Values recorded", body = SuccessResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorEnvelope)
    ),
    security(("bearer" = []))
)]
#[post("/update-env-vars")]
pub async fn update_env_vars(
    user: AuthenticatedUser,
    payload: web::Json<EnvVars>,
) -> HttpResponse {
    record_env_vars(user.id, &payload);

    HttpResponse::Ok().json(SuccessResponse {
        success: true,
        message: "Environment variables updated".to_string(),
    })
}

/// Best-effort publication of the user's current target. Never fails the caller.
fn record_env_vars(user_id: Uuid, vars: &EnvVars) {
    let entries = [
        ("SPREADSHEET_ID", vars.spreadsheet_id.as_deref()),
        ("SHEET_NAME", vars.sheet_name.as_deref()),
    ];

    for (key, value) in entries {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            info!(%user_id, key, value, "Setting environment variable");
        }
    }
}
