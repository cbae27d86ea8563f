pub mod models;

use actix_web::{post, web, HttpResponse};
use tracing::{error, info, warn};

use crate::auth::AuthenticatedUser;
use crate::error::{codes, upstream_code, upstream_status, ApiError, ErrorEnvelope};
use crate::google::models::DRIVE_ACTIVATION_URL;
use crate::state::AppState;
use models::{
    ListSpreadsheetsRequest, ListWorksheetsRequest, SpreadsheetsResponse, WorksheetsResponse,
};

/// Returns the value if present and not blank.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[utoipa::path(
    post,
    path = "/list-spreadsheets",
    request_body = ListSpreadsheetsRequest,
    responses(
        (status = 200, description = "Spreadsheets of the Google account, or apiActivationRequired", body = SpreadsheetsResponse),
        (status = 400, description = "Missing Google provider token", body = SpreadsheetsResponse),
        (status = 401, description = "Google token rejected, reconnection required", body = SpreadsheetsResponse)
    ),
    security(("bearer" = []))
)]
#[post("/list-spreadsheets")]
pub async fn list_spreadsheets(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    payload: web::Json<ListSpreadsheetsRequest>,
) -> HttpResponse {
    let Some(google_token) = non_blank(payload.into_inner().google_token) else {
        warn!(user_id = %user.id, "Missing Google provider token");
        return HttpResponse::BadRequest().json(SpreadsheetsResponse::failure(
            codes::RECONNECT_REQUIRED,
            "Missing Google provider token. Reconnection may be required.",
            None,
        ));
    };

    info!(user_id = %user.id, "Fetching spreadsheets list from Google Drive API");

    match state.google.list_spreadsheets(&google_token).await {
        Ok(files) if files.is_empty() => {
            info!(user_id = %user.id, "No spreadsheets found for this Google account");
            HttpResponse::Ok().json(SpreadsheetsResponse {
                message: Some("Aucun Google Sheets trouvé sur votre compte".to_string()),
                ..Default::default()
            })
        }
        Ok(files) => {
            info!(user_id = %user.id, count = files.len(), "Found spreadsheets");
            HttpResponse::Ok().json(SpreadsheetsResponse::files(files))
        }
        Err(err) if err.is_api_disabled() => {
            warn!(user_id = %user.id, "Google Drive API activation required");
            HttpResponse::Ok().json(SpreadsheetsResponse {
                api_activation_required: true,
                activation_url: Some(DRIVE_ACTIVATION_URL.to_string()),
                message: Some("L'API Google Drive n'est pas activée".to_string()),
                ..Default::default()
            })
        }
        Err(err) if err.is_unauthorized() => HttpResponse::Unauthorized().json(
            SpreadsheetsResponse::failure(
                codes::RECONNECT_REQUIRED,
                "Erreur d'authentification Google Drive. Veuillez vous reconnecter avec les permissions appropriées.",
                err.details().map(String::from),
            ),
        ),
        Err(err) => {
            error!(user_id = %user.id, error = %err, "Drive files.list failed");
            HttpResponse::build(upstream_status(&err)).json(SpreadsheetsResponse::failure(
                upstream_code(&err),
                format!("Erreur API Google Drive: {}", err.message()),
                err.details().map(String::from),
            ))
        }
    }
}

#[utoipa::path(
    post,
    path = "/list-worksheets",
    request_body = ListWorksheetsRequest,
    responses(
        (status = 200, description = "Worksheets of the spreadsheet", body = WorksheetsResponse),
        (status = 400, description = "Missing token or spreadsheet id", body = ErrorEnvelope),
        (status = 403, description = "No access to this spreadsheet", body = ErrorEnvelope)
    ),
    security(("bearer" = []))
)]
#[post("/list-worksheets")]
pub async fn list_worksheets(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    payload: web::Json<ListWorksheetsRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let google_token = non_blank(payload.google_token)
        .ok_or_else(|| ApiError::validation("Google OAuth token is required"))?;
    let spreadsheet_id = non_blank(payload.spreadsheet_id)
        .ok_or_else(|| ApiError::validation("Spreadsheet ID is required"))?;

    info!(user_id = %user.id, %spreadsheet_id, "Fetching worksheets");

    match state
        .google
        .list_worksheets(&google_token, &spreadsheet_id)
        .await
    {
        Ok(sheets) => {
            info!(count = sheets.len(), "Found worksheets");
            Ok(HttpResponse::Ok().json(WorksheetsResponse {
                sheets,
                success: true,
            }))
        }
        Err(err) if err.is_forbidden() => {
            warn!(user_id = %user.id, %spreadsheet_id, "Access denied to spreadsheet");
            Ok(HttpResponse::Forbidden().json(ErrorEnvelope {
                error: "Access denied".to_string(),
                code: upstream_code(&err).to_string(),
                message: Some(
                    "Vérifiez que vous avez les droits d'accès nécessaires pour ce Google Sheets"
                        .to_string(),
                ),
                details: None,
            }))
        }
        Err(err) => {
            error!(user_id = %user.id, error = %err, "Sheets spreadsheets.get failed");
            Ok(HttpResponse::build(upstream_status(&err)).json(ErrorEnvelope {
                error: "Failed to fetch worksheets".to_string(),
                code: upstream_code(&err).to_string(),
                message: Some(err.message()),
                details: None,
            }))
        }
    }
}
