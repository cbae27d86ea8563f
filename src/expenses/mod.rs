pub mod models;

use actix_web::{post, web, HttpResponse};
use tracing::{error, info, warn};

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ErrorEnvelope};
use crate::settings::models::SheetTarget;
use crate::sheets::non_blank;
use crate::state::AppState;
use models::{ExpenseData, SubmitExpenseResponse};

/// Stored settings win; the environment fallback only applies when they are incomplete.
async fn resolve_target(
    state: &AppState,
    user: &AuthenticatedUser,
) -> Result<Option<SheetTarget>, ApiError> {
    let stored = state
        .settings
        .get(user.id)
        .await?
        .and_then(|row| row.settings.0.target());

    if stored.is_some() {
        return Ok(stored);
    }

    let fallback = &state.fallback;
    let sheet_name = fallback.sheet_name.trim();
    Ok(fallback
        .spreadsheet_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty() && !sheet_name.is_empty())
        .map(|id| SheetTarget {
            spreadsheet_id: id.to_string(),
            sheet_name: sheet_name.to_string(),
        }))
}

#[utoipa::path(
    post,
    path = "/submit-expense",
    request_body = ExpenseData,
    responses(
        (status = 200, description = "Row appended to the configured sheet", body = SubmitExpenseResponse),
        (status = 400, description = "Missing fields, missing provider token or no spreadsheet configured", body = ErrorEnvelope),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorEnvelope)
    ),
    security(("bearer" = []))
)]
#[post("/submit-expense")]
pub async fn submit_expense(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    payload: web::Json<ExpenseData>,
) -> Result<HttpResponse, ApiError> {
    let expense = payload.into_inner();

    let invalid = expense.invalid_fields();
    if !invalid.is_empty() {
        warn!(user_id = %user.id, fields = ?invalid, "Rejected expense");
        return Err(ApiError::validation(format!(
            "Missing required fields: {}",
            invalid.join(", ")
        )));
    }

    let target = resolve_target(&state, &user).await?.ok_or_else(|| {
        warn!(user_id = %user.id, "Expense submitted without a configured spreadsheet");
        ApiError::configuration("Google Spreadsheet ID is not configured")
    })?;

    let google_token =
        non_blank(expense.google_token.clone()).ok_or(ApiError::MissingProviderToken)?;

    let range = target.range();
    info!(
        user_id = %user.id,
        spreadsheet_id = %target.spreadsheet_id,
        %range,
        "Appending expense row"
    );

    let details = state
        .google
        .append_row(&google_token, &target.spreadsheet_id, &range, &expense.to_row())
        .await
        .map_err(|err| {
            error!(user_id = %user.id, error = %err, "Sheets values.append failed");
            ApiError::Upstream(err)
        })?;

    Ok(HttpResponse::Ok().json(SubmitExpenseResponse {
        success: true,
        message: "Expense successfully added to Google Sheets".to_string(),
        details,
    }))
}
