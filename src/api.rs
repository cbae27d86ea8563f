use crate::auth::JwtVerifier;
use crate::config::AppConfig;
use crate::error::{ApiError, ErrorEnvelope};
use crate::expenses::{
    self,
    models::{Category, ExpenseData, SubmitExpenseResponse},
};
use crate::google::{SpreadsheetInfo, WorksheetInfo};
use crate::settings::{
    self,
    models::{EnvVars, SaveSettings, SaveSettingsResponse, Settings, SuccessResponse, UserSettings},
};
use crate::sheets::{
    self,
    models::{
        ListSpreadsheetsRequest, ListWorksheetsRequest, SpreadsheetsResponse, WorksheetsResponse,
    },
};
use crate::state::AppState;
use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::http::header;
use actix_web::middleware::{NormalizePath, TrailingSlash};
use actix_web::{get, middleware::Logger, web, App, HttpResponse, HttpServer};
use serde_json::json;
use tracing::{info, warn};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        settings::get_settings,
        settings::save_settings,
        settings::update_env_vars,
        sheets::list_spreadsheets,
        sheets::list_worksheets,
        expenses::submit_expense,
        health,
    ),
    components(schemas(
        Settings,
        SaveSettings,
        SaveSettingsResponse,
        UserSettings,
        EnvVars,
        SuccessResponse,
        ListSpreadsheetsRequest,
        SpreadsheetsResponse,
        SpreadsheetInfo,
        ListWorksheetsRequest,
        WorksheetsResponse,
        WorksheetInfo,
        ExpenseData,
        Category,
        SubmitExpenseResponse,
        ErrorEnvelope,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Receipts", description = "Settings, Google Sheets discovery and expense submission")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Malformed bodies get the same envelope as any other validation failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, req| {
        warn!(path = req.path(), "Invalid request body: {}", err);
        ApiError::validation(format!("Invalid request body: {err}")).into()
    })
}

/// Registers every endpoint. Shared by the server and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(health)
        .service(settings::get_settings)
        .service(settings::save_settings)
        .service(settings::update_env_vars)
        .service(sheets::list_spreadsheets)
        .service(sheets::list_worksheets)
        .service(expenses::submit_expense);
}

pub fn cors(allowed_origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
        .allowed_header("x-client-info")
        .allowed_header("apikey")
        .max_age(3600);

    if allowed_origins.is_empty() {
        cors.allow_any_origin()
    } else {
        allowed_origins
            .iter()
            .fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

pub async fn run_api(
    config: &AppConfig,
    state: AppState,
    verifier: JwtVerifier,
) -> std::io::Result<()> {
    info!("Starting server on {}:{}...", config.host, config.port);

    let governor_conf = GovernorConfigBuilder::default()
        .period(config.rate_limit_period)
        .burst_size(config.rate_limit_burst)
        .finish()
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "rate limit period and burst size must be non-zero",
            )
        })?;

    let state = web::Data::new(state);
    let verifier = web::Data::new(verifier);
    let allowed_origins = config.allowed_origins.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::new(TrailingSlash::Trim))
            .wrap(
                actix_web::middleware::DefaultHeaders::new()
                    .add((
                        header::STRICT_TRANSPORT_SECURITY,
                        "max-age=63072000; includeSubDomains; preload",
                    ))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_XSS_PROTECTION, "1; mode=block")),
            )
            .wrap(Governor::new(&governor_conf))
            .wrap(cors(&allowed_origins))
            .app_data(state.clone())
            .app_data(verifier.clone())
            .configure(configure)
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
