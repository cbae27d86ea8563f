pub mod models;

use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tracing::{error, warn};

use crate::config::AuthConfig;
use crate::error::ApiError;
pub use models::{AuthenticatedUser, Claims};

/// Verifies the app's bearer tokens (HS256, signed by the identity provider).
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[config.audience.as_str()]);

        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, ApiError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            warn!("Rejected bearer token: {}", e);
            ApiError::unauthorized(format!("Authentication error: {e}"))
        })?;

        Ok(AuthenticatedUser {
            id: data.claims.sub,
            email: data.claims.email,
        })
    }
}

/// Extracts the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let Some(verifier) = req.app_data::<web::Data<JwtVerifier>>() else {
            error!("JwtVerifier missing from app data");
            return ready(Err(ApiError::Internal(
                "authentication is not configured".to_string(),
            )));
        };

        let result = match bearer_token(req.headers()) {
            Some(token) => verifier.verify(token),
            None => {
                warn!(path = req.path(), "Missing Authorization header");
                Err(ApiError::unauthorized("Missing Authorization header"))
            }
        };

        ready(result)
    }
}
