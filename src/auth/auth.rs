use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};
use tracing::debug;

use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::AppError;
use crate::model::role::Role;

/// Verified token claims for the current request. Built from the bearer
/// header on every request; nothing is remembered between requests.
#[derive(Debug, Clone)]
pub struct Session {
    pub role: Role,
    pub token_id: String,
    pub expires_at: usize,
}

impl Session {
    pub fn require(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            debug!(role = %self.role, ?allowed, "Role not allowed for route");
            Err(AppError::unauthorized())
        }
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(AppError::unauthorized)
}

/// Any failure (missing header, bad signature, expiry, unset secret) is
/// reported as the same `Unauthorized`.
pub fn authenticate(headers: &HeaderMap, config: &Config) -> Result<Session, AppError> {
    let token = bearer_token(headers)?;
    let secret = config.jwt_secret.as_deref().ok_or_else(AppError::unauthorized)?;

    let claims = verify_token(token, secret).map_err(|e| {
        debug!(error = %e, "Token rejected");
        AppError::unauthorized()
    })?;

    Ok(Session {
        role: claims.role,
        token_id: claims.jti,
        expires_at: claims.exp,
    })
}

impl FromRequest for Session {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Already verified by a guard on this scope.
        if let Some(session) = req.extensions().get::<Session>() {
            return ready(Ok(session.clone()));
        }

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(
                    AppError::ServerMisconfigured("App config missing".into()).into()
                ));
            }
        };

        ready(authenticate(req.headers(), config).map_err(Into::into))
    }
}
