use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::{HttpResponse, web};
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    auth::jwt::generate_token,
    config::Config,
    error::{AppError, AppResult},
    model::role::Role,
    models::{Claims, PasswordReqDto},
};

/// Checks `password` against the role's shared password and signs a token.
pub fn issue_token(role: Role, password: &str, config: &Config) -> AppResult<(String, Claims)> {
    if password.is_empty() {
        return Err(AppError::validation("Password is required"));
    }

    let secret = config
        .jwt_secret
        .as_deref()
        .ok_or_else(|| AppError::ServerMisconfigured("JWT secret not set".into()))?;

    // An unset role password never matches.
    match role.password(config) {
        Some(expected) if expected == password => {}
        _ => return Err(AppError::InvalidCredentials),
    }

    generate_token(role, secret, config.token_ttl).map_err(|e| {
        error!(error = %e, "Failed to sign token");
        AppError::Internal("Failed to sign token".into())
    })
}

fn session_cookie(role: Role, token: &str, ttl: usize) -> Cookie<'static> {
    Cookie::build(role.cookie_name(), token.to_string())
        .path("/")
        .max_age(Duration::seconds(ttl as i64))
        .same_site(SameSite::Strict)
        .finish()
}

#[instrument(name = "auth_login", skip_all, fields(role = %role))]
async fn login(role: Role, body: &PasswordReqDto, config: &Config) -> AppResult<HttpResponse> {
    info!("Login request received");

    let (token, claims) = issue_token(role, &body.password, config).inspect_err(|e| {
        warn!(error = %e, "Login rejected");
    })?;

    debug!(jti = %claims.jti, exp = claims.exp, "Token issued");

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(role, &token, config.token_ttl))
        .json(json!({
            "success": true,
            "message": "Login successful",
            "token": token,
            "expiresIn": config.token_ttl,
        })))
}

/// Admin dashboard login
#[utoipa::path(
    post,
    path = "/auth/admin",
    request_body = PasswordReqDto,
    responses(
        (status = 200, description = "Admin token issued", body = Object, example = json!({
            "success": true,
            "message": "Login successful",
            "token": "eyJhbGciOiJIUzI1NiJ9...",
            "expiresIn": 7200
        })),
        (status = 400, description = "Password is required"),
        (status = 401, description = "Invalid password"),
        (status = 500, description = "JWT secret not set")
    ),
    tag = "Auth"
)]
pub async fn admin_login(
    body: web::Json<PasswordReqDto>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    login(Role::Admin, &body, &config).await
}

/// Check-in kiosk login
#[utoipa::path(
    post,
    path = "/auth/scan",
    request_body = PasswordReqDto,
    responses(
        (status = 200, description = "Scan token issued", body = Object, example = json!({
            "success": true,
            "message": "Login successful",
            "token": "eyJhbGciOiJIUzI1NiJ9...",
            "expiresIn": 7200
        })),
        (status = 400, description = "Password is required"),
        (status = 401, description = "Invalid password"),
        (status = 500, description = "JWT secret not set")
    ),
    tag = "Auth"
)]
pub async fn scan_login(
    body: web::Json<PasswordReqDto>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    login(Role::Scan, &body, &config).await
}
