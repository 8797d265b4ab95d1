use actix_web::{HttpResponse, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{info, instrument};

use crate::{error::AppResult, model::settings::AdminSettings};

/// Current lateness and work-end thresholds
#[utoipa::path(
    get,
    path = "/admin/settings",
    responses(
        (status = 200, description = "Settings, created with defaults on first read", body = Object, example = json!({
            "settings": {"latenessTime": "09:00", "workEndTime": "17:00"}
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn get_settings(pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let settings = AdminSettings::load_or_init(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "settings": settings })))
}

/// Replace the thresholds. Stored logs keep their recorded lateness.
#[utoipa::path(
    post,
    path = "/admin/settings",
    request_body = AdminSettings,
    responses(
        (status = 200, description = "Settings saved", body = Object, example = json!({
            "success": true,
            "settings": {"latenessTime": "08:30", "workEndTime": "17:00"}
        })),
        (status = 400, description = "Invalid HH:MM value", body = Object, example = json!({
            "error": "latenessTime must be HH:MM"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
#[instrument(name = "update_settings", skip_all)]
pub async fn update_settings(
    pool: web::Data<MySqlPool>,
    payload: web::Json<AdminSettings>,
) -> AppResult<HttpResponse> {
    let settings = payload.into_inner();
    settings.validate()?;
    settings.save(pool.get_ref()).await?;

    info!(
        lateness_time = %settings.lateness_time,
        work_end_time = %settings.work_end_time,
        "Settings updated"
    );

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "settings": settings,
    })))
}
