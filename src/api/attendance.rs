use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::{
    auth::auth::Session,
    config::Config,
    error::{AppError, AppResult},
    model::{
        attendance::{AttendanceLog, AttendanceType, DayState, plan_event},
        role::Role,
        settings::AdminSettings,
        staff::Staff,
    },
    utils::clock::to_stored_precision,
};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckInReq {
    #[serde(default)]
    #[schema(example = "K7Q2M9XA")]
    pub staff_id: String,
    #[serde(rename = "type")]
    #[schema(example = "check-in", value_type = Option<String>)]
    pub kind: Option<String>,
    /// URL returned by `/media/upload`, if the kiosk took a photo.
    pub photo_url: Option<String>,
}

impl CheckInReq {
    fn validate(&self) -> AppResult<(String, AttendanceType)> {
        let staff_id = self.staff_id.trim();
        let kind = self.kind.as_deref().map(str::trim).unwrap_or_default();

        if staff_id.is_empty() || kind.is_empty() {
            return Err(AppError::validation("Staff ID and type are required"));
        }

        let kind = kind
            .parse::<AttendanceType>()
            .map_err(|_| AppError::validation("type must be check-in or check-out"))?;

        Ok((staff_id.to_string(), kind))
    }
}

/// Record a check-in or check-out
#[utoipa::path(
    post,
    path = "/attendance/checkin",
    request_body = CheckInReq,
    responses(
        (status = 200, description = "Event recorded", body = Object, example = json!({
            "success": true,
            "message": "Checked in successfully",
            "isLate": false,
            "staff": "Ada Obi",
            "attendanceLogs": []
        })),
        (status = 400, description = "Validation error or already recorded today", body = Object, example = json!({
            "error": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Staff not found", body = Object, example = json!({
            "error": "Staff not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
#[instrument(name = "record_attendance", skip_all, fields(staff_id = %payload.staff_id.trim()))]
pub async fn check_in(
    session: Session,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CheckInReq>,
) -> AppResult<HttpResponse> {
    session.require(&[Role::Scan, Role::Admin])?;

    let (staff_id, kind) = payload.validate()?;
    let pool = pool.get_ref();
    let clock = &config.clock;

    let staff = Staff::find(pool, &staff_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Staff not found".into()))?;

    let settings = AdminSettings::load_or_init(pool).await?;

    let now = to_stored_precision(Utc::now());
    let today = clock.day_of(now);
    let day_logs = AttendanceLog::for_staff_on(pool, &staff_id, &today).await?;
    debug!(state = ?DayState::from_logs(&day_logs), date = %today, "Day state before event");

    let photo_url = payload
        .photo_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string);

    let planned = plan_event(&staff, kind, now, clock, &settings, &day_logs, photo_url)
        .inspect_err(|e| warn!(error = %e, kind = %kind, "Attendance event refused"))?;

    planned.record(pool).await?;

    info!(kind = %kind, is_late = planned.is_late, date = %today, "Attendance recorded");

    let attendance_logs = AttendanceLog::for_staff_on(pool, &staff_id, &today).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": kind.success_message(),
        "isLate": planned.is_late,
        "staff": staff.name,
        "attendanceLogs": attendance_logs,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::jwt::generate_token, db::lazy_pool, error::json_error_handler};
    use actix_web::{App, http::StatusCode, test as actix_test};

    fn req(staff_id: &str, kind: Option<&str>) -> CheckInReq {
        CheckInReq {
            staff_id: staff_id.into(),
            kind: kind.map(str::to_string),
            photo_url: None,
        }
    }

    #[test]
    fn validates_staff_id_and_type() {
        assert_eq!(
            req(" K7Q2M9XA ", Some("check-out")).validate().unwrap(),
            ("K7Q2M9XA".to_string(), AttendanceType::CheckOut)
        );
        assert!(matches!(req("", Some("check-in")).validate(), Err(AppError::Validation(_))));
        assert!(matches!(req("K7Q2M9XA", None).validate(), Err(AppError::Validation(_))));
        assert!(matches!(
            req("K7Q2M9XA", Some("absent")).validate(),
            Err(AppError::Validation(_))
        ));
    }

    async fn call(auth: Option<String>, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(Config::for_tests()))
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                .route("/attendance/checkin", web::post().to(check_in)),
        )
        .await;

        let mut request = actix_test::TestRequest::post().uri("/attendance/checkin").set_json(body);
        if let Some(token) = auth {
            request = request.insert_header(("Authorization", format!("Bearer {token}")));
        }
        let resp = actix_test::call_service(&app, request.to_request()).await;
        let status = resp.status();
        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        (status, body)
    }

    #[actix_web::test]
    async fn requires_a_token() {
        let (status, body) = call(None, json!({"staffId": "K7Q2M9XA", "type": "check-in"})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[actix_web::test]
    async fn scan_and_admin_tokens_reach_validation() {
        for role in [Role::Scan, Role::Admin] {
            let token = generate_token(role, "test-secret", 60).unwrap().0;
            let (status, body) = call(Some(token), json!({"staffId": "", "type": "check-in"})).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "Staff ID and type are required");
        }
    }

    #[actix_web::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let token = generate_token(Role::Scan, "someone-else", 60).unwrap().0;
        let (status, _) = call(Some(token), json!({"staffId": "K7Q2M9XA", "type": "check-in"})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
