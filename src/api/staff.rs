use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use std::str::FromStr;
use strum::IntoEnumIterator;
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

use crate::{
    db::is_duplicate_key,
    error::{AppError, AppResult},
    model::{department::Department, staff::Staff},
    utils::{qr, staff_id},
};

/// Attempts before registration gives up on finding a free staff id.
const MAX_ID_ATTEMPTS: usize = 32;

#[derive(Deserialize, ToSchema)]
pub struct RegisterStaff {
    #[serde(default)]
    #[schema(example = "Ada Obi")]
    pub name: String,
    #[serde(default)]
    #[schema(example = "Engineering")]
    pub department: String,
    #[serde(default)]
    #[schema(example = "Backend Engineer")]
    pub position: String,
}

/// Trimmed, validated registration input.
#[derive(Debug, PartialEq)]
pub struct NewStaff {
    pub name: String,
    pub department: Department,
    pub position: String,
}

impl RegisterStaff {
    pub fn validate(&self) -> AppResult<NewStaff> {
        let name = self.name.trim();
        let department = self.department.trim();
        let position = self.position.trim();

        if name.is_empty() || department.is_empty() || position.is_empty() {
            return Err(AppError::validation("All fields are required"));
        }

        let department = Department::from_str(department)
            .map_err(|_| AppError::validation(format!("Unknown department '{department}'")))?;

        Ok(NewStaff {
            name: name.to_string(),
            department,
            position: position.to_string(),
        })
    }
}

/// Allocates a unique id, renders its QR code and stores the record.
/// A duplicate-key error on insert means another registration took the
/// id first; a new one is drawn.
pub async fn register_staff(pool: &MySqlPool, new_staff: NewStaff) -> AppResult<Staff> {
    for attempt in 1..=MAX_ID_ATTEMPTS {
        let candidate = staff_id::generate();

        if !staff_id::is_available(pool, &candidate).await? {
            debug!(attempt, staff_id = %candidate, "Staff id taken, retrying");
            continue;
        }

        let qr_code = qr::render_svg(&candidate).map_err(|e| {
            error!(error = %e, staff_id = %candidate, "QR rendering failed");
            AppError::Internal("Failed to generate QR code".into())
        })?;

        let staff = Staff {
            staff_id: candidate,
            name: new_staff.name.clone(),
            department: new_staff.department.to_string(),
            position: new_staff.position.clone(),
            qr_code,
            created_at: Utc::now(),
        };

        match staff.insert(pool).await {
            Ok(()) => {
                staff_id::remember(&staff.staff_id).await;
                return Ok(staff);
            }
            Err(e) if is_duplicate_key(&e) => {
                warn!(attempt, staff_id = %staff.staff_id, "Staff id collided on insert, retrying");
                staff_id::remember(&staff.staff_id).await;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Internal("Could not allocate a unique staff id".into()))
}

/// Register staff
#[utoipa::path(
    post,
    path = "/staff",
    request_body = RegisterStaff,
    responses(
        (status = 200, description = "Staff registered", body = Object, example = json!({
            "success": true,
            "staff": {
                "staffId": "K7Q2M9XA",
                "name": "Ada Obi",
                "department": "Engineering",
                "position": "Backend Engineer",
                "qrCode": "<svg ...>",
                "createdAt": "2025-05-27T08:00:00Z"
            }
        })),
        (status = 400, description = "All fields are required", body = Object, example = json!({
            "error": "All fields are required"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Staff"
)]
#[instrument(name = "register_staff", skip_all)]
pub async fn register(
    pool: web::Data<MySqlPool>,
    payload: web::Json<RegisterStaff>,
) -> AppResult<HttpResponse> {
    let new_staff = payload.validate()?;
    let staff = register_staff(pool.get_ref(), new_staff).await?;

    info!(staff_id = %staff.staff_id, department = %staff.department, "Staff registered");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "staff": staff,
    })))
}

/// Get staff by id
#[utoipa::path(
    get,
    path = "/staff/{staff_id}",
    params(
        ("staff_id", Path, description = "Generated staff id")
    ),
    responses(
        (status = 200, description = "Staff found", body = Object, example = json!({
            "staff": {"staffId": "K7Q2M9XA", "name": "Ada Obi"}
        })),
        (status = 404, description = "Staff not found", body = Object, example = json!({
            "error": "Staff not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Staff"
)]
pub async fn get_staff(
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let staff_id = path.into_inner();

    let staff = Staff::find(pool.get_ref(), staff_id.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("Staff not found".into()))?;

    Ok(HttpResponse::Ok().json(json!({ "staff": staff })))
}

/// List all staff (admin)
#[utoipa::path(
    get,
    path = "/admin/staff",
    responses(
        (status = 200, description = "All registered staff", body = Object, example = json!({
            "staff": [{"staffId": "K7Q2M9XA", "name": "Ada Obi", "department": "Engineering"}]
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn list_staff(pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let staff = Staff::list(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "staff": staff })))
}

/// Departments staff can register under
#[utoipa::path(
    get,
    path = "/departments",
    responses(
        (status = 200, description = "Department names", body = Object, example = json!({
            "departments": ["Human Resources", "Engineering", "Marketing", "Sales", "Finance", "Operations", "Customer Support"]
        }))
    ),
    tag = "Staff"
)]
pub async fn list_departments() -> HttpResponse {
    let departments: Vec<String> = Department::iter().map(|d| d.to_string()).collect();
    HttpResponse::Ok().json(json!({ "departments": departments }))
}
