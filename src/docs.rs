use crate::api::attendance::CheckInReq;
use crate::api::staff::RegisterStaff;
use crate::model::attendance::{AttendanceLog, AttendanceType, CheckInStatus, CheckOutStatus};
use crate::model::department::Department;
use crate::model::settings::AdminSettings;
use crate::model::staff::Staff;
use crate::models::PasswordReqDto;
use crate::utils::report::{DailyAttendance, DailyStats, MonthlyReport, SortOrder};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Staff Attendance API",
        version = "1.0.0",
        description = r#"
## Staff Attendance Tracker

Staff register once and receive a QR code carrying their staff id. A kiosk
scans the code to record a **check-in** or **check-out**; the admin dashboard
reads the logs back.

### 🔹 Key Features
- **Registration**
  - Generated 8-character staff ids with SVG QR codes
- **Attendance**
  - One check-in and one check-out per staff member per day
  - Lateness fixed at check-in time against the configured threshold
- **Reporting**
  - Who is in now, who is absent, daily stats, per-staff monthly detail
  - CSV export
- **Settings**
  - Lateness and work-end thresholds

### 🔐 Security
`/auth/admin` and `/auth/scan` exchange a shared password for a short-lived
**JWT Bearer** token. Check-in accepts scan or admin tokens; every `/admin`
route requires an admin token.

### 🕘 Time
Calendar days and `HH:MM` thresholds use the organization's fixed UTC offset.
"#,
    ),
    paths(
        crate::auth::handlers::admin_login,
        crate::auth::handlers::scan_login,

        crate::api::staff::register,
        crate::api::staff::get_staff,
        crate::api::staff::list_departments,
        crate::api::staff::list_staff,

        crate::api::attendance::check_in,

        crate::api::admin::list_logs,
        crate::api::admin::grouped_logs,
        crate::api::admin::export_logs,
        crate::api::admin::current_staff,
        crate::api::admin::absent_staff_list,
        crate::api::admin::stats,

        crate::api::settings::get_settings,
        crate::api::settings::update_settings,

        crate::api::media::upload_photo
    ),
    components(
        schemas(
            PasswordReqDto,
            RegisterStaff,
            Staff,
            Department,
            CheckInReq,
            AttendanceType,
            AttendanceLog,
            CheckInStatus,
            CheckOutStatus,
            DailyAttendance,
            MonthlyReport,
            DailyStats,
            SortOrder,
            AdminSettings
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Admin and kiosk token issuance"),
        (name = "Staff", description = "Staff registration and lookup"),
        (name = "Attendance", description = "Check-in and check-out recording"),
        (name = "Admin", description = "Dashboard queries, reports and settings"),
        (name = "Media", description = "Check-in photo uploads"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
