use actix_web::{HttpResponse, http::header, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, info, instrument};
use utoipa::IntoParams;

use crate::{
    config::Config,
    error::AppResult,
    model::{
        attendance::{AttendanceLog, LogQuery},
        settings::AdminSettings,
        staff::Staff,
    },
    utils::{
        clock::{OrgClock, parse_day, parse_month},
        csv_export::logs_to_csv,
        report::{
            DailyAttendance, MonthSpan, SortOrder, absent_staff, currently_in, daily_stats,
            group_by_staff_and_day, monthly_report,
        },
    },
};

/// Filters shared by the log listing, grouped and export endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct LogFilter {
    /// Local calendar day, `YYYY-MM-DD`.
    pub date: Option<String>,
    /// Department name; `all` or empty means every department.
    pub department: Option<String>,
    pub late_only: Option<bool>,
    /// With `month`, switches to the per-staff monthly detail.
    pub staff_id: Option<String>,
    /// `YYYY-MM`
    pub month: Option<String>,
    #[param(inline)]
    pub order: Option<SortOrder>,
}

fn non_blank(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl LogFilter {
    pub fn to_query(&self, clock: &OrgClock) -> AppResult<LogQuery> {
        let range = non_blank(&self.date)
            .map(parse_day)
            .transpose()?
            .map(|day| clock.day_range(day));

        let department = non_blank(&self.department)
            .filter(|d| !d.eq_ignore_ascii_case("all"))
            .map(str::to_string);

        let month = match non_blank(&self.month) {
            Some(m) => {
                parse_month(m)?;
                Some(m.to_string())
            }
            None => None,
        };

        Ok(LogQuery {
            range,
            department,
            late_only: self.late_only.unwrap_or(false),
            staff_id: non_blank(&self.staff_id).map(str::to_string),
            month,
        })
    }

    /// `staffId` and `month` both present.
    fn monthly_target(&self) -> Option<(&str, &str)> {
        Some((non_blank(&self.staff_id)?, non_blank(&self.month)?))
    }

    fn export_file_name(&self) -> String {
        let suffix = non_blank(&self.date).unwrap_or("all");
        format!("attendance-logs-{suffix}.csv")
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DayQuery {
    /// Local calendar day, `YYYY-MM-DD`; defaults to today.
    pub date: Option<String>,
}

/// List attendance logs
#[utoipa::path(
    get,
    path = "/admin/logs",
    params(LogFilter),
    responses(
        (status = 200, description = "Logs newest first; with staffId and month also a monthly report", body = Object, example = json!({
            "logs": [{
                "id": 1,
                "staffId": "K7Q2M9XA",
                "staffName": "Ada Obi",
                "department": "Engineering",
                "type": "check-in",
                "timestamp": "2025-05-27T07:55:00Z",
                "date": "2025-05-27",
                "isLate": false,
                "photoUrl": null
            }]
        })),
        (status = 400, description = "Invalid filter"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
#[instrument(name = "list_logs", skip_all)]
pub async fn list_logs(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    filter: web::Query<LogFilter>,
) -> AppResult<HttpResponse> {
    let pool = pool.get_ref();
    let clock = &config.clock;
    let query = filter.to_query(clock)?;

    let logs = AttendanceLog::search(pool, &query).await?;
    debug!(count = logs.len(), "Logs fetched");

    let Some((staff_id, month)) = filter.monthly_target() else {
        return Ok(HttpResponse::Ok().json(json!({ "logs": logs })));
    };

    let (first, last) = parse_month(month)?;
    let settings = AdminSettings::load_or_init(pool).await?;
    let span = MonthSpan { month, first, last };
    let report = monthly_report(
        staff_id,
        &span,
        &logs,
        &settings,
        clock,
        clock.today(),
        filter.order.unwrap_or_default(),
    );

    Ok(HttpResponse::Ok().json(json!({
        "logs": logs,
        "report": report,
    })))
}

/// Logs paired into one row per staff member and day
#[utoipa::path(
    get,
    path = "/admin/logs/grouped",
    params(LogFilter),
    responses(
        (status = 200, description = "Grouped rows with derived statuses", body = Object, example = json!({
            "rows": [{
                "staffId": "K7Q2M9XA",
                "staffName": "Ada Obi",
                "department": "Engineering",
                "date": "2025-05-27",
                "checkInStatus": "on-time",
                "checkOutStatus": "early"
            }]
        })),
        (status = 400, description = "Invalid filter"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn grouped_logs(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    filter: web::Query<LogFilter>,
) -> AppResult<HttpResponse> {
    let pool = pool.get_ref();
    let query = filter.to_query(&config.clock)?;

    let logs = AttendanceLog::search(pool, &query).await?;
    let settings = AdminSettings::load_or_init(pool).await?;

    let rows: Vec<DailyAttendance> = group_by_staff_and_day(&logs)
        .into_iter()
        .map(|row| row.with_statuses(&settings, &config.clock))
        .collect();

    Ok(HttpResponse::Ok().json(json!({ "rows": rows })))
}

/// Export logs as CSV
#[utoipa::path(
    get,
    path = "/admin/logs/export",
    params(LogFilter),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String),
        (status = 400, description = "Invalid filter"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
#[instrument(name = "export_logs", skip_all)]
pub async fn export_logs(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    filter: web::Query<LogFilter>,
) -> AppResult<HttpResponse> {
    let pool = pool.get_ref();
    let query = filter.to_query(&config.clock)?;

    let logs = AttendanceLog::search(pool, &query).await?;
    let settings = AdminSettings::load_or_init(pool).await?;
    let csv = logs_to_csv(&logs, &settings, &config.clock);

    info!(rows = logs.len(), "Logs exported");

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filter.export_file_name()),
        ))
        .body(csv))
}

/// Staff checked in and not yet checked out
#[utoipa::path(
    get,
    path = "/admin/current-staff",
    params(DayQuery),
    responses(
        (status = 200, description = "Open check-ins for the day", body = Object, example = json!({
            "currentStaff": [{"staffId": "K7Q2M9XA", "type": "check-in", "date": "2025-05-27"}]
        })),
        (status = 400, description = "Invalid date"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn current_staff(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<DayQuery>,
) -> AppResult<HttpResponse> {
    let day = config.clock.day_or_today(query.date.as_deref())?;
    let day_logs = AttendanceLog::on_date(pool.get_ref(), &day.to_string()).await?;

    Ok(HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"))
        .insert_header((header::PRAGMA, "no-cache"))
        .insert_header((header::EXPIRES, "0"))
        .json(json!({ "currentStaff": currently_in(&day_logs) })))
}

/// Registered staff with no check-in for the day
#[utoipa::path(
    get,
    path = "/admin/absent-staff",
    params(DayQuery),
    responses(
        (status = 200, description = "Absent staff", body = Object, example = json!({
            "absentStaff": [{"staffId": "K7Q2M9XA", "name": "Ada Obi", "department": "Engineering"}]
        })),
        (status = 400, description = "Invalid date"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn absent_staff_list(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<DayQuery>,
) -> AppResult<HttpResponse> {
    let pool = pool.get_ref();
    let day = config.clock.day_or_today(query.date.as_deref())?;

    let staff = Staff::list(pool).await?;
    let day_logs = AttendanceLog::on_date(pool, &day.to_string()).await?;

    Ok(HttpResponse::Ok().json(json!({ "absentStaff": absent_staff(&staff, &day_logs) })))
}

/// Dashboard counters for a day
#[utoipa::path(
    get,
    path = "/admin/stats",
    params(DayQuery),
    responses(
        (status = 200, description = "Daily stats", body = crate::utils::report::DailyStats),
        (status = 400, description = "Invalid date"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn stats(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<DayQuery>,
) -> AppResult<HttpResponse> {
    let pool = pool.get_ref();
    let day = config.clock.day_or_today(query.date.as_deref())?.to_string();

    let staff = Staff::list(pool).await?;
    let day_logs = AttendanceLog::on_date(pool, &day).await?;
    let settings = AdminSettings::load_or_init(pool).await?;

    Ok(HttpResponse::Ok().json(daily_stats(&day, &staff, &day_logs, &settings, &config.clock)))
}
