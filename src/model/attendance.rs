use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::db::is_duplicate_key;
use crate::error::{AppError, AppResult};
use crate::model::settings::AdminSettings;
use crate::model::staff::Staff;
use crate::utils::clock::{OrgClock, is_after, is_before, to_stored_precision};

const LOG_COLUMNS: &str =
    "id, staff_id, staff_name, department, event_type, timestamp, date, is_late, photo_url";

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AttendanceType {
    CheckIn,
    CheckOut,
}

impl TryFrom<String> for AttendanceType {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl AttendanceType {
    pub fn duplicate_message(self) -> &'static str {
        match self {
            AttendanceType::CheckIn => "Already checked in today",
            AttendanceType::CheckOut => "Already checked out today",
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            AttendanceType::CheckIn => "Checked in successfully",
            AttendanceType::CheckOut => "Checked out successfully",
        }
    }
}

/// One immutable attendance event. `staff_name` and `department` are the
/// staff member's values at the time of the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceLog {
    pub id: u64,
    pub staff_id: String,
    pub staff_name: String,
    pub department: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "event_type", try_from = "String")]
    pub kind: AttendanceType,
    #[schema(example = "2025-05-27T08:12:00Z", format = "date-time", value_type = String)]
    pub timestamp: DateTime<Utc>,
    /// Organization-local calendar day, `YYYY-MM-DD`.
    #[schema(example = "2025-05-27")]
    pub date: String,
    pub is_late: bool,
    pub photo_url: Option<String>,
}

/// A log about to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendance {
    pub staff_id: String,
    pub staff_name: String,
    pub department: String,
    pub kind: AttendanceType,
    pub timestamp: DateTime<Utc>,
    pub date: String,
    pub is_late: bool,
    pub photo_url: Option<String>,
}

/// Attendance state of one staff member for one calendar day.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DayState {
    NoRecord,
    CheckedIn,
    CheckedOut,
}

impl DayState {
    pub fn from_logs(day_logs: &[AttendanceLog]) -> Self {
        if day_logs.iter().any(|l| l.kind == AttendanceType::CheckOut) {
            DayState::CheckedOut
        } else if day_logs.iter().any(|l| l.kind == AttendanceType::CheckIn) {
            DayState::CheckedIn
        } else {
            DayState::NoRecord
        }
    }
}

/// Builds the log for `kind` at `now`, refusing a second event of the same
/// type on the same local day. A check-out does not require a prior
/// check-in.
pub fn plan_event(
    staff: &Staff,
    kind: AttendanceType,
    now: DateTime<Utc>,
    clock: &OrgClock,
    settings: &AdminSettings,
    day_logs: &[AttendanceLog],
    photo_url: Option<String>,
) -> AppResult<NewAttendance> {
    if day_logs.iter().any(|l| l.kind == kind) {
        return Err(AppError::DuplicateEvent(kind.duplicate_message().to_string()));
    }

    let now = to_stored_precision(now);
    let is_late =
        kind == AttendanceType::CheckIn && is_after(&clock.hhmm(now), &settings.lateness_time);

    Ok(NewAttendance {
        staff_id: staff.staff_id.clone(),
        staff_name: staff.name.clone(),
        department: staff.department.clone(),
        kind,
        timestamp: now,
        date: clock.day_of(now),
        is_late,
        photo_url,
    })
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CheckInStatus {
    Early,
    OnTime,
    Late,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CheckOutStatus {
    Early,
    OnTime,
    Late,
}

/// Uses the stored `is_late` flag, so later threshold changes never turn a
/// punctual check-in late.
pub fn check_in_status(log: &AttendanceLog, settings: &AdminSettings, clock: &OrgClock) -> CheckInStatus {
    if log.is_late {
        CheckInStatus::Late
    } else if is_before(&clock.hhmm(log.timestamp), &settings.lateness_time) {
        CheckInStatus::Early
    } else {
        CheckInStatus::OnTime
    }
}

/// Earliness is never stored; it is judged against the current work-end time.
pub fn check_out_status(log: &AttendanceLog, settings: &AdminSettings, clock: &OrgClock) -> CheckOutStatus {
    let hhmm = clock.hhmm(log.timestamp);
    if is_before(&hhmm, &settings.work_end_time) {
        CheckOutStatus::Early
    } else if is_after(&hhmm, &settings.work_end_time) {
        CheckOutStatus::Late
    } else {
        CheckOutStatus::OnTime
    }
}

enum Bind {
    Text(String),
    Instant(DateTime<Utc>),
}

/// Filters for log listings, all optional and AND-ed together.
#[derive(Debug, Default, Clone)]
pub struct LogQuery {
    /// Half-open absolute range, from a local calendar day.
    pub range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub department: Option<String>,
    pub late_only: bool,
    pub staff_id: Option<String>,
    /// `YYYY-MM`, matched as a prefix of `date`.
    pub month: Option<String>,
}

impl LogQuery {
    fn where_clause(&self) -> (String, Vec<Bind>) {
        let mut conditions = Vec::new();
        let mut binds = Vec::new();

        if let Some((start, end)) = self.range {
            conditions.push("timestamp >= ? AND timestamp < ?");
            binds.push(Bind::Instant(start));
            binds.push(Bind::Instant(end));
        }
        if let Some(department) = &self.department {
            conditions.push("department = ?");
            binds.push(Bind::Text(department.clone()));
        }
        if self.late_only {
            conditions.push("is_late = TRUE");
        }
        if let Some(staff_id) = &self.staff_id {
            conditions.push("staff_id = ?");
            binds.push(Bind::Text(staff_id.clone()));
        }
        if let Some(month) = &self.month {
            conditions.push("date LIKE ?");
            binds.push(Bind::Text(format!("{month}-%")));
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        (clause, binds)
    }
}

impl AttendanceLog {
    /// Newest first.
    pub async fn search(pool: &MySqlPool, query: &LogQuery) -> Result<Vec<AttendanceLog>, sqlx::Error> {
        let (where_clause, binds) = query.where_clause();
        let sql = format!("SELECT {LOG_COLUMNS} FROM attendance {where_clause} ORDER BY timestamp DESC, id DESC");
        tracing::debug!(sql = %sql, "Searching attendance logs");

        let mut q = sqlx::query_as::<_, AttendanceLog>(&sql);
        for bind in binds {
            q = match bind {
                Bind::Text(v) => q.bind(v),
                Bind::Instant(v) => q.bind(v),
            };
        }
        q.fetch_all(pool).await
    }

    /// All logs whose local `date` equals `day`, oldest first.
    pub async fn on_date(pool: &MySqlPool, day: &str) -> Result<Vec<AttendanceLog>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceLog>(&format!(
            "SELECT {LOG_COLUMNS} FROM attendance WHERE date = ? ORDER BY timestamp ASC, id ASC"
        ))
        .bind(day)
        .fetch_all(pool)
        .await
    }

    /// One staff member's logs for a local day, oldest first.
    pub async fn for_staff_on(
        pool: &MySqlPool,
        staff_id: &str,
        day: &str,
    ) -> Result<Vec<AttendanceLog>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceLog>(&format!(
            "SELECT {LOG_COLUMNS} FROM attendance WHERE staff_id = ? AND date = ? ORDER BY timestamp ASC, id ASC"
        ))
        .bind(staff_id)
        .bind(day)
        .fetch_all(pool)
        .await
    }
}

impl NewAttendance {
    /// The unique key on (staff_id, date, event_type) rejects a concurrent
    /// duplicate that slipped past the pre-check.
    pub async fn insert(&self, pool: &MySqlPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
                (staff_id, staff_name, department, event_type, timestamp, date, is_late, photo_url)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.staff_id)
        .bind(&self.staff_name)
        .bind(&self.department)
        .bind(self.kind.as_ref())
        .bind(self.timestamp)
        .bind(&self.date)
        .bind(self.is_late)
        .bind(&self.photo_url)
        .execute(pool)
        .await?;
        Ok(result.last_insert_id())
    }

    /// Inserts, reporting a lost race against an identical event as
    /// `DuplicateEvent`.
    pub async fn record(&self, pool: &MySqlPool) -> AppResult<u64> {
        match self.insert(pool).await {
            Ok(id) => Ok(id),
            Err(e) if is_duplicate_key(&e) => {
                tracing::warn!(staff_id = %self.staff_id, kind = %self.kind, "Concurrent duplicate attendance event");
                Err(AppError::DuplicateEvent(self.kind.duplicate_message().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::FixedOffset;

    pub fn clock() -> OrgClock {
        OrgClock::new(FixedOffset::east_opt(3600).unwrap())
    }

    /// Instant for a local (UTC+1) wall-clock time.
    pub fn at(day: &str, hhmm: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&format!("{day}T{hhmm}:00+01:00"))
            .unwrap()
            .with_timezone(&Utc)
    }

    pub fn staff(staff_id: &str, department: &str) -> Staff {
        Staff {
            staff_id: staff_id.into(),
            name: format!("Staff {staff_id}"),
            department: department.into(),
            position: "Analyst".into(),
            qr_code: "<svg/>".into(),
            created_at: at("2025-01-01", "08:00"),
        }
    }

    pub fn log(staff_id: &str, kind: AttendanceType, day: &str, hhmm: &str) -> AttendanceLog {
        let settings = AdminSettings::default();
        AttendanceLog {
            id: 0,
            staff_id: staff_id.into(),
            staff_name: format!("Staff {staff_id}"),
            department: "Engineering".into(),
            kind,
            timestamp: at(day, hhmm),
            date: day.into(),
            is_late: kind == AttendanceType::CheckIn && is_after(hhmm, &settings.lateness_time),
            photo_url: None,
        }
    }
}
