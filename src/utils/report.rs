//! Read-side derivations over the append-only attendance log.
//!
//! Nothing here is stored: occupancy, absences, grouped rows and monthly
//! summaries are recomputed from the logs on every request.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;

use crate::model::attendance::{
    AttendanceLog, AttendanceType, CheckInStatus, CheckOutStatus, check_in_status, check_out_status,
};
use crate::model::settings::AdminSettings;
use crate::model::staff::Staff;
use crate::utils::clock::{DAY_FORMAT, OrgClock};

/// Check-in logs of staff who have not checked out on the same day.
pub fn currently_in(logs: &[AttendanceLog]) -> Vec<AttendanceLog> {
    let checked_out: HashSet<(&str, &str)> = logs
        .iter()
        .filter(|l| l.kind == AttendanceType::CheckOut)
        .map(|l| (l.staff_id.as_str(), l.date.as_str()))
        .collect();

    logs.iter()
        .filter(|l| l.kind == AttendanceType::CheckIn)
        .filter(|l| !checked_out.contains(&(l.staff_id.as_str(), l.date.as_str())))
        .cloned()
        .collect()
}

/// Registered staff without a check-in among `day_logs`.
pub fn absent_staff(staff: &[Staff], day_logs: &[AttendanceLog]) -> Vec<Staff> {
    let checked_in: HashSet<&str> = day_logs
        .iter()
        .filter(|l| l.kind == AttendanceType::CheckIn)
        .map(|l| l.staff_id.as_str())
        .collect();

    staff
        .iter()
        .filter(|s| !checked_in.contains(s.staff_id.as_str()))
        .cloned()
        .collect()
}

/// One table row: a staff member's check-in and check-out for one day.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyAttendance {
    pub staff_id: String,
    pub staff_name: String,
    pub department: String,
    pub date: String,
    pub check_in: Option<AttendanceLog>,
    pub check_out: Option<AttendanceLog>,
    pub check_in_status: Option<CheckInStatus>,
    pub check_out_status: Option<CheckOutStatus>,
}

impl DailyAttendance {
    pub fn with_statuses(mut self, settings: &AdminSettings, clock: &OrgClock) -> Self {
        self.check_in_status = self.check_in.as_ref().map(|l| check_in_status(l, settings, clock));
        self.check_out_status = self.check_out.as_ref().map(|l| check_out_status(l, settings, clock));
        self
    }
}

/// Collapses logs into one row per (staff, day), in first-seen order.
/// Name and department come from the first log seen for the pair.
pub fn group_by_staff_and_day(logs: &[AttendanceLog]) -> Vec<DailyAttendance> {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut rows: Vec<DailyAttendance> = Vec::new();

    for log in logs {
        let key = (log.staff_id.as_str(), log.date.as_str());
        let slot = *index.entry(key).or_insert_with(|| {
            rows.push(DailyAttendance {
                staff_id: log.staff_id.clone(),
                staff_name: log.staff_name.clone(),
                department: log.department.clone(),
                date: log.date.clone(),
                check_in: None,
                check_out: None,
                check_in_status: None,
                check_out_status: None,
            });
            rows.len() - 1
        });

        let row = &mut rows[slot];
        match log.kind {
            AttendanceType::CheckIn => row.check_in = Some(log.clone()),
            AttendanceType::CheckOut => row.check_out = Some(log.clone()),
        }
    }

    rows
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub staff_id: String,
    #[schema(example = "2025-05")]
    pub month: String,
    /// Days with a check-in.
    pub present_days: usize,
    pub late_check_ins: usize,
    pub early_check_ins: usize,
    pub early_check_outs: usize,
    /// Days of the month, up to today, with no log at all.
    pub absent_days: usize,
    pub days: Vec<DailyAttendance>,
}

pub struct MonthSpan<'a> {
    pub month: &'a str,
    pub first: NaiveDate,
    pub last: NaiveDate,
}

pub fn monthly_report(
    staff_id: &str,
    span: &MonthSpan<'_>,
    logs: &[AttendanceLog],
    settings: &AdminSettings,
    clock: &OrgClock,
    today: NaiveDate,
    order: SortOrder,
) -> MonthlyReport {
    let mut days: Vec<DailyAttendance> = group_by_staff_and_day(logs)
        .into_iter()
        .map(|row| row.with_statuses(settings, clock))
        .collect();

    days.sort_by(|a, b| match order {
        SortOrder::Asc => a.date.cmp(&b.date),
        SortOrder::Desc => b.date.cmp(&a.date),
    });

    let present_days = days.iter().filter(|d| d.check_in.is_some()).count();
    let late_check_ins = days
        .iter()
        .filter(|d| d.check_in_status == Some(CheckInStatus::Late))
        .count();
    let early_check_ins = days
        .iter()
        .filter(|d| d.check_in_status == Some(CheckInStatus::Early))
        .count();
    let early_check_outs = days
        .iter()
        .filter(|d| d.check_out_status == Some(CheckOutStatus::Early))
        .count();

    let logged: HashSet<&str> = logs.iter().map(|l| l.date.as_str()).collect();
    let absent_days = span
        .first
        .iter_days()
        .take_while(|d| *d <= span.last && *d <= today)
        .filter(|d| !logged.contains(d.format(DAY_FORMAT).to_string().as_str()))
        .count();

    MonthlyReport {
        staff_id: staff_id.to_string(),
        month: span.month.to_string(),
        present_days,
        late_check_ins,
        early_check_ins,
        early_check_outs,
        absent_days,
        days,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: String,
    pub total_staff: usize,
    pub late_count: usize,
    pub early_checkout_count: usize,
    pub absent_count: usize,
    pub currently_in_count: usize,
}

/// Dashboard counters for one day. `day_logs` must all share `date`.
pub fn daily_stats(
    date: &str,
    staff: &[Staff],
    day_logs: &[AttendanceLog],
    settings: &AdminSettings,
    clock: &OrgClock,
) -> DailyStats {
    DailyStats {
        date: date.to_string(),
        total_staff: staff.len(),
        late_count: day_logs
            .iter()
            .filter(|l| l.kind == AttendanceType::CheckIn && l.is_late)
            .count(),
        early_checkout_count: day_logs
            .iter()
            .filter(|l| l.kind == AttendanceType::CheckOut)
            .filter(|l| check_out_status(l, settings, clock) == CheckOutStatus::Early)
            .count(),
        absent_count: absent_staff(staff, day_logs).len(),
        currently_in_count: currently_in(day_logs).len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::fixtures::{clock, log, staff};
    use crate::model::attendance::AttendanceType::{CheckIn, CheckOut};

    const DAY: &str = "2025-05-27";

    fn ids<T>(items: &[T], id: impl Fn(&T) -> &str) -> Vec<String> {
        items.iter().map(|i| id(i).to_string()).collect()
    }

    #[test]
    fn open_check_in_is_currently_in_until_check_out() {
        let mut logs = vec![
            log("A1", CheckIn, DAY, "08:30"),
            log("B2", CheckIn, DAY, "08:45"),
        ];
        assert_eq!(ids(&currently_in(&logs), |l| l.staff_id.as_str()), ["A1", "B2"]);

        logs.push(log("A1", CheckOut, DAY, "17:10"));
        assert_eq!(ids(&currently_in(&logs), |l| l.staff_id.as_str()), ["B2"]);
    }

    #[test]
    fn check_out_on_another_day_does_not_close_today() {
        let logs = vec![
            log("A1", CheckOut, "2025-05-26", "17:00"),
            log("A1", CheckIn, DAY, "08:30"),
        ];
        assert_eq!(currently_in(&logs).len(), 1);
    }

    #[test]
    fn staff_without_logs_are_absent_until_they_check_in() {
        let roster = vec![staff("A1", "Engineering"), staff("B2", "Sales")];

        let absent = absent_staff(&roster, &[]);
        assert_eq!(ids(&absent, |s| s.staff_id.as_str()), ["A1", "B2"]);

        let logs = vec![log("B2", CheckIn, DAY, "09:10")];
        let absent = absent_staff(&roster, &logs);
        assert_eq!(ids(&absent, |s| s.staff_id.as_str()), ["A1"]);
    }

    #[test]
    fn check_out_alone_does_not_count_as_present() {
        let roster = vec![staff("A1", "Engineering")];
        let logs = vec![log("A1", CheckOut, DAY, "17:00")];
        assert_eq!(absent_staff(&roster, &logs).len(), 1);
    }

    #[test]
    fn grouping_pairs_check_in_and_check_out() {
        let logs = vec![
            log("A1", CheckOut, DAY, "17:05"),
            log("B2", CheckIn, DAY, "09:20"),
            log("A1", CheckIn, DAY, "08:50"),
        ];
        let rows = group_by_staff_and_day(&logs);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].staff_id, "A1");
        assert!(rows[0].check_in.is_some());
        assert!(rows[0].check_out.is_some());
        assert_eq!(rows[1].staff_id, "B2");
        assert!(rows[1].check_out.is_none());
    }

    #[test]
    fn check_out_only_still_produces_a_row() {
        let rows = group_by_staff_and_day(&[log("A1", CheckOut, DAY, "16:00")]);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].check_in.is_none());

        let row = rows[0].clone().with_statuses(&AdminSettings::default(), &clock());
        assert_eq!(row.check_in_status, None);
        assert_eq!(row.check_out_status, Some(CheckOutStatus::Early));
    }

    #[test]
    fn same_staff_on_two_days_yields_two_rows() {
        let logs = vec![
            log("A1", CheckIn, "2025-05-26", "08:00"),
            log("A1", CheckIn, DAY, "08:00"),
        ];
        assert_eq!(group_by_staff_and_day(&logs).len(), 2);
    }

    fn may() -> MonthSpan<'static> {
        MonthSpan {
            month: "2025-05",
            first: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            last: NaiveDate::from_ymd_opt(2025, 5, 31).unwrap(),
        }
    }

    #[test]
    fn monthly_report_counts_and_sorts() {
        let logs = vec![
            log("A1", CheckIn, "2025-05-02", "09:30"),
            log("A1", CheckOut, "2025-05-02", "16:00"),
            log("A1", CheckIn, "2025-05-03", "08:30"),
            log("A1", CheckOut, "2025-05-03", "17:30"),
            log("A1", CheckIn, "2025-05-05", "09:00"),
        ];
        let today = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();

        let report = monthly_report(
            "A1",
            &may(),
            &logs,
            &AdminSettings::default(),
            &clock(),
            today,
            SortOrder::Desc,
        );

        assert_eq!(report.present_days, 3);
        assert_eq!(report.late_check_ins, 1);
        assert_eq!(report.early_check_ins, 1);
        assert_eq!(report.early_check_outs, 1);
        // May 1 and May 4 have no logs; days after today are not counted.
        assert_eq!(report.absent_days, 2);
        assert_eq!(ids(&report.days, |d| d.date.as_str()), ["2025-05-05", "2025-05-03", "2025-05-02"]);

        let ascending = monthly_report(
            "A1",
            &may(),
            &logs,
            &AdminSettings::default(),
            &clock(),
            today,
            SortOrder::Asc,
        );
        assert_eq!(ascending.days[0].date, "2025-05-02");
    }

    #[test]
    fn past_month_counts_every_unlogged_day() {
        let logs = vec![log("A1", CheckIn, "2025-05-10", "08:00")];
        let today = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let report = monthly_report(
            "A1",
            &may(),
            &logs,
            &AdminSettings::default(),
            &clock(),
            today,
            SortOrder::Desc,
        );
        assert_eq!(report.absent_days, 30);
    }

    #[test]
    fn future_month_has_no_absences() {
        let today = NaiveDate::from_ymd_opt(2025, 4, 15).unwrap();
        let report = monthly_report(
            "A1",
            &may(),
            &[],
            &AdminSettings::default(),
            &clock(),
            today,
            SortOrder::Desc,
        );
        assert_eq!(report.absent_days, 0);
        assert!(report.days.is_empty());
    }

    #[test]
    fn daily_stats_summarize_the_day() {
        let roster = vec![
            staff("A1", "Engineering"),
            staff("B2", "Sales"),
            staff("C3", "Finance"),
        ];
        let logs = vec![
            log("A1", CheckIn, DAY, "09:15"),
            log("B2", CheckIn, DAY, "08:40"),
            log("B2", CheckOut, DAY, "15:00"),
        ];

        let stats = daily_stats(DAY, &roster, &logs, &AdminSettings::default(), &clock());
        assert_eq!(
            stats,
            DailyStats {
                date: DAY.into(),
                total_staff: 3,
                late_count: 1,
                early_checkout_count: 1,
                absent_count: 1,
                currently_in_count: 1,
            }
        );
    }
}
