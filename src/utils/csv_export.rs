use std::borrow::Cow;

use crate::model::attendance::{
    AttendanceLog, AttendanceType, CheckOutStatus, check_out_status,
};
use crate::model::settings::AdminSettings;
use crate::utils::clock::OrgClock;

const HEADER: &str = "Staff ID,Name,Department,Type,Date,Time,Status";

/// Human readable status used in exports: late check-ins, early check-outs,
/// everything else on time.
pub fn log_status(log: &AttendanceLog, settings: &AdminSettings, clock: &OrgClock) -> &'static str {
    match log.kind {
        AttendanceType::CheckIn if log.is_late => "Late",
        AttendanceType::CheckOut
            if check_out_status(log, settings, clock) == CheckOutStatus::Early =>
        {
            "Early"
        }
        _ => "On Time",
    }
}

fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

pub fn logs_to_csv(logs: &[AttendanceLog], settings: &AdminSettings, clock: &OrgClock) -> String {
    let mut out = String::with_capacity(64 * (logs.len() + 1));
    out.push_str(HEADER);

    for log in logs {
        let time = clock.hhmmss(log.timestamp);
        let fields = [
            log.staff_id.as_str(),
            log.staff_name.as_str(),
            log.department.as_str(),
            log.kind.as_ref(),
            log.date.as_str(),
            time.as_str(),
            log_status(log, settings, clock),
        ];

        out.push('\n');
        let row: Vec<Cow<'_, str>> = fields.iter().map(|f| escape(f)).collect();
        out.push_str(&row.join(","));
    }

    out
}
