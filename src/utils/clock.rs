//! Organization-local calendar arithmetic.
//!
//! The organization runs on a single fixed UTC offset. Calendar days and
//! time-of-day strings are always derived through [`OrgClock`], never from
//! the server's local zone.

use chrono::{DateTime, Duration, FixedOffset, Months, NaiveDate, NaiveTime, SubsecRound, TimeZone, Utc};

use crate::error::{AppError, AppResult};

pub const DAY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy)]
pub struct OrgClock {
    offset: FixedOffset,
}

impl OrgClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn local(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset)
    }

    /// `YYYY-MM-DD` of the instant in local time.
    pub fn day_of(&self, instant: DateTime<Utc>) -> String {
        self.local(instant).format(DAY_FORMAT).to_string()
    }

    /// `HH:MM` of the instant in local time.
    pub fn hhmm(&self, instant: DateTime<Utc>) -> String {
        self.local(instant).format("%H:%M").to_string()
    }

    pub fn hhmmss(&self, instant: DateTime<Utc>) -> String {
        self.local(instant).format("%H:%M:%S").to_string()
    }

    pub fn today(&self) -> NaiveDate {
        self.local(Utc::now()).date_naive()
    }

    /// Half-open `[start, end)` instants covering the local calendar day.
    pub fn day_range(&self, day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let local_midnight = day.and_time(NaiveTime::MIN);
        let utc_midnight =
            local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        let start = Utc.from_utc_datetime(&utc_midnight);
        (start, start + Duration::days(1))
    }

    /// Resolves an optional `date` query parameter, defaulting to today.
    pub fn day_or_today(&self, raw: Option<&str>) -> AppResult<NaiveDate> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => parse_day(s),
            None => Ok(self.today()),
        }
    }
}

/// Instants are stored as `DATETIME(3)`. Truncating first keeps the stored
/// timestamp on the same local day that `date` and lateness were derived from.
pub fn to_stored_precision(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.trunc_subsecs(3)
}

pub fn parse_day(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DAY_FORMAT)
        .map_err(|_| AppError::validation(format!("Invalid date '{raw}', expected YYYY-MM-DD")))
}

/// Parses `YYYY-MM` into the first and last day of that month.
pub fn parse_month(raw: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    let raw = raw.trim();
    let invalid = || AppError::validation(format!("Invalid month '{raw}', expected YYYY-MM"));

    if raw.len() != 7 {
        return Err(invalid());
    }
    let first = NaiveDate::parse_from_str(&format!("{raw}-01"), DAY_FORMAT).map_err(|_| invalid())?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(invalid)?;

    Ok((first, last))
}

/// True for a 24h `HH:MM` string.
pub fn is_valid_hhmm(raw: &str) -> bool {
    raw.len() == 5 && NaiveTime::parse_from_str(raw, "%H:%M").is_ok()
}

/// Lateness compares zero-padded `HH:MM` strings, so `09:00` is on time
/// against a `09:00` threshold and `09:01` is late.
pub fn is_after(hhmm: &str, threshold: &str) -> bool {
    hhmm > threshold
}

pub fn is_before(hhmm: &str, threshold: &str) -> bool {
    hhmm < threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lagos() -> OrgClock {
        OrgClock::new(FixedOffset::east_opt(3600).unwrap())
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn local_day_crosses_utc_midnight() {
        let clock = lagos();
        let instant = utc("2025-05-26T23:30:00Z");
        assert_eq!(clock.day_of(instant), "2025-05-27");
        assert_eq!(clock.hhmm(instant), "00:30");
    }

    #[test]
    fn day_range_is_local_midnight_to_midnight() {
        let clock = lagos();
        let (start, end) = clock.day_range(NaiveDate::from_ymd_opt(2025, 5, 27).unwrap());
        assert_eq!(start, utc("2025-05-26T23:00:00Z"));
        assert_eq!(end, utc("2025-05-27T23:00:00Z"));
    }

    #[test]
    fn month_bounds_handle_short_months() {
        let (first, last) = parse_month("2024-02").unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (_, december_end) = parse_month("2025-12").unwrap();
        assert_eq!(december_end, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn rejects_malformed_dates_and_months() {
        assert!(parse_day("27/05/2025").is_err());
        assert!(parse_month("2025-5").is_err());
        assert!(parse_month("2025-13").is_err());
    }

    #[test]
    fn hhmm_validation() {
        assert!(is_valid_hhmm("09:00"));
        assert!(is_valid_hhmm("23:59"));
        assert!(!is_valid_hhmm("9:00"));
        assert!(!is_valid_hhmm("24:00"));
        assert!(!is_valid_hhmm("09:60"));
    }

    #[test]
    fn threshold_comparison_is_strict() {
        assert!(!is_after("08:59", "09:00"));
        assert!(!is_after("09:00", "09:00"));
        assert!(is_after("09:01", "09:00"));
        assert!(is_before("16:59", "17:00"));
        assert!(!is_before("17:00", "17:00"));
    }
}
