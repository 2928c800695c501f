//! Asia/Manila civil-date projection.
//!
//! Every date-scoped query is keyed by the calendar day as observed in the
//! Philippines. An instant must be projected here before it is compared with
//! or bucketed into a day.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

/// UTC+08:00. The Philippines has not observed daylight saving time since 1978.
pub const MANILA_OFFSET_SECS: i32 = 8 * 3600;

pub fn offset() -> FixedOffset {
    FixedOffset::east_opt(MANILA_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

pub fn to_manila(instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&offset())
}

pub fn civil_date(instant: DateTime<Utc>) -> NaiveDate {
    to_manila(instant).date_naive()
}

pub fn today() -> NaiveDate {
    civil_date(Utc::now())
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `HH:MM` wall-clock time in Manila.
pub fn clock_time(instant: DateTime<Utc>) -> String {
    to_manila(instant).format("%H:%M").to_string()
}

/// Accepts either a bare `YYYY-MM-DD` or an RFC 3339 instant; instants are
/// projected onto their Manila day.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|instant| civil_date(instant.with_timezone(&Utc)))
}
