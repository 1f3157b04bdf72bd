use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use once_cell::sync::Lazy;

use crate::google::sheets::CellValue;

/// India Standard Time, the fixed zone for every "today"/"this month" check.
pub static IST: Lazy<FixedOffset> =
    Lazy::new(|| FixedOffset::east_opt(5 * 3600 + 1800).expect("IST offset is valid"));

/// Sheets serial day 0. The 1899-12-30 epoch carries the historical
/// Lotus 1-2-3 leap-year quirk; serial 0 must map to this exact date.
pub static SHEETS_EPOCH: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(1899, 12, 30).expect("sheets epoch is valid"));

pub fn now_ist() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&IST)
}

pub fn today_ist() -> NaiveDate {
    now_ist().date_naive()
}

/// Human-readable IST timestamp used in sheet rows and chat cards.
pub fn ist_timestamp() -> String {
    now_ist().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Attendance rows historically use this spaced stamp; the read path
/// accepts it via the fallback parse chain below.
pub fn attendance_stamp() -> String {
    now_ist().format("%Y %m %d-%H:%M:%S").to_string()
}

pub fn serial_to_datetime(serial: f64) -> NaiveDateTime {
    let days = serial.floor();
    let secs = ((serial - days) * 86_400.0).round() as i64;
    SHEETS_EPOCH.and_time(NaiveTime::MIN) + Duration::days(days as i64) + Duration::seconds(secs)
}

const STAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d-%H:%M:%S",
    "%Y %m %d-%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

const LOCALE_FORMATS: [&str; 2] = ["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %I:%M:%S %p"];

/// Fallback chain for string-typed timestamp cells. Tries the known
/// write formats first, then ISO-8601 (with `Z` accepted), then
/// DD/MM/YYYY variants. Logs and returns None when nothing fits.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    for fmt in STAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(v, fmt) {
            return Some(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(v, "%Y-%m-%d") {
        return Some(d.and_time(NaiveTime::MIN));
    }
    let iso = v.replace('Z', "+00:00");
    if let Ok(dt) = DateTime::parse_from_rfc3339(&iso) {
        return Some(dt.with_timezone(&*IST).naive_local());
    }
    for fmt in LOCALE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(v, fmt) {
            return Some(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(v, "%d/%m/%Y") {
        return Some(d.and_time(NaiveTime::MIN));
    }
    tracing::warn!(value = %v, "could not parse timestamp cell");
    None
}

/// Resolve a timestamp cell (numeric serial or string) to an IST
/// calendar date.
pub fn cell_to_date(cell: &CellValue) -> Option<NaiveDate> {
    if let Some(serial) = cell.as_serial() {
        return Some(serial_to_datetime(serial).date());
    }
    parse_timestamp(&cell.as_text()).map(|dt| dt.date())
}

pub fn parse_ymd(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

pub fn month_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    use chrono::Datelike;
    let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
    let end = if today.month() == 12 {
        NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today)
    } else {
        NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
            .map(|d| d - Duration::days(1))
            .unwrap_or(today)
    };
    (start, end)
}

pub fn month_bounds_ist() -> (NaiveDate, NaiveDate) {
    month_bounds(today_ist())
}

/// Inclusive day count of the overlap between two date ranges, 0 when
/// they do not touch.
pub fn overlap_days(a_from: NaiveDate, a_to: NaiveDate, b_from: NaiveDate, b_to: NaiveDate) -> i64 {
    let lo = a_from.max(b_from);
    let hi = a_to.min(b_to);
    if lo > hi {
        0
    } else {
        (hi - lo).num_days() + 1
    }
}
