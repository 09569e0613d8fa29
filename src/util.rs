// Utility helpers for parsing cells and formatting console counts.
//
// This module centralizes the "dirty" spreadsheet/CSV number and date handling
// so the pipeline stages can work with clean, typed values.
use calamine::Data;
use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %B %Y", "%B %d, %Y"];

// Serial day 0 in the 1900 date system, with the Lotus leap-year bug folded in.
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
// 9999-12-31
const EXCEL_MAX_SERIAL: f64 = 2_958_465.0;

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in spreadsheet exports.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters (so no `nan`/`inf`).
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(",", "");
    s.parse::<f64>().ok()
}

pub fn parse_i64_safe(s: Option<&str>) -> Option<i64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i64>().ok()
}

/// Lenient date parse: any cell that cannot be read as a date gives `None`.
pub fn parse_date_lenient(cell: &Data) -> Option<NaiveDateTime> {
    match cell {
        Data::DateTime(dt) if dt.is_duration() => None,
        Data::DateTime(dt) => from_excel_serial(dt.as_f64()),
        Data::DateTimeIso(s) | Data::String(s) => parse_datetime_text(s),
        Data::Int(i) => from_excel_serial(*i as f64),
        Data::Float(f) => from_excel_serial(*f),
        _ => None,
    }
}

pub fn parse_datetime_text(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    // Offsets are dropped: the wall-clock time is what gets bucketed.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Convert a spreadsheet serial date (days since 1899-12-30, fractional part
/// is the time of day).
pub fn from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..=EXCEL_MAX_SERIAL).contains(&serial) {
        return None;
    }
    let days = serial.trunc();
    let secs = ((serial - days) * 86_400.0).round() as i64;
    let (y, m, d) = EXCEL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?
        .checked_add_days(Days::new(days as u64))?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::seconds(secs))
}

/// Text of a cell with surrounding whitespace removed; empty and error cells
/// give `""`.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts in console messages
    // (e.g., `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}
