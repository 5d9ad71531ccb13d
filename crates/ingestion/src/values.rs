//! Tolerant numeric and date parsing.
//!
//! Nothing here fails: unusable input becomes 0 or the epoch date.

use bhav_core::epoch_date;
use chrono::{DateTime, NaiveDate};

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Formats tried when a date is not in `DD-Mon-YYYY` form.
const GENERIC_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d %b %Y"];

/// Parse a decimal, ignoring thousands separators and whitespace.
///
/// Empty, non-numeric and non-finite input yields 0.
pub fn parse_number(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Parse a non-negative count. Fractions are rounded, negatives become 0.
pub fn parse_count(raw: &str) -> u64 {
    let v = parse_number(raw);
    if v <= 0.0 {
        0
    } else {
        v.round() as u64
    }
}

/// Month number (1-12) for a three-letter abbreviation, any case.
pub fn month_from_abbreviation(name: &str) -> Option<u32> {
    let name = name.trim();
    MONTH_ABBREVIATIONS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .map(|i| i as u32 + 1)
}

/// Parse a trading date such as `02-Feb-2026`.
///
/// Input that is not `DD-Mon-YYYY` goes through a handful of generic
/// formats. Anything unparsable, including impossible calendar dates,
/// degrades to the epoch.
pub fn parse_trade_date(raw: &str) -> NaiveDate {
    let raw = raw.trim();
    if raw.is_empty() {
        return epoch_date();
    }

    let parts: Vec<&str> = raw.split('-').collect();
    if parts.len() == 3 {
        if let Some(month) = month_from_abbreviation(parts[1]) {
            return ymd(parts[2], month, parts[0]).unwrap_or_else(epoch_date);
        }
    }

    parse_generic_date(raw).unwrap_or_else(epoch_date)
}

fn ymd(year: &str, month: u32, day: &str) -> Option<NaiveDate> {
    let year = year.trim().parse::<i32>().ok()?;
    let day = day.trim().parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_generic_date(raw: &str) -> Option<NaiveDate> {
    // Compact YYYYMMDD
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        let month = raw[4..6].parse::<u32>().ok()?;
        return ymd(&raw[0..4], month, &raw[6..8]);
    }

    for format in GENERIC_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Trading date embedded in an upload filename as `DDMMYYYY`.
///
/// Uses the first run of exactly eight digits, e.g.
/// `sec_bhavdata_full_02022026.csv` is 2 February 2026.
pub fn date_from_filename(filename: &str) -> Option<NaiveDate> {
    let digits = filename
        .split(|c: char| !c.is_ascii_digit())
        .find(|run| run.len() == 8)?;

    let day = digits[0..2].parse::<u32>().ok()?;
    let month = digits[2..4].parse::<u32>().ok()?;
    let year = digits[4..8].parse::<i32>().ok()?;

    if !(1..=31).contains(&day) || !(1..=12).contains(&month) || !(1900..=2100).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}
