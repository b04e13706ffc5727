//! Permissive date parsing.
//!
//! Each form is an ordered attempt returning `Option`; the first that
//! matches wins. Numbers are never dates.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::schema::Value;

/// Which component comes first in ambiguous `01/02/2024`-style dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    #[default]
    MonthFirst,
    DayFirst,
}

const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];

const ISO_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const NAMED_MONTH_FORMATS: &[&str] = &["%b %d, %Y", "%B %d, %Y", "%d %b %Y", "%d %B %Y"];

const MONTH_FIRST_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m.%d.%Y",
];

const DAY_FIRST_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
];

/// Parse a cell as an instant. Already-parsed instants pass through.
pub fn parse_value(value: &Value, order: DateOrder) -> Option<NaiveDateTime> {
    match value {
        Value::DateTime(dt) => Some(*dt),
        Value::Text(text) => parse_datetime(text, order),
        _ => None,
    }
}

/// Parse text as an instant using every supported form.
pub fn parse_datetime(text: &str, order: DateOrder) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.bytes().all(|b| b.is_ascii_digit()) {
        return parse_compact(text);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    parse_with(text, ISO_DATETIME_FORMATS)
        .or_else(|| parse_date_with(text, ISO_DATE_FORMATS))
        .or_else(|| parse_date_with(text, NAMED_MONTH_FORMATS))
        .or_else(|| {
            let (preferred, fallback) = match order {
                DateOrder::MonthFirst => (MONTH_FIRST_FORMATS, DAY_FIRST_FORMATS),
                DateOrder::DayFirst => (DAY_FIRST_FORMATS, MONTH_FIRST_FORMATS),
            };
            parse_mixed(text, preferred).or_else(|| parse_mixed(text, fallback))
        })
}

/// Parse `YYYYMMDD` or `YYYYMMDDHHMMSS`.
pub fn parse_compact(digits: &str) -> Option<NaiveDateTime> {
    if !digits.is_ascii() {
        return None;
    }
    let field = |range: std::ops::Range<usize>| digits.get(range)?.parse::<u32>().ok();

    let date = NaiveDate::from_ymd_opt(field(0..4)? as i32, field(4..6)?, field(6..8)?)?;
    match digits.len() {
        8 => date.and_hms_opt(0, 0, 0),
        14 => date.and_hms_opt(field(8..10)?, field(10..12)?, field(12..14)?),
        _ => None,
    }
}

/// Render an instant in the fixed-width `YYYYMMDDHHMMSS` form.
pub fn format_compact(dt: &NaiveDateTime) -> String {
    dt.format("%Y%m%d%H%M%S").to_string()
}

fn parse_with(text: &str, formats: &[&str]) -> Option<NaiveDateTime> {
    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

fn parse_date_with(text: &str, formats: &[&str]) -> Option<NaiveDateTime> {
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .map(|d| d.and_time(NaiveTime::MIN))
}

fn parse_mixed(text: &str, formats: &[&str]) -> Option<NaiveDateTime> {
    parse_with(text, formats).or_else(|| parse_date_with(text, formats))
}
