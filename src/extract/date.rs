//! Transaction date parsing from serial numbers and free text.
//!
//! Text dates are read day-before-month, the convention of the statements
//! this crate targets. Month-first patterns are only tried once every
//! day-first reading has failed.

use crate::workbook::cell::CellValue;
use crate::workbook::DateSystem;
use chrono::Datelike;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use regex::Regex;
use std::sync::OnceLock;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Serials below this value fall in the range where the 1900 system counts
/// the phantom 1900-02-29, so they have no unambiguous date
const FIRST_UNAMBIGUOUS_1900_SERIAL: f64 = 61.0;

/// Day-first patterns; two-digit years are tried before four-digit ones
/// because `%Y` would also accept `24` as the year 24.
const DAY_FIRST_PATTERNS: &[&str] = &[
    "%d/%m/%y", "%d/%m/%Y",
    "%d-%m-%y", "%d-%m-%Y",
    "%d.%m.%y", "%d.%m.%Y",
    "%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d",
    "%d %B %y", "%d %B %Y", "%d %B, %Y",
    "%d-%B-%y", "%d-%B-%Y",
    "%d/%B/%y", "%d/%B/%Y",
    "%B %d, %Y", "%B %d %Y",
];

const MONTH_FIRST_PATTERNS: &[&str] = &[
    "%m/%d/%y", "%m/%d/%Y",
    "%m-%d-%y", "%m-%d-%Y",
    "%m.%d.%y", "%m.%d.%Y",
];

const TIME_PATTERNS: &[&str] = &[
    "%H:%M:%S", "%H:%M:%S%.f", "%H:%M",
    "%I:%M:%S %p", "%I:%M %p", "%I:%M%p",
];

fn ordinal_suffix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").expect("Hardcode regex pattern"))
}

fn whitespace() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("Hardcode regex pattern"))
}

fn leading_weekday() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tues|tue|wed|thurs|thur|thu|fri|sat|sun)\.?,? ")
            .expect("Hardcode regex pattern")
    })
}

/// Splits off a time of day; a UTC designator or offset after it is dropped
/// and the wall-clock time kept.
fn trailing_time() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?P<date>.+?)(?:T| |, )(?P<time>\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?: ?[AaPp][Mm])?) ?(?:Z|[+-]\d{2}:?\d{2})?$",
        )
        .expect("Hardcode regex pattern")
    })
}

/// Parses a transaction date cell; never fails, returning `None` instead.
pub fn parse_date(value: &CellValue, date_system: DateSystem) -> Option<NaiveDateTime> {
    match value {
        CellValue::Number(serial) => serial_to_datetime(*serial, date_system),
        CellValue::Text(text) => parse_date_text(text),
        CellValue::Empty => None,
    }
}

/// Converts a spreadsheet serial number to a date-time.
///
/// The integer part counts days from the epoch of `date_system`; the fraction
/// is the time of day, rounded to the nearest second.
pub fn serial_to_datetime(serial: f64, date_system: DateSystem) -> Option<NaiveDateTime> {
    // Below one the cell holds a time of day only
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = match date_system {
        DateSystem::V1900 if serial < FIRST_UNAMBIGUOUS_1900_SERIAL => return None,
        DateSystem::V1900 => NaiveDate::from_ymd_opt(1899, 12, 30)?,
        DateSystem::V1904 => NaiveDate::from_ymd_opt(1904, 1, 1)?,
    };

    let mut days = serial.trunc();
    let mut seconds = ((serial - days) * SECONDS_PER_DAY).round();
    if seconds >= SECONDS_PER_DAY {
        seconds = 0.0;
        days += 1.0;
    }
    // Anything past 9999-12-31 is garbage for a statement date
    if days > 3_000_000.0 {
        return None;
    }

    let date = epoch.checked_add_signed(Duration::try_days(days as i64)?)?;
    if date.year() > 9999 {
        return None;
    }
    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::try_seconds(seconds as i64)?)
}

/// Parses free-text dates such as `05/01/2024`, `5-Jan-24`, `22nd Feb 2024`,
/// `Friday, 5 January 2024`, `20240105` or `2024-01-05T14:30:00Z`.
pub fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let text = ordinal_suffix().replace_all(text.trim(), "$1");
    let text = whitespace().replace_all(&text, " ");
    let text = leading_weekday().replace(text.trim(), "");
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let (date, time) = match trailing_time().captures(text) {
        Some(captures) => {
            let time = parse_time(&captures["time"])?;
            (captures.name("date")?.as_str().trim_end_matches(','), time)
        }
        None => (text, NaiveTime::MIN),
    };
    let date = parse_with(date, DAY_FIRST_PATTERNS).or_else(|| parse_with(date, MONTH_FIRST_PATTERNS))?;
    Some(date.and_time(time))
}

fn parse_with(text: &str, patterns: &[&str]) -> Option<NaiveDate> {
    patterns.iter().find_map(|pattern| NaiveDate::parse_from_str(text, pattern).ok())
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    TIME_PATTERNS.iter().find_map(|pattern| NaiveTime::parse_from_str(text, pattern).ok())
}
