//! Date conversion filter.
//!
//! Formats are either chrono strftime strings (anything containing `%`) or
//! letter-style formats such as `d.m.Y`, which are translated to strftime.
//! Timezones are IANA names (`Europe/Berlin`), a few common abbreviations or
//! numeric offsets.

use std::fmt::{Display, Write};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::value::{is_empty_value, scalar_text};
use crate::filter_registry::FilterError;

const NAME: &str = "convert_date";
const DEFAULT_TIMEZONE: &str = "UTC";

static OFFSET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i:UTC|GMT)?\s*([+-])(\d{1,2})(?::?(\d{2}))?$").expect("valid offset regex")
});

/// Timezone argument of `convert_date`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Zone {
    /// Named zone from the tz database, DST aware
    Named(Tz),
    /// Fixed UTC offset
    Fixed(FixedOffset),
}

/// Reformat a date string: `convert_date:<input format>,<output format>[,<timezone>]`.
///
/// Empty values pass through unchanged, whatever the arguments.
pub fn convert_date(value: Value, args: &[String]) -> Result<Value, FilterError> {
    if is_empty_value(&value) {
        return Ok(value);
    }
    if args.len() < 2 {
        return Err(FilterError::invalid_args(
            NAME,
            "expected an input format, an output format and an optional timezone",
        ));
    }

    let text = scalar_text(&value)
        .ok_or_else(|| FilterError::failed(NAME, "expected a date string"))?;

    let tz = args
        .get(2)
        .map(|tz| tz.trim())
        .filter(|tz| !tz.is_empty())
        .unwrap_or(DEFAULT_TIMEZONE);
    let zone = parse_timezone(tz)
        .ok_or_else(|| FilterError::invalid_args(NAME, format!("unknown timezone '{}'", tz)))?;

    let input_format = to_strftime(&args[0]);
    let output_format = to_strftime(&args[1]);
    let text = text.trim();

    let formatted = match zone {
        Zone::Named(tz) => parse_datetime(text, &input_format, &tz)
            .map(|parsed| format_datetime(&parsed, &output_format)),
        Zone::Fixed(offset) => parse_datetime(text, &input_format, &offset)
            .map(|parsed| format_datetime(&parsed, &output_format)),
    }
    .ok_or_else(|| {
        FilterError::failed(NAME, format!("'{}' does not match format '{}'", text, args[0]))
    })?
    .ok_or_else(|| FilterError::invalid_args(NAME, format!("invalid output format '{}'", args[1])))?;

    Ok(Value::String(formatted))
}

/// Parse `text` as a datetime in `tz`.
///
/// Tries an offset-aware datetime, then a naive datetime, then a plain date
/// at midnight. Local times repeated by a DST change resolve to the earlier
/// instant; local times skipped by one do not parse.
fn parse_datetime<Z: TimeZone>(text: &str, format: &str, tz: &Z) -> Option<DateTime<Z>> {
    if let Ok(datetime) = DateTime::parse_from_str(text, format) {
        return Some(datetime.with_timezone(tz));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
        return tz.from_local_datetime(&naive).earliest();
    }
    let date = NaiveDate::parse_from_str(text, format).ok()?;
    tz.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).earliest()
}

fn format_datetime<Z: TimeZone>(datetime: &DateTime<Z>, format: &str) -> Option<String>
where
    Z::Offset: Display,
{
    let mut formatted = String::new();
    write!(formatted, "{}", datetime.format(format)).ok()?;
    Some(formatted)
}

/// Resolve a timezone argument.
///
/// Tries a tz database name first, then abbreviations and numeric offsets.
pub fn parse_timezone(tz: &str) -> Option<Zone> {
    let tz = tz.trim();
    if let Ok(named) = tz.parse::<Tz>() {
        return Some(Zone::Named(named));
    }
    parse_offset(tz).map(Zone::Fixed)
}

/// Resolve an abbreviation or numeric offset to a fixed offset.
///
/// Accepts `UTC`/`GMT`/`Z`, a handful of abbreviations and numeric offsets
/// (`+02:00`, `-0530`, `UTC+1`).
pub fn parse_offset(tz: &str) -> Option<FixedOffset> {
    let hours = match tz.to_ascii_uppercase().as_str() {
        "UTC" | "GMT" | "Z" | "WET" => Some(0),
        "BST" | "CET" | "WEST" => Some(1),
        "CEST" | "EET" => Some(2),
        "EEST" | "MSK" => Some(3),
        "EDT" => Some(-4),
        "EST" | "CDT" => Some(-5),
        "CST" | "MDT" => Some(-6),
        "MST" | "PDT" => Some(-7),
        "PST" => Some(-8),
        "JST" => Some(9),
        _ => None,
    };
    if let Some(hours) = hours {
        return FixedOffset::east_opt(hours * 3600);
    }

    let caps = OFFSET_RE.captures(tz.trim())?;
    let hours: i32 = caps[2].parse().ok()?;
    let minutes: i32 = caps.get(3).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    let seconds = hours * 3600 + minutes * 60;
    match &caps[1] {
        "-" => FixedOffset::west_opt(seconds),
        _ => FixedOffset::east_opt(seconds),
    }
}

/// Translate a letter-style date format into a chrono strftime format.
///
/// Formats that already contain `%` are returned as they are. A backslash
/// escapes the next character; unknown letters are kept literally.
pub fn to_strftime(format: &str) -> String {
    if format.contains('%') {
        return format.to_string();
    }

    let mut out = String::with_capacity(format.len() * 2);
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(literal) = chars.next() {
                    out.push(literal);
                }
            }
            // field reset markers, meaningless for chrono
            '!' | '|' => {}
            other => match letter_item(other) {
                Some(item) => out.push_str(item),
                None => out.push(other),
            },
        }
    }
    out
}

fn letter_item(letter: char) -> Option<&'static str> {
    let item = match letter {
        // day
        'd' => "%d",
        'j' => "%-d",
        'D' => "%a",
        'l' => "%A",
        'N' => "%u",
        'w' => "%w",
        // week, month, year
        'W' => "%V",
        'm' => "%m",
        'n' => "%-m",
        'M' => "%b",
        'F' => "%B",
        'o' => "%G",
        'y' => "%y",
        'Y' => "%Y",
        // time
        'a' => "%P",
        'A' => "%p",
        'g' => "%-I",
        'G' => "%-H",
        'h' => "%I",
        'H' => "%H",
        'i' => "%M",
        's' => "%S",
        'u' => "%6f",
        'v' => "%3f",
        // zone
        'e' | 'T' => "%Z",
        'P' => "%:z",
        'O' => "%z",
        // full date/time
        'c' => "%Y-%m-%dT%H:%M:%S%:z",
        'r' => "%a, %d %b %Y %H:%M:%S %z",
        'U' => "%s",
        _ => return None,
    };
    Some(item)
}
