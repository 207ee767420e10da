//! Temporal parsing and multi-column date fusion helpers.
//!
//! Parsing runs a chain: a caller-supplied parser first (scalar, any
//! failure falls through), then a bulk structured fast path that locks onto
//! the first matching format, then a per-value flexible parser honoring the
//! day-first flag. A value that survives the whole chain unparsed leaves
//! the entry missing rather than raising.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::options::DateParserFn;
use crate::value::Column;

/// Structured formats tried by the bulk fast path, in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y %m %d %H:%M:%S",
    "%Y %m %d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y %m %d", "%Y%m%d", "%Y-%m"];

/// Ambiguous little-endian/middle-endian calendar formats; order depends on
/// the day-first flag.
const DAY_FIRST_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%d %m %Y"];
const MONTH_FIRST_FORMATS: &[&str] = &["%m/%d/%Y", "%m-%d-%Y", "%m.%d.%Y", "%m %d %Y"];

/// Parse one calendar string, trying structured datetime formats first,
/// then date-only formats, then the ambiguous day/month forms in the order
/// implied by `dayfirst`.
pub fn parse_datetime(value: &str, dayfirst: bool) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if *fmt == "%Y%m%d" && (trimmed.len() != 8 || !trimmed.bytes().all(|b| b.is_ascii_digit()))
        {
            continue;
        }
        if *fmt == "%Y-%m" {
            // chrono needs a day component; append one rather than lose
            // year-month values.
            if let Ok(d) = NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d") {
                if trimmed.len() == 7 && trimmed.as_bytes()[4] == b'-' {
                    return d.and_hms_opt(0, 0, 0);
                }
            }
            continue;
        }
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    let (first, second) = if dayfirst {
        (DAY_FIRST_FORMATS, MONTH_FIRST_FORMATS)
    } else {
        (MONTH_FIRST_FORMATS, DAY_FIRST_FORMATS)
    };
    for fmt in first.iter().chain(second.iter()) {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Parse a whole column of calendar strings into a temporal array.
///
/// The fast path locks onto the format matched by the first non-missing
/// value and applies it in bulk; values that miss fall back to the general
/// chain individually. A caller-supplied parser, when present, is tried
/// first for every value.
pub fn parse_date_column(
    values: &[String],
    na_tokens: &HashSet<String>,
    dayfirst: bool,
    custom: Option<&DateParserFn>,
) -> Column {
    let locked_format = values
        .iter()
        .map(|v| v.trim())
        .find(|v| !v.is_empty() && !na_tokens.contains(*v))
        .and_then(detect_format);
    if let Some(fmt) = locked_format {
        debug!(format = fmt, "locked bulk date format");
    }

    let out = values
        .iter()
        .map(|value| {
            let trimmed = value.trim();
            if na_tokens.contains(trimmed) || trimmed.is_empty() {
                return None;
            }
            if let Some(parser) = custom {
                if let Some(dt) = parser(trimmed) {
                    return Some(dt);
                }
            }
            if let Some(fmt) = locked_format {
                if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                    return Some(dt);
                }
                if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
                    return d.and_hms_opt(0, 0, 0);
                }
            }
            parse_datetime(trimmed, dayfirst)
        })
        .collect();
    Column::DateTime(out)
}

/// Format matched by a sample value, if any.
fn detect_format(sample: &str) -> Option<&'static str> {
    DATETIME_FORMATS
        .iter()
        .find(|fmt| NaiveDateTime::parse_from_str(sample, fmt).is_ok())
        .or_else(|| {
            DATE_FORMATS.iter().find(|fmt| {
                if **fmt == "%Y%m%d"
                    && (sample.len() != 8 || !sample.bytes().all(|b| b.is_ascii_digit()))
                {
                    return false;
                }
                if **fmt == "%Y-%m" {
                    return false;
                }
                NaiveDate::parse_from_str(sample, fmt).is_ok()
            })
        })
        .copied()
}

/// Join the per-row string forms of several source columns with a single
/// space; a lone source passes through unchanged.
pub fn concat_date_cols(sources: &[Vec<String>]) -> Vec<String> {
    match sources {
        [only] => only.clone(),
        _ => {
            let rows = sources.first().map_or(0, Vec::len);
            (0..rows)
                .map(|row| {
                    sources
                        .iter()
                        .map(|col| col[row].as_str())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect()
        }
    }
}
