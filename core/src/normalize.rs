//! Value normalization boundary.
//!
//! Raw spreadsheet cells arrive as a mix of native numbers, annotated
//! strings ("70(EUR)"), locale-formatted strings ("$1,234.56"), and
//! spreadsheet date serials. Everything is converted here to a small
//! closed set of value kinds before any business logic touches it.
//! Per-cell parse failures never abort ingestion: numbers degrade to 0,
//! dates and currencies to None.

use crate::types::EpochMillis;
use calamine::Data;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Days between the spreadsheet serial epoch (1899-12-30) and the Unix
/// epoch. Serial values above this are dates; values at or below it are
/// assumed to already be epoch millis.
pub const SERIAL_EPOCH_OFFSET_DAYS: f64 = 25_569.0;

const MILLIS_PER_DAY_F: f64 = 86_400_000.0;

// ── Raw cell values ──────────────────────────────────────────────────────────

/// The closed value kind every raw cell is reduced to at the ingestion
/// boundary. Business logic never branches on spreadsheet types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawCell {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl RawCell {
    pub fn is_blank(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed text content, None when blank or non-text.
    pub fn as_trimmed_text(&self) -> Option<&str> {
        match self {
            RawCell::Text(s) => {
                let t = s.trim();
                (!t.is_empty()).then_some(t)
            }
            _ => None,
        }
    }

    /// String form for header matching and display fields. Numbers keep
    /// an integer rendering when they have no fractional part.
    pub fn to_text(&self) -> String {
        match self {
            RawCell::Empty => String::new(),
            RawCell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            RawCell::Text(s) => s.trim().to_string(),
            RawCell::Bool(b) => b.to_string(),
        }
    }
}

impl From<&Data> for RawCell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => RawCell::Empty,
            Data::String(s) => RawCell::Text(s.clone()),
            Data::Float(n) => RawCell::Number(*n),
            Data::Int(n) => RawCell::Number(*n as f64),
            Data::Bool(b) => RawCell::Bool(*b),
            Data::DateTime(dt) => RawCell::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
        }
    }
}

// ── Numeric parsing ──────────────────────────────────────────────────────────

/// Normalize any cell to a finite number. Unparseable values become 0.
pub fn parse_number(cell: &RawCell) -> f64 {
    match cell {
        RawCell::Number(n) => finite_or_zero(*n),
        RawCell::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        RawCell::Text(s) => parse_number_str(s),
        RawCell::Empty => 0.0,
    }
}

pub fn parse_number_str(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    // Leading numeric token before any annotation, e.g. "70(EUR)" or
    // "1,234.56 USD". Thousands separators are dropped.
    let token: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | ','))
        .filter(|c| *c != ',')
        .collect();
    if !token.is_empty() {
        if let Ok(n) = token.parse::<f64>() {
            return finite_or_zero(n);
        }
    }

    // No leading token: strip currency symbols, separators, parentheses
    // and spaces, then parse whatever digits remain.
    let stripped: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
        .collect();
    stripped.parse::<f64>().map(finite_or_zero).unwrap_or(0.0)
}

fn finite_or_zero(n: f64) -> f64 {
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

// ── Currency extraction ──────────────────────────────────────────────────────

/// A 3-uppercase-letter token in parentheses, e.g. "70(EUR)" → "EUR".
/// Extracted independently of the numeric parse.
pub fn extract_currency(cell: &RawCell) -> Option<String> {
    let RawCell::Text(s) = cell else { return None };
    let bytes = s.as_bytes();
    for i in 0..bytes.len() {
        if bytes[i] != b'(' {
            continue;
        }
        if let Some(window) = bytes.get(i + 1..i + 5) {
            if window[..3].iter().all(u8::is_ascii_uppercase) && window[3] == b')' {
                return Some(String::from_utf8_lossy(&window[..3]).into_owned());
            }
        }
    }
    None
}

// ── Date parsing ─────────────────────────────────────────────────────────────

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d.%m.%Y"];

/// Normalize a cell to epoch millis. Spreadsheet serials above the 1970
/// offset convert via (value − 25569) × 86 400 000; smaller numbers pass
/// through as already-epoch millis. Strings go through a format battery.
/// Unparseable values become None.
pub fn parse_date_millis(cell: &RawCell) -> Option<EpochMillis> {
    match cell {
        RawCell::Number(n) if n.is_finite() => {
            if *n > SERIAL_EPOCH_OFFSET_DAYS {
                Some(((n - SERIAL_EPOCH_OFFSET_DAYS) * MILLIS_PER_DAY_F) as i64)
            } else {
                Some(*n as i64)
            }
        }
        RawCell::Text(s) => parse_date_str(s.trim()),
        _ => None,
    }
}

fn parse_date_str(raw: &str) -> Option<EpochMillis> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
        }
    }
    None
}

// ── Enumerated-code mapping ──────────────────────────────────────────────────

const PLATFORM_RULES: &[(&str, i64)] = &[("mt5", 1), ("mt4", 2), ("ctrader", 3), ("webtrader", 4)];

const ACCOUNT_TYPE_RULES: &[(&str, i64)] = &[
    ("demo", 2),
    ("islamic", 3),
    ("swapfree", 3),
    ("live", 1),
    ("real", 1),
    ("standard", 1),
];

/// Map free-text platform names to the small integer codes the rest of
/// the pipeline stores, e.g. anything containing "mt5" → 1.
pub fn platform_code(cell: &RawCell) -> i64 {
    code_from_rules(cell, PLATFORM_RULES)
}

pub fn account_type_code(cell: &RawCell) -> i64 {
    code_from_rules(cell, ACCOUNT_TYPE_RULES)
}

fn code_from_rules(cell: &RawCell, rules: &[(&str, i64)]) -> i64 {
    match cell {
        RawCell::Number(n) if n.is_finite() => *n as i64,
        RawCell::Text(s) => {
            let folded: String = s
                .to_lowercase()
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
                .collect();
            for (needle, code) in rules {
                if folded.contains(needle) {
                    return *code;
                }
            }
            // Unmapped text may still carry a numeric code.
            parse_number_str(s) as i64
        }
        _ => 0,
    }
}
