use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::months::key::MonthKey;

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d %b %Y",
    "%d %b %y",
    "%b %d, %Y",
    "%b %d %Y",
    "%A, %B %d, %Y",
];

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Smallest serial accepted as a spreadsheet day number. Anything shorter is
/// more likely a bare year or an invoice count than a date.
const MIN_SERIAL: i64 = 10_000;

/// Largest serial a spreadsheet can represent (9999-12-31).
const MAX_SERIAL: i64 = 2_958_465;

/// Parses a spreadsheet date cell into the month it falls in.
///
/// Cells come from hand-maintained sheets, so several shapes are accepted:
///
/// 1. ISO and long-form dates (`2024-01-15`, `2024-01-15T08:00:00Z`,
///    `15 Jan 2024`, `Jan 15, 2024`) and bare `YYYY-MM` keys
/// 2. Month-name short forms (`Jan-24`, `Jan-2024`, `January 2024`)
/// 3. Numeric `a/b/y` or `a-b-y`: day-first when `a > 12`, month-first otherwise
/// 4. Spreadsheet serial day numbers (`45306`)
///
/// Returns `None` when nothing matches. Callers treat such rows as having no
/// month at all.
pub fn parse_month_key(cell: &str) -> Option<MonthKey> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = parse_native(trimmed)
        .or_else(|| parse_month_name(trimmed))
        .or_else(|| parse_numeric(trimmed))
        .or_else(|| parse_serial(trimmed));

    if parsed.is_none() {
        debug!("Unparseable date cell: {:?}", cell);
    }
    parsed
}

fn parse_native(s: &str) -> Option<MonthKey> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return plausible(ts.date_naive());
    }

    // chrono's `%Y` happily reads one or two digits, so "31-01-24" would
    // come back as the year 31. Such matches are skipped, not accepted.
    let from_datetime = DATETIME_FORMATS
        .iter()
        .filter_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .find_map(|dt| plausible(dt.date()));
    if from_datetime.is_some() {
        return from_datetime;
    }

    let from_date = DATE_FORMATS
        .iter()
        .filter_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .find_map(plausible);
    if from_date.is_some() {
        return from_date;
    }

    s.parse::<MonthKey>().ok()
}

fn plausible(date: NaiveDate) -> Option<MonthKey> {
    Some(MonthKey::from_date(date)).filter(MonthKey::in_supported_years)
}

fn parse_month_name(s: &str) -> Option<MonthKey> {
    let tokens: Vec<&str> = s
        .split(|c: char| c == '-' || c == ' ' || c == '/' || c == ',' || c == '\'')
        .filter(|t| !t.is_empty())
        .collect();

    let [name, year] = tokens.as_slice() else {
        return None;
    };

    let month = month_from_name(name)?;
    let year = parse_year(year)?;
    MonthKey::new(year, month)
}

fn parse_numeric(s: &str) -> Option<MonthKey> {
    // Drop a trailing time component such as "15/01/2024 10:30".
    let date_part = s.split_whitespace().next()?;
    let parts: Vec<&str> = date_part.split(['/', '-', '.']).collect();

    let [first, second, third] = parts.as_slice() else {
        return None;
    };
    if ![first, second, third]
        .iter()
        .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    let (year, month, day) = if first.len() == 4 {
        (first.parse().ok()?, second.parse().ok()?, third.parse().ok()?)
    } else {
        let a: u32 = first.parse().ok()?;
        let b: u32 = second.parse().ok()?;
        let year = parse_year(third)?;
        if a > 12 {
            (year, b, a)
        } else {
            (year, a, b)
        }
    };

    NaiveDate::from_ymd_opt(year, month, day).and_then(plausible)
}

fn parse_serial(s: &str) -> Option<MonthKey> {
    let whole = s.split_once('.').map_or(s, |(whole, _)| whole);
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let serial: i64 = whole.parse().ok()?;
    if !(MIN_SERIAL..=MAX_SERIAL).contains(&serial) {
        return None;
    }

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = epoch.checked_add_signed(Duration::days(serial))?;
    Some(MonthKey::from_date(date))
}

fn month_from_name(token: &str) -> Option<u32> {
    let lower = token.to_ascii_lowercase();
    if lower.len() < 3 || !lower.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }

    MONTH_NAMES
        .iter()
        .position(|name| name.starts_with(&lower))
        .map(|idx| idx as u32 + 1)
}

fn parse_year(token: &str) -> Option<i32> {
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    match token.len() {
        2 => token.parse::<i32>().ok().map(|y| 2000 + y),
        4 => token.parse().ok(),
        _ => None,
    }
}
