use chrono::{NaiveDate, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref YYYYMMDD_T_HHMMSS: Regex = Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}").unwrap();
    static ref DDMMYYYY: Regex = Regex::new(r"^[0-9]{1,2}/[0-9]{1,2}/[0-9]{4}$").unwrap();
    static ref DDMMMYYYY: Regex = Regex::new(r"^[0-9]{1,2} [a-zA-Z]{3} [0-9]{4}$").unwrap();
}

/// Parse the date formats we see in exported statements: `2024-01-31`, `2024-01-31T10:00:00`
/// (with or without zone), `31/01/2024` and `31 Jan 2024`.
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if YYYYMMDD_T_HHMMSS.is_match(s) {
        NaiveDateTime::parse_from_str(s.get(0..19)?, "%Y-%m-%dT%H:%M:%S").ok().map(|d| d.date())
    } else if DDMMYYYY.is_match(s) {
        NaiveDate::parse_from_str(s, "%d/%m/%Y").ok()
    } else if DDMMMYYYY.is_match(s) {
        NaiveDate::parse_from_str(s, "%d %b %Y").ok()
    } else {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
    }
}

/// Parse an amount such as `1,200.50` or `$45`
pub(crate) fn parse_amount(s: &str) -> Option<f64> {
    let cleaned = s.replace(['$', ','], "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|a| a.is_finite())
}

/// New record id: the current time in milliseconds, bumped past any numeric id already taken.
/// When the numeric range is used up the id gets a `-n` suffix instead.
pub(crate) fn next_id<'a, I>(existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let existing: Vec<&str> = existing.into_iter().collect();
    let now = Utc::now().timestamp_millis();
    let max_existing = existing.iter().filter_map(|id| id.parse::<i64>().ok()).max();
    match max_existing {
        Some(max) if max >= now => match max.checked_add(1) {
            Some(id) => id.to_string(),
            None => (1u64..)
                .map(|n| format!("{now}-{n}"))
                .find(|id| !existing.contains(&id.as_str()))
                .unwrap_or_else(|| now.to_string()),
        },
        _ => now.to_string(),
    }
}

/// `project-income` -> `Project Income`
pub(crate) fn title_case(s: &str) -> String {
    s.split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Format $ amount
pub(crate) fn format_amount(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", -amount)
    } else {
        format!("${amount:.2}")
    }
}
