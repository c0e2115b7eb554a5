use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static PATTERN_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[[^\]]*\]|YYYY|YY|SSS|MMMM|MMM|MM|M|DD|D|HH|H|mm|ss|ZZ|Z").unwrap()
});

/// Translate a `YYYY-MM-DD`-style pattern into a chrono format string.
/// Patterns already written with `%` specifiers are returned unchanged.
pub fn to_chrono_format(pattern: &str) -> String {
    if pattern.contains('%') {
        return pattern.to_string();
    }

    let mut out = String::with_capacity(pattern.len() * 2);
    let mut last = 0;
    for token in PATTERN_TOKEN.find_iter(pattern) {
        out.push_str(&pattern[last..token.start()]);
        let text = token.as_str();
        let translated = match text {
            "YYYY" => "%Y",
            "YY" => "%y",
            "MMMM" => "%B",
            "MMM" => "%b",
            "MM" | "M" => "%m",
            "DD" | "D" => "%d",
            "HH" | "H" => "%H",
            "mm" => "%M",
            "ss" => "%S",
            "SSS" => "%3f",
            "ZZ" => "%z",
            // Also accepts a literal `Z` for UTC
            "Z" => "%#z",
            literal => {
                out.push_str(&literal[1..literal.len() - 1]);
                ""
            }
        };
        out.push_str(translated);
        last = token.end();
    }
    out.push_str(&pattern[last..]);
    out
}

/// Parse `value` with a user pattern. Date-only patterns yield midnight UTC.
pub fn parse_with_pattern(value: &str, pattern: &str) -> Option<DateTime<Utc>> {
    let format = to_chrono_format(pattern);
    let value = value.trim();

    if ["%z", "%:z", "%#z"].iter().any(|spec| format.contains(spec)) {
        return DateTime::parse_from_str(value, &format)
            .ok()
            .map(|dt| dt.with_timezone(&Utc));
    }
    if ["%H", "%M", "%S"].iter().any(|spec| format.contains(spec)) {
        return NaiveDateTime::parse_from_str(value, &format)
            .ok()
            .map(|dt| Utc.from_utc_datetime(&dt));
    }
    NaiveDate::parse_from_str(value, &format)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

/// Parse without a pattern: RFC 3339, then common ISO-like layouts.
pub fn parse_default(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}
