//! Due-date parsing
//!
//! Portal due dates are free text ("Tomorrow", "Friday 23:59", "2025-03-04",
//! "2025年3月4日"). They are parsed once into a [`DueDate`] and resolved against
//! the analysis "now"; the raw text stays on the assignment untouched.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

static EMBEDDED_ISO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").expect("valid regex"));

/// Relative tokens and their day offsets. Checked in order.
const RELATIVE_TOKENS: &[(&str, i64)] = &[
    ("today", 0),
    ("tomorrow", 1),
    ("今天", 0),
    ("明天", 1),
    ("后天", 2),
];

const WEEKDAY_TOKENS: &[(&str, Weekday)] = &[
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
    ("周一", Weekday::Mon),
    ("周二", Weekday::Tue),
    ("周三", Weekday::Wed),
    ("周四", Weekday::Thu),
    ("周五", Weekday::Fri),
    ("周六", Weekday::Sat),
    ("周日", Weekday::Sun),
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%d %B %Y",
    "%B %d, %Y",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelativeDue {
    /// Offset in days from "now" ("today" is 0).
    Days(i64),
    /// Next occurrence of a weekday, never today.
    Weekday(Weekday),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DueDate {
    Known(NaiveDate),
    Relative(RelativeDue),
    Unparseable(String),
}

impl DueDate {
    /// Runs the parser chain: relative tokens, weekday names, numeric formats.
    pub fn parse(raw: &str) -> DueDate {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return DueDate::Unparseable(raw.to_string());
        }
        let lowered = trimmed.to_lowercase();

        for (token, offset) in RELATIVE_TOKENS {
            if lowered.contains(token) {
                return DueDate::Relative(RelativeDue::Days(*offset));
            }
        }

        for (token, weekday) in WEEKDAY_TOKENS {
            if lowered.contains(token) {
                return DueDate::Relative(RelativeDue::Weekday(*weekday));
            }
        }

        match parse_calendar_date(trimmed) {
            Some(date) => DueDate::Known(date),
            None => DueDate::Unparseable(raw.to_string()),
        }
    }

    /// Resolves to an instant relative to `now`. Relative days land on 23:59,
    /// weekdays keep the clock time of `now`, calendar dates are midnight.
    pub fn resolve(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            DueDate::Known(date) => Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))),
            DueDate::Relative(RelativeDue::Days(offset)) => {
                let end_of_day = NaiveTime::from_hms_opt(23, 59, 0)?;
                let day = now.date_naive().checked_add_signed(Duration::days(*offset))?;
                Some(Utc.from_utc_datetime(&day.and_time(end_of_day)))
            }
            DueDate::Relative(RelativeDue::Weekday(target)) => {
                let current = now.weekday().num_days_from_monday() as i64;
                let wanted = target.num_days_from_monday() as i64;
                let mut ahead = (wanted - current).rem_euclid(7);
                if ahead == 0 {
                    ahead = 7;
                }
                Some(now + Duration::days(ahead))
            }
            DueDate::Unparseable(_) => None,
        }
    }
}

fn parse_calendar_date(text: &str) -> Option<NaiveDate> {
    let normalized = text
        .replace('年', "-")
        .replace('月', "-")
        .replace('日', "")
        .trim()
        .to_string();

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&normalized, fmt) {
            return Some(date);
        }
    }

    // Dates embedded in longer text, e.g. "Due 2025-03-04 23:59"
    let caps = EMBEDDED_ISO_RE.captures(&normalized)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
