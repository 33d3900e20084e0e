//! Date/time recognition for reservation prompts.
//!
//! Understands relative days ("tomorrow", "friday"), numeric and spelled-out
//! dates, and clock times. Relative expressions resolve against a reference
//! day supplied by the caller, normally the activity's timestamp.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A recognized date, time, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTimeResolution {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

impl fmt::Display for DateTimeResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.date, self.time) {
            (Some(date), Some(time)) => {
                write!(f, "{} {}", date.format("%Y-%m-%d"), time.format("%H:%M:%S"))
            }
            (Some(date), None) => write!(f, "{}", date.format("%Y-%m-%d")),
            (None, Some(time)) => write!(f, "{}", time.format("%H:%M:%S")),
            (None, None) => Ok(()),
        }
    }
}

struct Patterns {
    iso: Regex,
    slash: Regex,
    month_first: Regex,
    day_first: Regex,
    twelve_hour: Regex,
    twenty_four_hour: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        const MONTH: &str = r"(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?";
        Patterns {
            iso: Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("iso date pattern"),
            slash: Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{2,4}))?\b")
                .expect("slash date pattern"),
            month_first: Regex::new(&format!(
                r"\b{MONTH}\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}}))?"
            ))
            .expect("month-first date pattern"),
            day_first: Regex::new(&format!(
                r"\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?{MONTH}(?:,?\s+(\d{{4}}))?"
            ))
            .expect("day-first date pattern"),
            twelve_hour: Regex::new(r"\b(\d{1,2})(?:[:.](\d{2}))?\s*(a\.?m\.?|p\.?m\.?)")
                .expect("12-hour time pattern"),
            twenty_four_hour: Regex::new(r"\b(\d{1,2})[:.](\d{2})\b").expect("24-hour time pattern"),
        }
    })
}

fn month_number(abbrev: &str) -> Option<u32> {
    let month = match abbrev {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn weekday(word: &str) -> Option<Weekday> {
    let day = match word {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" | "thurs" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

/// Builds a date, rolling year-less dates that already passed into next year.
fn calendar_date(today: NaiveDate, year: Option<i32>, month: u32, day: u32) -> Option<NaiveDate> {
    match year {
        Some(year) => NaiveDate::from_ymd_opt(year, month, day),
        None => {
            let this_year = NaiveDate::from_ymd_opt(today.year(), month, day)?;
            if this_year < today {
                NaiveDate::from_ymd_opt(today.year() + 1, month, day)
            } else {
                Some(this_year)
            }
        }
    }
}

fn parse_year(raw: Option<regex::Match<'_>>) -> Option<i32> {
    let value: i32 = raw?.as_str().parse().ok()?;
    Some(if value < 100 { 2000 + value } else { value })
}

fn relative_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    if text.contains("day after tomorrow") {
        return Some(today + Duration::days(2));
    }
    if text.contains("tomorrow") {
        return Some(today + Duration::days(1));
    }
    if text.contains("today") || text.contains("tonight") {
        return Some(today);
    }

    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .collect();
    for (idx, word) in words.iter().enumerate() {
        if let Some(target) = weekday(word) {
            let current = today.weekday().num_days_from_monday() as i64;
            let wanted = target.num_days_from_monday() as i64;
            let mut ahead = (wanted - current).rem_euclid(7);
            let is_next = idx > 0 && words[idx - 1] == "next";
            if is_next && ahead == 0 {
                ahead = 7;
            }
            return Some(today + Duration::days(ahead));
        }
    }
    None
}

fn absolute_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let p = patterns();

    if let Some(caps) = p.iso.captures(text) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    if let Some(caps) = p.slash.captures(text) {
        let month = caps[1].parse().ok()?;
        let day = caps[2].parse().ok()?;
        return calendar_date(today, parse_year(caps.get(3)), month, day);
    }
    if let Some(caps) = p.month_first.captures(text) {
        let month = month_number(&caps[1])?;
        let day = caps[2].parse().ok()?;
        return calendar_date(today, parse_year(caps.get(3)), month, day);
    }
    if let Some(caps) = p.day_first.captures(text) {
        let day = caps[1].parse().ok()?;
        let month = month_number(&caps[2])?;
        return calendar_date(today, parse_year(caps.get(3)), month, day);
    }
    None
}

fn clock_time(text: &str) -> Option<NaiveTime> {
    if text.contains("noon") || text.contains("midday") {
        return NaiveTime::from_hms_opt(12, 0, 0);
    }
    if text.contains("midnight") {
        return NaiveTime::from_hms_opt(0, 0, 0);
    }

    let p = patterns();
    let twelve_hour = p.twelve_hour.captures_iter(text).find_map(|caps| {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps.get(2).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
        if !(1..=12).contains(&hour) {
            return None;
        }
        let is_pm = caps[3].starts_with('p');
        let hour = match (hour, is_pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
        NaiveTime::from_hms_opt(hour, minute, 0)
    });
    if twelve_hour.is_some() {
        return twelve_hour;
    }

    p.twenty_four_hour.captures_iter(text).find_map(|caps| {
        let hour = caps[1].parse().ok()?;
        let minute = caps[2].parse().ok()?;
        NaiveTime::from_hms_opt(hour, minute, 0)
    })
}

/// Recognizes a date and/or time in `reply`, resolving relative days against `today`.
///
/// Returns `None` when neither part is found.
pub fn recognize_datetime(reply: &str, today: NaiveDate) -> Option<DateTimeResolution> {
    let text = reply.trim().to_lowercase();
    let date = relative_date(&text, today).or_else(|| absolute_date(&text, today));
    let time = clock_time(&text);

    if date.is_none() && time.is_none() {
        return None;
    }
    Some(DateTimeResolution { date, time })
}

#[cfg(test)]
mod tests {
    use super::*;

    // A Monday.
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn resolve(text: &str) -> Option<String> {
        recognize_datetime(text, today()).map(|r| r.to_string())
    }

    #[test]
    fn test_relative_days() {
        assert_eq!(resolve("today").as_deref(), Some("2026-10-19"));
        assert_eq!(resolve("tomorrow").as_deref(), Some("2026-10-20"));
        assert_eq!(resolve("the day after tomorrow").as_deref(), Some("2026-10-21"));
    }

    #[test]
    fn test_weekdays() {
        assert_eq!(resolve("friday").as_deref(), Some("2026-10-23"));
        assert_eq!(resolve("monday").as_deref(), Some("2026-10-19"));
        assert_eq!(resolve("next monday").as_deref(), Some("2026-10-26"));
    }

    #[test]
    fn test_numeric_dates() {
        assert_eq!(resolve("2026-12-24").as_deref(), Some("2026-12-24"));
        assert_eq!(resolve("11/3").as_deref(), Some("2026-11-03"));
        assert_eq!(resolve("1/15").as_deref(), Some("2027-01-15"));
        assert_eq!(resolve("12/31/27").as_deref(), Some("2027-12-31"));
        assert_eq!(resolve("2026-02-30"), None);
    }

    #[test]
    fn test_spelled_out_dates() {
        assert_eq!(resolve("October 25th").as_deref(), Some("2026-10-25"));
        assert_eq!(resolve("25 of dec").as_deref(), Some("2026-12-25"));
        assert_eq!(resolve("Nov 2, 2027").as_deref(), Some("2027-11-02"));
    }

    #[test]
    fn test_clock_times() {
        assert_eq!(resolve("7pm").as_deref(), Some("19:00:00"));
        assert_eq!(resolve("7:30 p.m.").as_deref(), Some("19:30:00"));
        assert_eq!(resolve("12am").as_deref(), Some("00:00:00"));
        assert_eq!(resolve("19:45").as_deref(), Some("19:45:00"));
        assert_eq!(resolve("noon").as_deref(), Some("12:00:00"));
        assert_eq!(resolve("13pm"), None);
    }

    #[test]
    fn test_dotted_clock_times() {
        assert_eq!(resolve("7.30pm").as_deref(), Some("19:30:00"));
        assert_eq!(resolve("at 7.30").as_deref(), Some("07:30:00"));
        assert_eq!(resolve("20.15").as_deref(), Some("20:15:00"));
    }

    #[test]
    fn test_out_of_range_twelve_hour_falls_through() {
        assert_eq!(resolve("13pm or 19:00").as_deref(), Some("19:00:00"));
    }

    #[test]
    fn test_date_and_time_together() {
        assert_eq!(
            resolve("tomorrow at 8pm").as_deref(),
            Some("2026-10-20 20:00:00")
        );
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(resolve("whenever suits you"), None);
        assert_eq!(resolve(""), None);
    }
}
