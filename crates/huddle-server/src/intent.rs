//! Keyword-based detection of "let's meet" messages.
//!
//! A posted message is flagged as a meeting request when it mentions one of
//! [`MEETING_KEYWORDS`] and does not read as past tense ("we should have met").
//! Time hints found in flagged messages steer the suggested slots.

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use regex::Regex;

use huddle_shared::protocol::IntentAnalysis;

pub const MEETING_KEYWORDS: [&str; 11] = [
    "meet",
    "meeting",
    "schedule",
    "call",
    "discussion",
    "sync up",
    "catch up",
    "connect",
    "conference",
    "appointment",
    "gather",
];

/// Hours (UTC) of the suggested slots on the chosen day.
const SUGGESTED_HOURS: [i64; 4] = [9, 11, 14, 16];

struct Patterns {
    past_tense: Regex,
    time_hints: Vec<Regex>,
    ordinal_date: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |p: &str| Regex::new(p).unwrap_or_else(|e| panic!("bad pattern {p}: {e}"));
        Patterns {
            past_tense: compile(
                r"\b(should have|should’ve|should've|had|was|were|used to)\b.*\b(meet|meeting)\b",
            ),
            time_hints: [
                r"(?i)\b(today|tomorrow|day after tomorrow|yesterday)\b",
                r"(?i)\b(\d{1,2}[:.]\d{2}\s*(am|pm))\b",
                r"(?i)\b(\d{1,2}\s*(am|pm))\b",
                r"(?i)\b(between\s+\d{1,2}(?:[:.]\d{2})?\s*(?:am|pm)?\s+and\s+\d{1,2}(?:[:.]\d{2})?\s*(?:am|pm)?)\b",
                r"(?i)\b(on\s+\d{1,2}(st|nd|rd|th)?\s+\w+\s+\d{4})\b",
                r"(?i)\b(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})\b",
            ]
            .iter()
            .map(|p| compile(p))
            .collect(),
            ordinal_date: compile(r"(?i)^(?:on\s+)?(\d{1,2})(?:st|nd|rd|th)?\s+(\w+)\s+(\d{4})$"),
        }
    })
}

pub fn has_meeting_intent(text: &str) -> bool {
    let lower = text.to_lowercase();
    if patterns().past_tense.is_match(&lower) {
        return false;
    }
    MEETING_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Collect time hints in pattern order, then the concrete dates implied by
/// relative day words.
pub fn extract_time_info(text: &str, now: DateTime<Utc>) -> Vec<String> {
    let mut hints: Vec<String> = patterns()
        .time_hints
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
        .collect();

    let lower = text.to_lowercase();
    let day = |offset: i64| (now + Duration::days(offset)).format("%Y-%m-%d").to_string();
    if lower.contains("day after tomorrow") {
        hints.push(day(2));
    }
    if lower.contains("tomorrow") {
        hints.push(day(1));
    }
    if lower.contains("today") {
        hints.push(day(0));
    }

    hints
}

/// Four slots on the first hinted day that lies in the future, or on the
/// next weekday when no hint qualifies.
pub fn suggest_times(hints: &[String], now: DateTime<Utc>) -> Vec<String> {
    let day = hints
        .iter()
        .filter_map(|hint| parse_hint(hint, now))
        .find(|t| *t > now)
        .map(|t| t.date_naive())
        .unwrap_or_else(|| next_weekday(now));

    let midnight = Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN));
    SUGGESTED_HOURS
        .iter()
        .map(|h| (midnight + Duration::hours(*h)).to_rfc3339())
        .collect()
}

pub fn analyze(text: &str, now: DateTime<Utc>) -> IntentAnalysis {
    let has_meeting_intent = has_meeting_intent(text);
    let time_info = if has_meeting_intent {
        extract_time_info(text, now)
    } else {
        Vec::new()
    };
    let suggested_times = suggest_times(&time_info, now);

    IntentAnalysis {
        has_meeting_intent,
        time_info,
        suggested_times,
    }
}

fn next_weekday(now: DateTime<Utc>) -> NaiveDate {
    let day = (now + Duration::days(1)).date_naive();
    match day.weekday() {
        Weekday::Sat => day + Duration::days(2),
        Weekday::Sun => day + Duration::days(1),
        _ => day,
    }
}

/// Best-effort interpretation of one hint as a UTC instant. Clock times are
/// taken on the current day; day-first numeric dates.
fn parse_hint(hint: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let hint = hint.trim();

    if let Ok(date) = NaiveDate::parse_from_str(hint, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }

    for fmt in ["%d/%m/%Y", "%d-%m-%Y", "%d/%m/%y", "%d-%m-%y"] {
        if let Ok(date) = NaiveDate::parse_from_str(hint, fmt) {
            return Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
        }
    }

    if let Some(caps) = patterns().ordinal_date.captures(hint) {
        let normalized = format!("{} {} {}", &caps[1], &caps[2], &caps[3]);
        for fmt in ["%d %B %Y", "%d %b %Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(&normalized, fmt) {
                return Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
            }
        }
    }

    // "10.30 am" -> "10:30AM", "3 pm" -> "3:00PM"
    let clock: String = hint
        .to_uppercase()
        .replace('.', ":")
        .split_whitespace()
        .collect();
    let suffix = ["AM", "PM"]
        .into_iter()
        .find_map(|s| clock.strip_suffix(s).map(|hour| (hour, s)));
    let clock = match suffix {
        Some((hour, s)) if !hour.contains(':') => format!("{hour}:00{s}"),
        _ => clock,
    };
    NaiveTime::parse_from_str(&clock, "%I:%M%p")
        .ok()
        .map(|time| Utc.from_utc_datetime(&now.date_naive().and_time(time)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        // A Wednesday.
        Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_keywords_flag_intent() {
        assert!(has_meeting_intent("Let's meet tomorrow"));
        assert!(has_meeting_intent("Can we SYNC UP later?"));
        assert!(!has_meeting_intent("lunch was great"));
    }

    #[test]
    fn test_past_tense_is_not_intent() {
        assert!(!has_meeting_intent("we should have had a meeting"));
        assert!(!has_meeting_intent("It was a good meeting"));
    }

    #[test]
    fn test_extract_relative_and_clock_hints() {
        let hints = extract_time_info("call tomorrow at 10:30 am", now());
        assert_eq!(hints, vec!["tomorrow", "10:30 am", "30 am", "2026-10-15"]);
    }

    #[test]
    fn test_suggestions_follow_first_future_hint() {
        let hints = vec!["today".to_string(), "2026-10-20".to_string()];
        let slots = suggest_times(&hints, now());
        assert_eq!(
            slots,
            vec![
                "2026-10-20T09:00:00+00:00",
                "2026-10-20T11:00:00+00:00",
                "2026-10-20T14:00:00+00:00",
                "2026-10-20T16:00:00+00:00",
            ]
        );
    }

    #[test]
    fn test_suggestions_parse_ordinal_and_numeric_dates() {
        let ordinal = suggest_times(&["on 5th November 2026".to_string()], now());
        assert!(ordinal[0].starts_with("2026-11-05T09:00"));

        let numeric = suggest_times(&["03/12/2026".to_string()], now());
        assert!(numeric[0].starts_with("2026-12-03T09:00"));
    }

    #[test]
    fn test_clock_hint_means_today() {
        let slots = suggest_times(&["3 pm".to_string()], now());
        assert!(slots[0].starts_with("2026-10-14T09:00"));

        // Already past: falls through to the next weekday.
        let slots = suggest_times(&["9.15 am".to_string()], now());
        assert!(slots[0].starts_with("2026-10-15T09:00"));
    }

    #[test]
    fn test_fallback_skips_weekend() {
        // Friday -> Saturday -> pushed to Monday.
        let friday = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let slots = suggest_times(&[], friday);
        assert!(slots[0].starts_with("2026-10-19T09:00"));

        let slots = suggest_times(&[], now());
        assert!(slots[0].starts_with("2026-10-15T09:00"));
    }

    #[test]
    fn test_analyze_without_intent_has_no_hints() {
        let analysis = analyze("see you tomorrow", now());
        assert!(!analysis.has_meeting_intent);
        assert!(analysis.time_info.is_empty());
        assert_eq!(analysis.suggested_times.len(), 4);
    }
}
