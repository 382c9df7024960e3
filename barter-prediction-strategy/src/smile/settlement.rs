//! Settlement dates parsed from market text and the noon Eastern Time
//! settlement convention.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::America::New_York;
use regex::Regex;
use std::sync::LazyLock;

/// Markets settle at 12:00 America/New_York on their settlement date.
pub const SETTLEMENT_HOUR_ET: u32 = 12;

const MONTH_PATTERN: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?";

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid ISO date regex"));

static MONTH_DAY_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b{MONTH_PATTERN}\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b"
    ))
    .expect("valid month-day-year regex")
});

static MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b{MONTH_PATTERN}\s+(\d{{1,2}})(?:st|nd|rd|th)?\b"))
        .expect("valid month-day regex")
});

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_ascii_lowercase();
    let month = match prefix.as_str() {
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

/// Extract a settlement date from free text.
///
/// Tried in order: ISO `YYYY-MM-DD`, `Month D[, ]YYYY`, then `Month D`. A
/// date without a year takes the current Eastern year, rolling to the next
/// year once that date's settlement time has passed.
pub fn parse_settlement_date(text: &str, now: DateTime<Utc>) -> Option<NaiveDate> {
    if let Some(captures) = ISO_DATE.captures(text) {
        let date = NaiveDate::from_ymd_opt(
            captures[1].parse().ok()?,
            captures[2].parse().ok()?,
            captures[3].parse().ok()?,
        );
        if date.is_some() {
            return date;
        }
    }

    if let Some(captures) = MONTH_DAY_YEAR.captures(text) {
        let month = month_number(&captures[1])?;
        let day = captures[2].parse().ok()?;
        let year = captures[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let captures = MONTH_DAY.captures(text)?;
    let month = month_number(&captures[1])?;
    let day: u32 = captures[2].parse().ok()?;

    let year = now.with_timezone(&New_York).year();
    let this_year = NaiveDate::from_ymd_opt(year, month, day)?;
    match settlement_time(this_year) {
        Some(settlement) if settlement < now => NaiveDate::from_ymd_opt(year + 1, month, day),
        _ => Some(this_year),
    }
}

/// Remove every recognised date from `text`, leaving other numbers intact.
pub fn strip_dates(text: &str) -> String {
    let text = ISO_DATE.replace_all(text, " ");
    let text = MONTH_DAY_YEAR.replace_all(&text, " ");
    MONTH_DAY.replace_all(&text, " ").into_owned()
}

/// Convert an America/New_York wall-clock time to UTC.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant, and
/// nonexistent times (spring-forward gap) yield `None`.
pub fn eastern_to_utc(local: NaiveDateTime) -> Option<DateTime<Utc>> {
    New_York
        .from_local_datetime(&local)
        .earliest()
        .map(|time| time.with_timezone(&Utc))
}

/// UTC instant of noon Eastern Time on `date`, honouring daylight saving.
pub fn settlement_time(date: NaiveDate) -> Option<DateTime<Utc>> {
    let noon = NaiveTime::from_hms_opt(SETTLEMENT_HOUR_ET, 0, 0)?;
    eastern_to_utc(date.and_time(noon))
}

/// Eastern calendar date of a UTC instant.
pub fn eastern_date(time: DateTime<Utc>) -> NaiveDate {
    time.with_timezone(&New_York).date_naive()
}

/// Whether `now` has reached the trading cutoff `cutoff_minutes` before
/// settlement.
pub fn is_within_cutoff(settlement: DateTime<Utc>, cutoff_minutes: i64, now: DateTime<Utc>) -> bool {
    chrono::Duration::try_minutes(cutoff_minutes)
        .and_then(|cutoff| settlement.checked_sub_signed(cutoff))
        .map_or(true, |cutoff_time| now >= cutoff_time)
}

/// Whole minutes until settlement, negative once passed.
pub fn minutes_until(settlement: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (settlement - now).num_minutes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap()
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_parse_settlement_date() {
        struct TestCase {
            text: &'static str,
            expected: Option<NaiveDate>,
        }

        let now = utc(2025, 1, 10, 15, 0);
        let cases = vec![
            // TC0: ISO date
            TestCase {
                text: "BTC above 100k on 2025-01-15?",
                expected: Some(date(2025, 1, 15)),
            },
            // TC1: abbreviated month with year
            TestCase {
                text: "Bitcoin price on Jan 15, 2025?",
                expected: Some(date(2025, 1, 15)),
            },
            // TC2: full month, ordinal, no comma
            TestCase {
                text: "Bitcoin on February 3rd 2026",
                expected: Some(date(2026, 2, 3)),
            },
            // TC3: no year, still ahead this year
            TestCase {
                text: "Will BTC close above $97,500 on March 7?",
                expected: Some(date(2025, 3, 7)),
            },
            // TC4: no year, already passed, rolls forward
            TestCase {
                text: "BTC on Jan 5",
                expected: Some(date(2026, 1, 5)),
            },
            // TC5: no date at all
            TestCase {
                text: "Bitcoin above $100,000",
                expected: None,
            },
            // TC6: impossible day
            TestCase {
                text: "BTC on Feb 30, 2025",
                expected: None,
            },
        ];

        for (index, test) in cases.into_iter().enumerate() {
            assert_eq!(parse_settlement_date(test.text, now), test.expected, "TC{index} failed");
        }
    }

    #[test]
    fn test_same_day_rolls_only_after_noon_eastern() {
        // 16:00 UTC is 11:00 EST, before settlement
        assert_eq!(
            parse_settlement_date("BTC on Jan 10", utc(2025, 1, 10, 16, 0)),
            Some(date(2025, 1, 10))
        );
        // 17:30 UTC is 12:30 EST, after settlement
        assert_eq!(
            parse_settlement_date("BTC on Jan 10", utc(2025, 1, 10, 17, 30)),
            Some(date(2026, 1, 10))
        );
    }

    #[test]
    fn test_settlement_time_honours_dst() {
        // EST (UTC-5)
        assert_eq!(settlement_time(date(2025, 1, 15)), Some(utc(2025, 1, 15, 17, 0)));
        // EDT (UTC-4)
        assert_eq!(settlement_time(date(2025, 7, 15)), Some(utc(2025, 7, 15, 16, 0)));
        // Spring-forward day, noon is unaffected
        assert_eq!(settlement_time(date(2025, 3, 9)), Some(utc(2025, 3, 9, 16, 0)));
    }

    #[test]
    fn test_eastern_to_utc_gap_and_overlap() {
        let gap = date(2025, 3, 9).and_hms_opt(2, 30, 0).unwrap();
        assert_eq!(eastern_to_utc(gap), None);

        let overlap = date(2025, 11, 2).and_hms_opt(1, 30, 0).unwrap();
        assert_eq!(eastern_to_utc(overlap), Some(utc(2025, 11, 2, 5, 30)));
    }

    #[test]
    fn test_cutoff() {
        let settlement = utc(2025, 1, 15, 17, 0);

        assert!(!is_within_cutoff(settlement, 30, utc(2025, 1, 15, 16, 29)));
        assert!(is_within_cutoff(settlement, 30, utc(2025, 1, 15, 16, 30)));
        assert!(is_within_cutoff(settlement, 30, utc(2025, 1, 15, 18, 0)));
        assert_eq!(minutes_until(settlement, utc(2025, 1, 15, 16, 0)), 60);
    }

    #[test]
    fn test_strip_dates_keeps_other_numbers() {
        let stripped = strip_dates("BTC above 97500 on 2025-01-15 and Jan 15, 2025");
        assert!(stripped.contains("97500"));
        assert!(!stripped.contains("2025"));
        assert!(!stripped.contains("15"));
    }

    #[test]
    fn test_eastern_date() {
        assert_eq!(eastern_date(utc(2025, 1, 16, 3, 0)), date(2025, 1, 15));
    }
}
