//! `"YYYY-MM"` month keys and the calendar arithmetic built on them.
//!
//! Keys are fixed width, so plain string comparison orders them
//! chronologically. Every helper here returns `None` for malformed input
//! instead of failing.

use chrono::{Datelike, Duration, NaiveDate};

/// Formats the month key containing `date`.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Splits a `"YYYY-MM"` key into its year and month.
pub fn parse_month_key(key: &str) -> Option<(i32, u32)> {
    let (year, month) = key.trim().split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some((year, month))
}

/// Number of days (28..=31) in the month identified by `key`.
pub fn month_length(key: &str) -> Option<u32> {
    let (year, month) = parse_month_key(key)?;
    Some(days_in_month(year, month))
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .map(|first_next| (first_next - Duration::days(1)).day())
        .unwrap_or(28)
}

/// Parses a `"YYYY-MM-DD"` transaction date. Trailing time components
/// (`2024-07-05T10:00`) are ignored.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let head = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_lengths_follow_calendar() {
        assert_eq!(month_length("2024-02"), Some(29));
        assert_eq!(month_length("2023-02"), Some(28));
        assert_eq!(month_length("2024-04"), Some(30));
        assert_eq!(month_length("2024-12"), Some(31));
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert_eq!(parse_month_key("2024-13"), None);
        assert_eq!(parse_month_key("2024-7"), None);
        assert_eq!(parse_month_key("July"), None);
        assert_eq!(month_length(""), None);
    }

    #[test]
    fn keys_sort_chronologically() {
        let mut keys = vec!["2024-10", "2023-12", "2024-02"];
        keys.sort();
        assert_eq!(keys, vec!["2023-12", "2024-02", "2024-10"]);
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(month_key(date), "2024-03");
    }

    #[test]
    fn parse_date_ignores_time_suffix() {
        let expected = NaiveDate::from_ymd_opt(2024, 7, 5);
        assert_eq!(parse_date("2024-07-05"), expected);
        assert_eq!(parse_date("2024-07-05T10:00:00Z"), expected);
        assert_eq!(parse_date("05/07/2024"), None);
    }
}
