//! Compact `YYYYMMDD` calendar helpers shared by the parser and the stores.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Month};

const COMPACT_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year][month][day]");

/// Parses a strict 8-digit `YYYYMMDD` date.
pub fn parse_yyyymmdd(input: &str) -> Option<Date> {
    if input.len() != 8 || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Date::parse(input, COMPACT_DATE).ok()
}

pub fn format_yyyymmdd(date: Date) -> String {
    // A calendar date carries every component the description asks for.
    date.format(COMPACT_DATE).unwrap_or_default()
}

pub fn last_day_of_month(year: i32, month: Month) -> Option<Date> {
    let days = time::util::days_in_year_month(year, month);
    Date::from_calendar_date(year, month, days).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compact_date() {
        let date = parse_yyyymmdd("20240229").expect("leap day");
        assert_eq!(format_yyyymmdd(date), "20240229");
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(parse_yyyymmdd("2024-01-01").is_none());
        assert!(parse_yyyymmdd("20230229").is_none());
        assert!(parse_yyyymmdd("2024011").is_none());
        assert!(parse_yyyymmdd("20241301").is_none());
        assert!(parse_yyyymmdd("+2024010").is_none());
        assert!(parse_yyyymmdd("20240100").is_none());
    }

    #[test]
    fn formats_with_zero_padding() {
        let date = Date::from_calendar_date(987, Month::March, 5).expect("valid");
        assert_eq!(format_yyyymmdd(date), "09870305");
        assert_eq!(parse_yyyymmdd("09870305"), Some(date));
    }

    #[test]
    fn last_day_handles_february() {
        let leap = last_day_of_month(2024, Month::February).expect("valid");
        let common = last_day_of_month(2023, Month::February).expect("valid");
        assert_eq!(leap.day(), 29);
        assert_eq!(common.day(), 28);
    }
}
