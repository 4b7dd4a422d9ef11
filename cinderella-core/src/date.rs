use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};

/// A calendar date (year, month, day) attached to a directive.
///
/// Dates always render in the ISO `YYYY-MM-DD` form used by Beancount.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Date(NaiveDate);

impl Date {
    /// Builds a date from its parts, returning `None` for dates that do not exist on the
    /// calendar (e.g. 2021-02-29).
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Date)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Moves the date by a (possibly negative) number of days, returning `None` when the
    /// result falls outside the supported calendar range.
    pub fn shifted(self, days: i64) -> Option<Self> {
        let delta = Days::new(days.unsigned_abs());
        if days < 0 {
            self.0.checked_sub_days(delta).map(Date)
        } else {
            self.0.checked_add_days(delta).map(Date)
        }
    }
}

impl From<NaiveDate> for Date {
    fn from(d: NaiveDate) -> Self {
        Date(d)
    }
}

impl From<Date> for NaiveDate {
    fn from(d: Date) -> Self {
        d.0
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for Date {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_from_ymd() {
        let date = Date::from_ymd(2022, 12, 1).unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2022, 12, 1));
        assert_eq!(date.to_string(), "2022-12-01");
    }

    #[test]
    fn test_invalid_dates_are_rejected() {
        assert_eq!(Date::from_ymd(2021, 2, 29), None);
        assert_eq!(Date::from_ymd(2020, 13, 1), None);
        assert_eq!(Date::from_ymd(2020, 12, 32), None);
        assert!(Date::from_ymd(2020, 2, 29).is_some());
    }

    #[test]
    fn test_date_from_chrono() {
        assert_eq!(
            Date::from(NaiveDate::from_ymd_opt(2020, 5, 5).unwrap()),
            "2020-05-05".parse().unwrap()
        );
    }

    #[test]
    fn test_shifted() {
        let date = Date::from_ymd(2022, 12, 31).unwrap();
        assert_eq!(date.shifted(1), Date::from_ymd(2023, 1, 1));
        assert_eq!(date.shifted(-31), Date::from_ymd(2022, 11, 30));
        assert_eq!(date.shifted(0), Some(date));
    }

    #[test]
    fn test_shifted_out_of_range() {
        let date = Date::from_ymd(2022, 12, 1).unwrap();
        assert_eq!(date.shifted(i64::MAX / 1000), None);
        assert_eq!(date.shifted(i64::MIN), None);
        assert_eq!(date.shifted(i64::MAX), None);
    }
}
