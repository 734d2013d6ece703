use crate::utils::error::{FinderError, Result};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

pub const DEFAULT_DAYS_AGO: u32 = 7;

/// Inclusive range of calendar days (UTC) a record must have been closed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    since: NaiveDate,
    till: NaiveDate,
}

impl DateWindow {
    /// `since` is `today - days_ago`; `till` defaults to `today`.
    pub fn new(days_ago: u32, till: Option<NaiveDate>, today: NaiveDate) -> Result<Self> {
        let since = Self::start(days_ago, today)?;
        let till = till.unwrap_or(today);

        if till < since {
            return Err(FinderError::InvalidDateRange { since, till });
        }

        Ok(Self { since, till })
    }

    /// Like [`DateWindow::new`], but a `till` before `since` pulls `since`
    /// back to `till` instead of failing.
    pub fn clamped(days_ago: u32, till: Option<NaiveDate>, today: NaiveDate) -> Result<Self> {
        let since = Self::start(days_ago, today)?;
        let till = till.unwrap_or(today);

        Ok(Self {
            since: since.min(till),
            till,
        })
    }

    fn start(days_ago: u32, today: NaiveDate) -> Result<NaiveDate> {
        today
            .checked_sub_days(Days::new(u64::from(days_ago)))
            .ok_or_else(|| FinderError::InvalidDate {
                value: format!("{} days before {}", days_ago, today),
            })
    }

    pub fn since(&self) -> NaiveDate {
        self.since
    }

    pub fn till(&self) -> NaiveDate {
        self.till
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        day >= self.since && day <= self.till
    }

    /// Start of the window as epoch seconds, for APIs that take `since=<ts>`.
    pub fn since_timestamp(&self) -> i64 {
        self.since.and_time(NaiveTime::default()).and_utc().timestamp()
    }

    /// Parses `--till`, accepting `YYYY-MM-DD` and `DD.MM.YYYY`.
    pub fn parse_date(value: &str) -> Result<NaiveDate> {
        let trimmed = value.trim();
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d.%m.%Y"))
            .map_err(|_| FinderError::InvalidDate {
                value: value.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_window_defaults_till_to_today() {
        let window = DateWindow::new(7, None, date(2024, 3, 20)).unwrap();
        assert_eq!(window.since(), date(2024, 3, 13));
        assert_eq!(window.till(), date(2024, 3, 20));
    }

    #[test]
    fn test_window_boundaries() {
        let window = DateWindow::new(7, Some(date(2024, 3, 18)), date(2024, 3, 20)).unwrap();

        let on_till = Utc.with_ymd_and_hms(2024, 3, 18, 23, 59, 59).unwrap();
        let on_since = Utc.with_ymd_and_hms(2024, 3, 13, 0, 0, 0).unwrap();
        let day_before_since = Utc.with_ymd_and_hms(2024, 3, 12, 12, 0, 0).unwrap();
        let after_till = Utc.with_ymd_and_hms(2024, 3, 19, 0, 0, 0).unwrap();

        assert!(window.contains(on_till));
        assert!(window.contains(on_since));
        assert!(!window.contains(day_before_since));
        assert!(!window.contains(after_till));
    }

    #[test]
    fn test_till_before_since_is_rejected() {
        let result = DateWindow::new(3, Some(date(2024, 3, 1)), date(2024, 3, 20));
        assert!(matches!(
            result,
            Err(FinderError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_clamped_window_collapses_to_till() {
        let window = DateWindow::clamped(3, Some(date(2024, 3, 1)), date(2024, 3, 20)).unwrap();
        assert_eq!(window.since(), date(2024, 3, 1));
        assert_eq!(window.till(), date(2024, 3, 1));

        let regular = DateWindow::clamped(7, None, date(2024, 3, 20)).unwrap();
        assert_eq!(regular, DateWindow::new(7, None, date(2024, 3, 20)).unwrap());
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(DateWindow::parse_date("2021-12-31").unwrap(), date(2021, 12, 31));
        assert_eq!(DateWindow::parse_date("31.12.2021").unwrap(), date(2021, 12, 31));
        assert!(DateWindow::parse_date("12/31/2021").is_err());
    }

    #[test]
    fn test_since_timestamp_is_midnight_utc() {
        let window = DateWindow::new(0, None, date(2024, 1, 1)).unwrap();
        assert_eq!(window.since_timestamp(), 1_704_067_200);
    }
}
