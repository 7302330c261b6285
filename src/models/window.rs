use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::utils::time::{DATE_FORMAT, STORE_TIME_FORMAT};

/// Named reporting range, resolved against "now" on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSelector {
    CurrentWeek,
    LastWeek,
    CurrentMonth,
    LastMonth,
    CurrentQuarter,
    CurrentYear,
}

impl WindowSelector {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "current-week" => Some(Self::CurrentWeek),
            "last-week" => Some(Self::LastWeek),
            "current-month" => Some(Self::CurrentMonth),
            "last-month" => Some(Self::LastMonth),
            "current-quarter" => Some(Self::CurrentQuarter),
            "current-year" => Some(Self::CurrentYear),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CurrentWeek => "current-week",
            Self::LastWeek => "last-week",
            Self::CurrentMonth => "current-month",
            Self::LastMonth => "last-month",
            Self::CurrentQuarter => "current-quarter",
            Self::CurrentYear => "current-year",
        }
    }
}

/// The unit aggregation buckets entries into for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl Granularity {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            _ => None,
        }
    }
}

/// A concrete `(since, until)` pair of UTC instants. Ephemeral; recomputed
/// from the reference instant on each view request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl TimeWindow {
    /// Resolve a named selector against a reference instant.
    ///
    /// Conventions, pinned:
    /// - weeks run Monday 00:00 through the following Monday 00:00;
    /// - months run first day 00:00 through the first day of the next month
    ///   (computed, not a 28-31 day table);
    /// - quarters are the fixed calendar quarters;
    /// - the year window is Jan 1 through the reference instant (to-date).
    pub fn compute(selector: WindowSelector, reference: DateTime<Utc>) -> Self {
        let today = reference.date_naive();
        match selector {
            WindowSelector::CurrentWeek => {
                let monday = today - Days::new(u64::from(today.weekday().num_days_from_monday()));
                Self {
                    since: midnight(monday),
                    until: midnight(monday + Days::new(7)),
                }
            }
            WindowSelector::LastWeek => {
                let monday = today - Days::new(u64::from(today.weekday().num_days_from_monday()));
                Self {
                    since: midnight(monday - Days::new(7)),
                    until: midnight(monday),
                }
            }
            WindowSelector::CurrentMonth => Self {
                since: midnight(first_of_month(today.year(), today.month())),
                until: midnight(first_of_next_month(today.year(), today.month())),
            },
            WindowSelector::LastMonth => {
                let (year, month) = if today.month() == 1 {
                    (today.year() - 1, 12)
                } else {
                    (today.year(), today.month() - 1)
                };
                Self {
                    since: midnight(first_of_month(year, month)),
                    until: midnight(first_of_month(today.year(), today.month())),
                }
            }
            WindowSelector::CurrentQuarter => {
                let quarter_start = (today.month() - 1) / 3 * 3 + 1;
                let until = if quarter_start == 10 {
                    first_of_month(today.year() + 1, 1)
                } else {
                    first_of_month(today.year(), quarter_start + 3)
                };
                Self {
                    since: midnight(first_of_month(today.year(), quarter_start)),
                    until: midnight(until),
                }
            }
            WindowSelector::CurrentYear => Self {
                since: midnight(first_of_month(today.year(), 1)),
                until: reference,
            },
        }
    }

    /// Bounds in the store's timestamp representation, for range predicates.
    pub fn store_bounds(&self) -> (String, String) {
        (
            self.since.format(STORE_TIME_FORMAT).to_string(),
            self.until.format(STORE_TIME_FORMAT).to_string(),
        )
    }

    /// Bounds as calendar dates, for user-facing messages.
    pub fn date_bounds(&self) -> (String, String) {
        (
            self.since.format(DATE_FORMAT).to_string(),
            self.until.format(DATE_FORMAT).to_string(),
        )
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    // month is always 1-12 here
    NaiveDate::from_ymd_opt(year, month, 1).expect("valid first of month")
}

fn first_of_next_month(year: i32, month: u32) -> NaiveDate {
    if month == 12 {
        first_of_month(year + 1, 1)
    } else {
        first_of_month(year, month + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wednesday() -> DateTime<Utc> {
        // 2024-10-23 is a Wednesday
        Utc.with_ymd_and_hms(2024, 10, 23, 15, 12, 0).unwrap()
    }

    #[test]
    fn test_current_week_boundaries() {
        let window = TimeWindow::compute(WindowSelector::CurrentWeek, wednesday());
        assert_eq!(window.since, Utc.with_ymd_and_hms(2024, 10, 21, 0, 0, 0).unwrap());
        assert_eq!(window.until, Utc.with_ymd_and_hms(2024, 10, 28, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_current_week_on_monday_and_sunday() {
        let monday = Utc.with_ymd_and_hms(2024, 10, 21, 0, 0, 0).unwrap();
        let window = TimeWindow::compute(WindowSelector::CurrentWeek, monday);
        assert_eq!(window.since, monday);

        let sunday = Utc.with_ymd_and_hms(2024, 10, 27, 23, 59, 0).unwrap();
        let window = TimeWindow::compute(WindowSelector::CurrentWeek, sunday);
        assert_eq!(window.since, Utc.with_ymd_and_hms(2024, 10, 21, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_last_week_boundaries() {
        let window = TimeWindow::compute(WindowSelector::LastWeek, wednesday());
        assert_eq!(window.since, Utc.with_ymd_and_hms(2024, 10, 14, 0, 0, 0).unwrap());
        assert_eq!(window.until, Utc.with_ymd_and_hms(2024, 10, 21, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_current_month_boundaries() {
        let window = TimeWindow::compute(WindowSelector::CurrentMonth, wednesday());
        assert_eq!(window.since, Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap());
        assert_eq!(window.until, Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_month_boundaries_across_year_end() {
        let december = Utc.with_ymd_and_hms(2024, 12, 15, 10, 0, 0).unwrap();
        let window = TimeWindow::compute(WindowSelector::CurrentMonth, december);
        assert_eq!(window.until, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());

        let january = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();
        let window = TimeWindow::compute(WindowSelector::LastMonth, january);
        assert_eq!(window.since, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(window.until, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_february_month_length_is_computed() {
        let leap = Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap();
        let window = TimeWindow::compute(WindowSelector::CurrentMonth, leap);
        assert_eq!(window.until, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_quarter_boundaries() {
        let window = TimeWindow::compute(WindowSelector::CurrentQuarter, wednesday());
        assert_eq!(window.since, Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap());
        assert_eq!(window.until, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());

        let spring = Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap();
        let window = TimeWindow::compute(WindowSelector::CurrentQuarter, spring);
        assert_eq!(window.since, Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap());
        assert_eq!(window.until, Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_year_window_is_to_date() {
        let window = TimeWindow::compute(WindowSelector::CurrentYear, wednesday());
        assert_eq!(window.since, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(window.until, wednesday());
    }

    #[test]
    fn test_selector_names_round_trip() {
        for selector in [
            WindowSelector::CurrentWeek,
            WindowSelector::LastWeek,
            WindowSelector::CurrentMonth,
            WindowSelector::LastMonth,
            WindowSelector::CurrentQuarter,
            WindowSelector::CurrentYear,
        ] {
            assert_eq!(WindowSelector::from_str(selector.as_str()), Some(selector));
        }
        assert_eq!(WindowSelector::from_str("fortnight"), None);
    }
}
