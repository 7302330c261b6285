//! Time-window aggregation: turns grouped store rows into a display-ready
//! series for a named reporting window.

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::error::CoreError;
use crate::models::{Granularity, GroupedEntry, TimeWindow, WindowSelector};
use crate::repo::EntryRepo;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// One bar of a report: a human label and the summed hours behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPoint {
    pub label: String,
    pub hours: f64,
}

/// Resolve the window, run the matching aggregation, and label the result.
///
/// An empty grouped result is `NoData` -- a user-correctable condition, kept
/// distinct from store failures so callers can render it gently.
pub fn window_report(
    conn: &Connection,
    selector: WindowSelector,
    granularity: Granularity,
    reference: DateTime<Utc>,
) -> Result<Vec<ReportPoint>, CoreError> {
    let window = TimeWindow::compute(selector, reference);
    let grouped = match granularity {
        Granularity::Day => EntryRepo::group_by_day(conn, &window)?,
        Granularity::Week => EntryRepo::group_by_week(conn, &window)?,
        Granularity::Month => EntryRepo::group_by_month(conn, &window)?,
    };

    if grouped.is_empty() {
        let (since, until) = window.date_bounds();
        return Err(CoreError::NoData { since, until });
    }

    Ok(grouped
        .into_iter()
        .map(|group| label_point(granularity, group))
        .collect())
}

fn label_point(granularity: Granularity, group: GroupedEntry) -> ReportPoint {
    let label = match granularity {
        // "2024-10-21" -> "21"
        Granularity::Day => group.key.get(8..10).unwrap_or(&group.key).to_string(),
        Granularity::Week => match group.key.parse::<u32>() {
            Ok(week) => format!("CW: {}", week),
            Err(_) => format!("CW: {}", group.key),
        },
        Granularity::Month => group
            .key
            .parse::<usize>()
            .ok()
            .and_then(|month| MONTH_NAMES.get(month.wrapping_sub(1)))
            .map_or_else(|| group.key.clone(), |name| (*name).to_string()),
    };
    ReportPoint {
        label,
        hours: group.hours,
    }
}
