// Output formatting utilities

use chrono::{DateTime, Utc};

use crate::models::Entry;
use crate::report::ReportPoint;
use crate::utils::time::{fmt_hours, HoursFormat};

/// Render a filtered listing, one summary line per entry, optionally
/// followed by a summed total of live durations.
pub fn format_entry_list(
    entries: &[Entry],
    now: DateTime<Utc>,
    format: HoursFormat,
    show_total: bool,
) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.summary_line(now, format));
        out.push('\n');
    }
    if show_total {
        let total: f64 = entries.iter().map(|e| e.duration_hours(now)).sum();
        out.push_str(&format!("\nTOTAL: {} h\n", fmt_hours(total, format)));
    }
    out
}

/// Render a report series as aligned label/hours pairs -- the same data a
/// bar-chart view would consume.
pub fn format_report(points: &[ReportPoint], format: HoursFormat) -> String {
    let width = points.iter().map(|p| p.label.len()).max().unwrap_or(0);
    let mut out = String::new();
    for point in points {
        out.push_str(&format!(
            "{:>width$}  {}\n",
            point.label,
            fmt_hours(point.hours, format),
            width = width
        ));
    }
    out
}
