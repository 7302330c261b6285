// Flexible time parsing and hour formatting
//
// All timestamps are UTC; the store persists them as "%Y-%m-%d %H:%M:%S" text
// so lexicographic comparison in SQL matches time order.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};

use crate::error::CoreError;

/// Format used for timestamps in the entries table.
pub const STORE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format used for the derived `date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const EXPECTED_TIME_FORMS: &str =
    "a time like '16:00' or '4:00PM', a date like '2024-10-21', a datetime like \
     '2024-10-21 16:00', or an offset from now like '-0:15' or '+1.50'";

/// How tracked hours are rendered.
///
/// `Decimal` prints fixed two-decimal hours ("1.50"). `HoursMinutes` prints
/// whole hours, a comma, then the minutes as a two-digit field ("1,30" is
/// 1h30m) -- the fractional part is scaled by 0.6 so that minutes survive the
/// decimal encoding. Kept bit-for-bit compatible with existing exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoursFormat {
    #[default]
    Decimal,
    HoursMinutes,
}

/// Drop seconds and sub-second precision from a timestamp.
///
/// Entries historically record begin/finish at minute width; everything that
/// stamps "now" goes through here first.
pub fn truncate_to_minute(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Parse free-form date/time text into an absolute UTC timestamp.
///
/// Accepted forms:
/// - `16:00` / `4:00PM` -- a clock time on the reference date
/// - `2024-10-21` -- midnight of that date
/// - `2024-10-21 16:00[:05]` / `2024-10-21T16:00[:05]` / RFC 3339
/// - `+H:MM` / `-H:MM` -- offset from the reference instant
/// - `+H.FF` / `-H.FF` -- offset from the reference instant in decimal hours
///
/// Unrecognized input is a `Parse` error; callers surface it rather than
/// silently defaulting.
pub fn parse_flexible_time(input: &str, reference: DateTime<Utc>) -> Result<DateTime<Utc>, CoreError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(parse_error(input));
    }

    if let Some(rest) = trimmed.strip_prefix('+') {
        return parse_offset(rest, input).map(|d| reference + d);
    }
    if let Some(rest) = trimmed.strip_prefix('-') {
        return parse_offset(rest, input).map(|d| reference - d);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }

    if let Ok(time) = NaiveTime::parse_from_str(trimmed, "%H:%M") {
        return Ok(Utc.from_utc_datetime(&reference.date_naive().and_time(time)));
    }

    // 4:00PM / 4:00pm
    if let Ok(time) = NaiveTime::parse_from_str(&trimmed.to_uppercase(), "%I:%M%p") {
        return Ok(Utc.from_utc_datetime(&reference.date_naive().and_time(time)));
    }

    Err(parse_error(input))
}

fn parse_error(input: &str) -> CoreError {
    CoreError::Parse {
        input: input.to_string(),
        expected: EXPECTED_TIME_FORMS,
    }
}

/// Parse the magnitude of a relative offset: either `H:MM` or decimal hours.
fn parse_offset(magnitude: &str, original: &str) -> Result<Duration, CoreError> {
    if let Some((hours, minutes)) = magnitude.split_once(':') {
        let h: i64 = hours.parse().map_err(|_| parse_error(original))?;
        let m: i64 = minutes.parse().map_err(|_| parse_error(original))?;
        if m >= 60 {
            return Err(parse_error(original));
        }
        return Ok(Duration::minutes(h * 60 + m));
    }
    let hours: f64 = magnitude.parse().map_err(|_| parse_error(original))?;
    if !hours.is_finite() || hours < 0.0 {
        return Err(parse_error(original));
    }
    Ok(Duration::seconds((hours * 3600.0).round() as i64))
}

/// Render an hour quantity in the selected format.
pub fn fmt_hours(hours: f64, format: HoursFormat) -> String {
    match format {
        HoursFormat::Decimal => format!("{:.2}", hours),
        HoursFormat::HoursMinutes => {
            let whole = hours.floor();
            // The 1e-9 nudge keeps e.g. 8.1h from flooring to 5 minutes.
            let minutes = ((hours - whole) * 60.0 + 1e-9).floor() as i64;
            format!("{},{:02}", whole as i64, minutes)
        }
    }
}

/// Invert `fmt_hours` within the two-decimal precision of the encoding.
pub fn parse_hours(text: &str, format: HoursFormat) -> Result<f64, CoreError> {
    let trimmed = text.trim();
    match format {
        HoursFormat::Decimal => trimmed.parse::<f64>().map_err(|_| CoreError::Parse {
            input: text.to_string(),
            expected: "decimal hours such as '1.50'",
        }),
        HoursFormat::HoursMinutes => {
            let (whole, minutes) = trimmed.split_once(',').ok_or_else(|| CoreError::Parse {
                input: text.to_string(),
                expected: "hours and minutes such as '1,30'",
            })?;
            let h: i64 = whole.parse().map_err(|_| CoreError::Parse {
                input: text.to_string(),
                expected: "hours and minutes such as '1,30'",
            })?;
            let m: i64 = minutes.parse().map_err(|_| CoreError::Parse {
                input: text.to_string(),
                expected: "hours and minutes such as '1,30'",
            })?;
            if !(0..60).contains(&m) {
                return Err(CoreError::Parse {
                    input: text.to_string(),
                    expected: "minutes between 00 and 59",
                });
            }
            Ok(h as f64 + m as f64 / 60.0)
        }
    }
}
