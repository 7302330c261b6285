//! CSV wire format: a fixed 7-column row per entry.
//!
//! Column order is `date, begin, finish, project, task, hours, notes`, with a
//! required header row. The delimiter is one configurable character and
//! defaults to ';' in both directions. Encoding is quote-aware (quotes are
//! doubled; fields containing the delimiter, a quote, or a newline are
//! quoted) because notes may embed newlines.

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::models::Entry;
use crate::utils::time::{fmt_hours, parse_flexible_time, HoursFormat};

/// Importable column set.
pub const CSV_HEADER_ALL: [&str; 7] = ["date", "begin", "finish", "project", "task", "hours", "notes"];

/// Spreadsheet-friendly short column set; not importable.
pub const CSV_HEADER_SHORT: [&str; 4] = ["date", "project", "task", "hours"];

/// Delimiter used when the caller does not override it.
pub const DEFAULT_DELIMITER: char = ';';

/// Render entries as CSV text.
///
/// With `all_fields` the full importable row is written and hours are always
/// plain decimals so the file round-trips. The short form renders hours in
/// the caller's display format instead.
pub fn entries_to_csv(
    entries: &[Entry],
    delimiter: char,
    all_fields: bool,
    hours_format: HoursFormat,
) -> String {
    let mut out = String::new();

    let header: &[&str] = if all_fields { &CSV_HEADER_ALL } else { &CSV_HEADER_SHORT };
    push_record(&mut out, header.iter().map(|h| (*h).to_string()), delimiter);

    for entry in entries {
        let fields: Vec<String> = if all_fields {
            vec![
                entry.date.clone(),
                entry.begin_store_string(),
                entry.finish_store_string().unwrap_or_default(),
                entry.project.clone(),
                entry.task.clone(),
                format!("{:.2}", entry.hours),
                entry.notes.clone(),
            ]
        } else {
            vec![
                entry.date.clone(),
                entry.project.clone(),
                entry.task.clone(),
                fmt_hours(entry.hours, hours_format),
            ]
        };
        push_record(&mut out, fields.into_iter(), delimiter);
    }

    out
}

/// Decode a full-field CSV file back into entries.
///
/// Processing stops at the first bad row; the error names the 1-based data
/// row and the expected column order. Imported entries carry no id and are
/// never running; `date` is re-derived from `begin`.
pub fn entries_from_csv(
    text: &str,
    delimiter: char,
    now: DateTime<Utc>,
) -> Result<Vec<Entry>, CoreError> {
    let records = parse_records(text, delimiter)?;
    let mut rows = records.into_iter();

    let header = rows
        .next()
        .ok_or_else(|| CoreError::Validation("CSV input is empty; expected a header row".to_string()))?;
    let normalized: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
    if normalized != CSV_HEADER_ALL {
        return Err(CoreError::Validation(format!(
            "CSV header must be: {}",
            CSV_HEADER_ALL.join(", ")
        )));
    }

    let mut entries = Vec::new();
    for (index, row) in rows.enumerate() {
        let row_number = index + 1;
        if row.len() != CSV_HEADER_ALL.len() {
            return Err(CoreError::Validation(format!(
                "CSV row {}: expected {} fields in the order {}, got {}",
                row_number,
                CSV_HEADER_ALL.len(),
                CSV_HEADER_ALL.join(", "),
                row.len()
            )));
        }

        let begin = parse_flexible_time(&row[1], now)
            .map_err(|e| CoreError::Validation(format!("CSV row {}: {}", row_number, e)))?;
        let finish = if row[2].trim().is_empty() {
            None
        } else {
            Some(
                parse_flexible_time(&row[2], now)
                    .map_err(|e| CoreError::Validation(format!("CSV row {}: {}", row_number, e)))?,
            )
        };

        if row[3].trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "CSV row {}: project cannot be empty",
                row_number
            )));
        }
        if row[4].trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "CSV row {}: task cannot be empty",
                row_number
            )));
        }

        let hours: f64 = row[5].trim().parse().map_err(|_| {
            CoreError::Validation(format!(
                "CSV row {}: could not parse hours '{}'",
                row_number, row[5]
            ))
        })?;

        let mut entry = Entry {
            id: None,
            date: String::new(),
            begin,
            finish,
            project: row[3].trim().to_string(),
            task: row[4].trim().to_string(),
            hours,
            notes: row[6].clone(),
            running: false,
        };
        entry.derive_date();
        entries.push(entry);
    }

    Ok(entries)
}

fn push_record(out: &mut String, fields: impl Iterator<Item = String>, delimiter: char) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(delimiter);
        }
        out.push_str(&escape_field(&field, delimiter));
        first = false;
    }
    out.push('\n');
}

fn escape_field(field: &str, delimiter: char) -> String {
    let needs_quote = field.contains(delimiter)
        || field.contains('"')
        || field.contains('\n')
        || field.contains('\r');
    if !needs_quote {
        return field.to_string();
    }
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Split CSV text into records, honoring quoted fields with embedded
/// delimiters, doubled quotes, and newlines. Blank lines are skipped.
fn parse_records(text: &str, delimiter: char) -> Result<Vec<Vec<String>>, CoreError> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else if c == '"' && field.is_empty() {
            in_quotes = true;
        } else if c == delimiter {
            record.push(std::mem::take(&mut field));
        } else if c == '\n' || c == '\r' {
            if c == '\r' && chars.peek() == Some(&'\n') {
                chars.next();
            }
            record.push(std::mem::take(&mut field));
            if record.len() > 1 || !record[0].is_empty() {
                records.push(std::mem::take(&mut record));
            } else {
                record.clear();
            }
        } else {
            field.push(c);
        }
    }

    if in_quotes {
        return Err(CoreError::Validation(
            "unterminated quoted field in CSV input".to_string(),
        ));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    Ok(records)
}
