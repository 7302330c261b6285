//! JSON wire format: an array of entries with lower-cased keys.
//!
//! `id` and `running` never cross this boundary, so a JSON round trip
//! deliberately produces fresh identities and no running state. Empty
//! optional fields are omitted on export.

use crate::error::CoreError;
use crate::models::Entry;

pub fn entries_to_json(entries: &[Entry]) -> Result<String, CoreError> {
    serde_json::to_string_pretty(entries)
        .map_err(|e| CoreError::Validation(format!("could not encode entries as JSON: {}", e)))
}

/// Decode a JSON export. Imported entries carry no id, are never running,
/// and have `date` re-derived from `begin`; the first invalid element stops
/// the import and is named by its 1-based position.
pub fn entries_from_json(text: &str) -> Result<Vec<Entry>, CoreError> {
    let mut entries: Vec<Entry> = serde_json::from_str(text)
        .map_err(|e| CoreError::Validation(format!("could not decode JSON entries: {}", e)))?;

    for (index, entry) in entries.iter_mut().enumerate() {
        let position = index + 1;
        if entry.project.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "JSON entry {}: project cannot be empty",
                position
            )));
        }
        if entry.task.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "JSON entry {}: task cannot be empty",
                position
            )));
        }
        entry.id = None;
        entry.running = false;
        entry.derive_date();
    }

    Ok(entries)
}
