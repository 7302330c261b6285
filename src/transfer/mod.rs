// Import/export adapters between the Entry record and the CSV/JSON wire
// formats. Import always assigns fresh ids by delegating to the store.

pub mod csv;
pub mod json;

pub use csv::*;
pub use json::*;

use rusqlite::Connection;

use crate::error::CoreError;
use crate::models::Entry;
use crate::repo::EntryRepo;

/// Insert decoded entries into the store, stopping at the first failure and
/// naming its 1-based position.
pub fn import_into_store(conn: &Connection, entries: Vec<Entry>) -> Result<usize, CoreError> {
    let mut imported = 0;
    for (index, mut entry) in entries.into_iter().enumerate() {
        EntryRepo::insert(conn, &mut entry, false).map_err(|e| match e {
            CoreError::Validation(msg) => {
                CoreError::Validation(format!("entry {}: {}", index + 1, msg))
            }
            other => other,
        })?;
        imported += 1;
    }
    log::debug!("imported {} entries", imported);
    Ok(imported)
}
