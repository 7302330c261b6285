use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::CoreError;
use crate::models::{Entry, GroupedEntry, TimeWindow};
use crate::utils::time::STORE_TIME_FORMAT;

const ENTRY_COLUMNS: &str = "id, date, start, finish, hours, project, task, notes, running";

/// Entry repository: the sole reader/writer of durable state.
///
/// Every statement uses parameter binding; user-editable fields (project,
/// task, notes) never reach the query text. Each method is a single bounded
/// request to the engine.
pub struct EntryRepo;

impl EntryRepo {
    /// Insert a fully-formed entry and assign its generated id.
    ///
    /// Marking the new row running while another running row exists trips
    /// the partial unique index; that surfaces as a validation error rather
    /// than a bare constraint failure.
    pub fn insert(conn: &Connection, entry: &mut Entry, running: bool) -> Result<i64, CoreError> {
        conn.execute(
            "INSERT INTO entries (date, start, finish, hours, project, task, notes, running)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.date,
                entry.begin_store_string(),
                entry.finish_store_string(),
                entry.hours,
                entry.project,
                entry.task,
                entry.notes,
                running,
            ],
        )
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint") {
                CoreError::Validation(
                    "an entry is already running; finish it before starting a new one".to_string(),
                )
            } else {
                CoreError::store("insert entry")(e)
            }
        })?;

        let id = conn.last_insert_rowid();
        entry.id = Some(id);
        entry.running = running;
        Ok(id)
    }

    /// Rewrite every column of an existing entry. A missing id is surfaced,
    /// never a silent no-op.
    pub fn update(conn: &Connection, entry: &Entry) -> Result<(), CoreError> {
        let id = entry
            .id
            .ok_or_else(|| CoreError::Validation("entry has no id; insert it first".to_string()))?;

        let changed = conn
            .execute(
                "UPDATE entries
                 SET date = ?1, start = ?2, finish = ?3, hours = ?4,
                     project = ?5, task = ?6, notes = ?7, running = ?8
                 WHERE id = ?9",
                params![
                    entry.date,
                    entry.begin_store_string(),
                    entry.finish_store_string(),
                    entry.hours,
                    entry.project,
                    entry.task,
                    entry.notes,
                    entry.running,
                    id,
                ],
            )
            .map_err(CoreError::store("update entry"))?;

        if changed == 0 {
            return Err(CoreError::NotFound(format!("entry {}", id)));
        }
        Ok(())
    }

    /// Delete an entry outright; no soft-delete or history is kept.
    pub fn delete(conn: &Connection, id: i64) -> Result<(), CoreError> {
        let changed = conn
            .execute("DELETE FROM entries WHERE id = ?1", params![id])
            .map_err(CoreError::store("delete entry"))?;
        if changed == 0 {
            return Err(CoreError::NotFound(format!("entry {}", id)));
        }
        Ok(())
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Entry, CoreError> {
        let query = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1");
        conn.query_row(&query, params![id], row_to_entry)
            .optional()
            .map_err(CoreError::store("get entry"))?
            .ok_or_else(|| CoreError::NotFound(format!("entry {}", id)))
    }

    /// The single running entry, if any.
    ///
    /// `Ok(None)` is the normal "not tracking" state. More than one running
    /// row means the store invariant is corrupted; that is fatal and never
    /// resolved by silently picking a row.
    pub fn get_running(conn: &Connection) -> Result<Option<Entry>, CoreError> {
        let query = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE running = 1");
        let mut stmt = conn.prepare(&query).map_err(CoreError::store("get running entry"))?;
        let mut running: Vec<Entry> = stmt
            .query_map([], row_to_entry)
            .map_err(CoreError::store("get running entry"))?
            .collect::<Result<_, _>>()
            .map_err(CoreError::store("get running entry"))?;

        match running.len() {
            0 => Ok(None),
            1 => Ok(running.pop()),
            n => Err(CoreError::InvariantViolation(format!(
                "{} entries are marked running; at most one may be",
                n
            ))),
        }
    }

    pub fn list_all(conn: &Connection) -> Result<Vec<Entry>, CoreError> {
        Self::query_entries(conn, &format!("SELECT {ENTRY_COLUMNS} FROM entries"), params![])
    }

    pub fn list_all_ordered_by_start(conn: &Connection) -> Result<Vec<Entry>, CoreError> {
        Self::query_entries(
            conn,
            &format!("SELECT {ENTRY_COLUMNS} FROM entries ORDER BY start ASC"),
            params![],
        )
    }

    pub fn list_by_project(conn: &Connection, project: &str) -> Result<Vec<Entry>, CoreError> {
        Self::query_entries(
            conn,
            &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE project = ?1"),
            params![project],
        )
    }

    pub fn list_unique_projects(conn: &Connection) -> Result<Vec<String>, CoreError> {
        let mut stmt = conn
            .prepare("SELECT DISTINCT project FROM entries ORDER BY project ASC")
            .map_err(CoreError::store("list projects"))?;
        let projects = stmt
            .query_map([], |row| row.get(0))
            .map_err(CoreError::store("list projects"))?
            .collect::<Result<_, _>>()
            .map_err(CoreError::store("list projects"))?;
        Ok(projects)
    }

    /// Persist the finish of the entry's stored row: finish time, recomputed
    /// hours, and the running flag cleared, in one statement.
    pub fn finish_running(conn: &Connection, entry: &Entry) -> Result<(), CoreError> {
        let id = entry
            .id
            .ok_or_else(|| CoreError::Validation("entry has no id; insert it first".to_string()))?;
        let finish = entry.finish_store_string().ok_or_else(|| {
            CoreError::Validation("entry has no finish time to record".to_string())
        })?;

        let changed = conn
            .execute(
                "UPDATE entries SET finish = ?1, hours = ?2, notes = ?3, running = 0 WHERE id = ?4",
                params![finish, entry.hours, entry.notes, id],
            )
            .map_err(CoreError::store("finish entry"))?;
        if changed == 0 {
            return Err(CoreError::NotFound(format!("entry {}", id)));
        }
        Ok(())
    }

    /// Summed hours per calendar date inside the window, ascending by date.
    pub fn group_by_day(conn: &Connection, window: &TimeWindow) -> Result<Vec<GroupedEntry>, CoreError> {
        Self::query_grouped(
            conn,
            "SELECT date, SUM(hours) FROM entries
             WHERE start >= ?1 AND start <= ?2
             GROUP BY date
             ORDER BY date ASC",
            window,
            "group entries by day",
        )
    }

    /// Summed hours per week number inside the window.
    pub fn group_by_week(conn: &Connection, window: &TimeWindow) -> Result<Vec<GroupedEntry>, CoreError> {
        Self::query_grouped(
            conn,
            "SELECT strftime('%W', start) AS week, SUM(hours) FROM entries
             WHERE start >= ?1 AND start <= ?2
             GROUP BY week
             ORDER BY week ASC",
            window,
            "group entries by week",
        )
    }

    /// Summed hours per month number inside the window.
    pub fn group_by_month(conn: &Connection, window: &TimeWindow) -> Result<Vec<GroupedEntry>, CoreError> {
        Self::query_grouped(
            conn,
            "SELECT strftime('%m', start) AS month, SUM(hours) FROM entries
             WHERE start >= ?1 AND start <= ?2
             GROUP BY month
             ORDER BY month ASC",
            window,
            "group entries by month",
        )
    }

    fn query_entries(
        conn: &Connection,
        query: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Entry>, CoreError> {
        let mut stmt = conn.prepare(query).map_err(CoreError::store("list entries"))?;
        let entries = stmt
            .query_map(params, row_to_entry)
            .map_err(CoreError::store("list entries"))?
            .collect::<Result<_, _>>()
            .map_err(CoreError::store("list entries"))?;
        Ok(entries)
    }

    fn query_grouped(
        conn: &Connection,
        query: &str,
        window: &TimeWindow,
        op: &'static str,
    ) -> Result<Vec<GroupedEntry>, CoreError> {
        let (since, until) = window.store_bounds();
        let mut stmt = conn.prepare(query).map_err(CoreError::store(op))?;
        let grouped = stmt
            .query_map(params![since, until], |row| {
                Ok(GroupedEntry {
                    key: row.get(0)?,
                    hours: row.get(1)?,
                })
            })
            .map_err(CoreError::store(op))?
            .collect::<Result<_, _>>()
            .map_err(CoreError::store(op))?;
        Ok(grouped)
    }
}

fn row_to_entry(row: &Row) -> rusqlite::Result<Entry> {
    let begin: String = row.get(2)?;
    let finish: Option<String> = row.get(3)?;
    Ok(Entry {
        id: Some(row.get(0)?),
        date: row.get(1)?,
        begin: parse_store_timestamp(2, &begin)?,
        finish: match finish.as_deref() {
            None | Some("") => None,
            Some(text) => Some(parse_store_timestamp(3, text)?),
        },
        hours: row.get(4)?,
        project: row.get(5)?,
        task: row.get(6)?,
        notes: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        running: row.get(8)?,
    })
}

fn parse_store_timestamp(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, STORE_TIME_FORMAT)
        .map(|ndt| Utc.from_utc_datetime(&ndt))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
