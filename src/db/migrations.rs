use rusqlite::{Connection, Result};

/// Current database schema version
const CURRENT_VERSION: u32 = 1;

/// Migration system for managing database schema versions
pub struct MigrationManager;

impl MigrationManager {
    /// Initialize the database with the current schema
    /// This creates the schema_version table and applies all migrations
    pub fn initialize(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            [],
        )?;

        let current_version: u32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        for version in (current_version + 1)..=CURRENT_VERSION {
            Self::apply_migration(conn, version)?;
        }

        Ok(())
    }

    /// Apply a specific migration by version number
    fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
        let tx = conn.unchecked_transaction()?;
        match version {
            1 => migration_v1(&tx)?,
            _ => {
                return Err(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_MISUSE),
                    Some(format!("No migration found for version {}", version)),
                ))
            }
        }
        tx.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
        tx.commit()
    }

    /// Get the current schema version
    pub fn get_version(conn: &Connection) -> Result<u32> {
        conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
    }
}

/// Migration v1: the entries table.
///
/// Timestamps are TEXT in '%Y-%m-%d %H:%M:%S' so range predicates compare
/// correctly as strings. The partial unique index is the write-boundary
/// backstop for the single-running-entry invariant.
fn migration_v1(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    tx.execute(
        "CREATE TABLE entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            start TEXT NOT NULL,
            finish TEXT,
            hours NUMERIC,
            project TEXT NOT NULL,
            task TEXT NOT NULL,
            notes TEXT,
            running BOOLEAN NOT NULL DEFAULT 0
        )",
        [],
    )?;

    tx.execute(
        "CREATE UNIQUE INDEX entries_single_running ON entries (running) WHERE running = 1",
        [],
    )?;

    tx.execute("CREATE INDEX entries_start ON entries (start)", [])?;

    Ok(())
}
