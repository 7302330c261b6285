use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;

use crate::db::migrations::MigrationManager;

/// Environment variable that overrides the database location.
pub const DB_ENV_VAR: &str = "STINT_DB";

/// Every request to the engine is bounded so a locked database cannot hang
/// the process indefinitely.
const BUSY_TIMEOUT: Duration = Duration::from_secs(3);

/// Database connection manager
pub struct Db;

impl Db {
    /// Get the default database path (`<config dir>/stint.db`)
    pub fn default_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("stint.db")
    }

    /// Resolve the database path from `STINT_DB` or fall back to the default
    pub fn resolve_path() -> PathBuf {
        match std::env::var(DB_ENV_VAR) {
            Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
            _ => Self::default_path(),
        }
    }

    /// Connect to the database, creating it and parent directories if needed
    pub fn connect() -> Result<Connection> {
        let db_path = Self::resolve_path();
        log::debug!("opening database at {}", db_path.display());

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

        conn.busy_timeout(BUSY_TIMEOUT)
            .context("Failed to set database busy timeout")?;

        MigrationManager::initialize(&conn)
            .context("Failed to initialize database schema")?;

        Ok(conn)
    }

    /// Connect to an in-memory database (for testing)
    pub fn connect_in_memory() -> Result<Connection> {
        let conn = Connection::open_in_memory()
            .context("Failed to open in-memory database")?;

        MigrationManager::initialize(&conn)
            .context("Failed to initialize database schema")?;

        Ok(conn)
    }
}
