// Core error taxonomy
//
// Every failure the core can produce is one of these variants; the CLI layer
// converts them to anyhow errors for presentation and decides the exit code.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed time/date/number input from the user or an import file.
    #[error("could not parse '{input}': expected {expected}")]
    Parse {
        input: String,
        expected: &'static str,
    },

    /// Business-rule violation (empty required field, finish before begin,
    /// wrong CSV column count). The offending operation is aborted without
    /// partial writes.
    #[error("{0}")]
    Validation(String),

    /// Lifecycle misuse, e.g. finishing an entry that is already finished.
    #[error("{0}")]
    InvalidState(String),

    /// Requested id or running entry does not exist. "No running entry" is a
    /// normal state and is reported as `Ok(None)` by the store instead.
    #[error("{0} not found")]
    NotFound(String),

    /// Underlying SQLite failure, tagged with the operation that issued it.
    /// Never retried automatically.
    #[error("store operation '{op}' failed")]
    Store {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// More than one running entry detected. Fatal; the caller must halt
    /// rather than guess which entry is "the" running one.
    #[error("store invariant violated: {0}")]
    InvariantViolation(String),

    /// An aggregation window matched no rows. Distinct from a store failure
    /// so the caller can show a user-correctable message.
    #[error("no tracked hours between {since} and {until}")]
    NoData { since: String, until: String },
}

impl CoreError {
    /// Wrap a rusqlite error with the name of the failing store operation.
    pub fn store(op: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::Store { op, source }
    }
}
