//! In-memory entry filtering for listing and exporting.
//!
//! Pure and deterministic: no I/O, and input order is preserved (a stable
//! filter, never a sort). Project and task predicates compare normalized
//! identifier forms, so "Deep Work" matches "deep   work".

use chrono::{DateTime, Utc};

use crate::models::Entry;

/// Whether an `until` bound excludes an entry that is still running (no
/// finish to compare against). Made explicit because either reading is
/// defensible; `Keep` treats a running entry as "still open".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunningUnderUntil {
    #[default]
    Keep,
    Exclude,
}

/// Predicates applied over an in-memory entry collection. Unset fields
/// impose no constraint.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub project: Option<String>,
    pub task: Option<String>,
    /// Entries beginning strictly before this are dropped; an entry
    /// beginning exactly at the bound is kept.
    pub since: Option<DateTime<Utc>>,
    /// Entries finishing strictly after this are dropped; an entry
    /// finishing exactly at the bound is kept.
    pub until: Option<DateTime<Utc>>,
    pub running_under_until: RunningUnderUntil,
}

/// Case/whitespace-canonical form of a free-text label, used for equality
/// comparison in filters.
pub fn normalize_ident(name: &str) -> String {
    name.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
}

/// Apply the filter, keeping input order.
pub fn filter_entries(entries: &[Entry], filter: &EntryFilter) -> Vec<Entry> {
    entries
        .iter()
        .filter(|entry| matches(entry, filter))
        .cloned()
        .collect()
}

fn matches(entry: &Entry, filter: &EntryFilter) -> bool {
    if let Some(project) = &filter.project {
        if normalize_ident(&entry.project) != normalize_ident(project) {
            return false;
        }
    }
    if let Some(task) = &filter.task {
        if normalize_ident(&entry.task) != normalize_ident(task) {
            return false;
        }
    }
    if let Some(since) = filter.since {
        if entry.begin < since {
            return false;
        }
    }
    if let Some(until) = filter.until {
        match entry.finish {
            Some(finish) => {
                if finish > until {
                    return false;
                }
            }
            None => {
                if filter.running_under_until == RunningUnderUntil::Exclude {
                    return false;
                }
            }
        }
    }
    true
}
