use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::utils::time::{fmt_hours, truncate_to_minute, HoursFormat, DATE_FORMAT, STORE_TIME_FORMAT};

/// One tracked unit of work: a task on a project with a time range.
///
/// The store owns the durable copy; every in-memory `Entry` is a disposable
/// snapshot. `id` and `running` are internal and never cross the JSON wire
/// boundary, so a JSON round trip intentionally produces fresh identities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    #[serde(skip)]
    pub id: Option<i64>,
    /// Calendar date derived from `begin`; never independently settable.
    #[serde(default)]
    pub date: String,
    pub begin: DateTime<Utc>,
    /// `None` while the entry is still being tracked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<DateTime<Utc>>,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub task: String,
    /// Derived from `finish - begin`; recomputed whenever either end moves.
    #[serde(default)]
    pub hours: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(skip)]
    pub running: bool,
}

/// Sparse field changes for an edit. Unset fields are left alone.
#[derive(Debug, Default, Clone)]
pub struct EntryPatch {
    pub project: Option<String>,
    pub task: Option<String>,
    pub notes: Option<String>,
    pub begin: Option<DateTime<Utc>>,
    pub finish: Option<DateTime<Utc>>,
}

impl Entry {
    /// Begin tracking a new activity.
    ///
    /// `begin` is stamped from `now` at minute precision, `running` is set,
    /// and `date` is derived from `begin`. Empty project or task is rejected
    /// even though the CLI validates first.
    pub fn start(project: &str, task: &str, now: DateTime<Utc>) -> Result<Self, CoreError> {
        if project.trim().is_empty() {
            return Err(CoreError::Validation("project cannot be empty".to_string()));
        }
        if task.trim().is_empty() {
            return Err(CoreError::Validation("task cannot be empty".to_string()));
        }
        let mut entry = Self {
            id: None,
            date: String::new(),
            begin: truncate_to_minute(now),
            finish: None,
            project: project.trim().to_string(),
            task: task.trim().to_string(),
            hours: 0.0,
            notes: String::new(),
            running: true,
        };
        entry.derive_date();
        Ok(entry)
    }

    /// Stop tracking. Fails with `InvalidState` when the entry is already
    /// finished, leaving `finish` untouched.
    pub fn finish_at(&mut self, now: DateTime<Utc>) -> Result<(), CoreError> {
        if !self.running {
            return Err(CoreError::InvalidState(format!(
                "entry {} is already finished",
                self.id.unwrap_or_default()
            )));
        }
        self.finish = Some(truncate_to_minute(now));
        self.running = false;
        self.recompute_hours(now);
        Ok(())
    }

    /// Apply a sparse edit. Moving `begin` or `finish` recomputes `hours`
    /// and `date`; setting `finish` marks the entry finished.
    pub fn apply(&mut self, patch: EntryPatch, now: DateTime<Utc>) -> Result<(), CoreError> {
        if let Some(project) = patch.project {
            if project.trim().is_empty() {
                return Err(CoreError::Validation("project cannot be empty".to_string()));
            }
            self.project = project.trim().to_string();
        }
        if let Some(task) = patch.task {
            if task.trim().is_empty() {
                return Err(CoreError::Validation("task cannot be empty".to_string()));
            }
            self.task = task.trim().to_string();
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }

        let times_changed = patch.begin.is_some() || patch.finish.is_some();
        if let Some(begin) = patch.begin {
            self.begin = truncate_to_minute(begin);
        }
        if let Some(finish) = patch.finish {
            self.finish = Some(truncate_to_minute(finish));
            self.running = false;
        }
        if times_changed {
            self.derive_date();
            self.recompute_hours(now);
        }
        Ok(())
    }

    /// Finish either unset or strictly after begin. Consulted as a guard
    /// before accepting a manual edit; not enforced automatically.
    pub fn is_well_formed(&self) -> bool {
        self.finish.map_or(true, |finish| finish > self.begin)
    }

    /// Tracked span in hours.
    ///
    /// A running entry measures against `now`. A finish that precedes begin
    /// (clock skew, bad manual edit) also measures against `now`; the result
    /// is never negative.
    pub fn duration_hours(&self, now: DateTime<Utc>) -> f64 {
        let end = self.finish.unwrap_or(now);
        let mut span = end - self.begin;
        if span < Duration::zero() {
            span = now - self.begin;
        }
        span.num_seconds().max(0) as f64 / 3600.0
    }

    /// Refresh the derived `hours` field. Running entries carry 0 until
    /// finished; their live duration comes from `duration_hours`.
    pub fn recompute_hours(&mut self, now: DateTime<Utc>) {
        self.hours = if self.finish.is_some() {
            self.duration_hours(now)
        } else {
            0.0
        };
    }

    /// Refresh the derived `date` field from `begin`.
    pub fn derive_date(&mut self) {
        self.date = self.begin.format(DATE_FORMAT).to_string();
    }

    /// One-line summary used by `list`.
    pub fn summary_line(&self, now: DateTime<Utc>, format: HoursFormat) -> String {
        let (end, marker) = match self.finish {
            Some(finish) => (finish, ""),
            None => (now, " [running]"),
        };
        format!(
            "{} {} on {} from {} to {} ({}h){}",
            self.id.unwrap_or_default(),
            self.task,
            self.project,
            self.begin.format("%Y-%m-%d %H:%M"),
            end.format("%Y-%m-%d %H:%M"),
            fmt_hours(self.duration_hours(now), format),
            marker,
        )
    }

    /// Multi-line form with notes, used by `tracking --full`.
    pub fn detail_block(&self, now: DateTime<Utc>, format: HoursFormat) -> String {
        let (end, marker) = match self.finish {
            Some(finish) => (finish, ""),
            None => (now, " [running]"),
        };
        format!(
            "{}\n   {} on {}\n   {}h from {} to {}{}\n\n   Notes:\n   {}\n",
            self.id.unwrap_or_default(),
            self.task,
            self.project,
            fmt_hours(self.duration_hours(now), format),
            self.begin.format("%Y-%m-%d %H:%M"),
            end.format("%Y-%m-%d %H:%M"),
            marker,
            self.notes.replace('\n', "\n   "),
        )
    }

    /// Confirmation line printed when tracking begins.
    pub fn start_line(&self) -> String {
        format!("started tracking {} on {}", self.task, self.project)
    }

    /// Status line for the currently running entry.
    pub fn tracking_line(&self, now: DateTime<Utc>, format: HoursFormat) -> String {
        format!(
            "tracking {} on {} for {}h",
            self.task,
            self.project,
            fmt_hours(self.duration_hours(now), format)
        )
    }

    /// Confirmation line printed when tracking stops.
    pub fn finish_line(&self, now: DateTime<Utc>, format: HoursFormat) -> String {
        format!(
            "finished tracking {} on {} for {}h",
            self.task,
            self.project,
            fmt_hours(self.duration_hours(now), format)
        )
    }

    /// `begin` in the store's text representation.
    pub fn begin_store_string(&self) -> String {
        self.begin.format(STORE_TIME_FORMAT).to_string()
    }

    /// `finish` in the store's text representation, when set.
    pub fn finish_store_string(&self) -> Option<String> {
        self.finish.map(|f| f.format(STORE_TIME_FORMAT).to_string())
    }
}

/// Aggregation result: a grouping key (date, week number, or month number)
/// paired with summed hours. Produced by read queries, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedEntry {
    pub key: String,
    pub hours: f64,
}
