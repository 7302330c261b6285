use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::cli::error::validate_entry_id;
use crate::cli::output::{format_entry_list, format_report};
use crate::db::Db;
use crate::error::CoreError;
use crate::filter::{filter_entries, EntryFilter, RunningUnderUntil};
use crate::models::{Entry, EntryPatch, Granularity, WindowSelector};
use crate::repo::EntryRepo;
use crate::report::window_report;
use crate::transfer::{self, DEFAULT_DELIMITER};
use crate::utils::time::{fmt_hours, parse_flexible_time, HoursFormat};

#[derive(Parser)]
#[command(name = "stint")]
#[command(about = "Single-user command-line time tracker")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start tracking an activity
    Track {
        /// Project the activity belongs to
        #[arg(short, long)]
        project: String,
        /// Task being worked on
        #[arg(short, long)]
        task: String,
        /// Activity notes
        #[arg(short, long)]
        notes: Option<String>,
        /// Time the activity began: 16:00, 4:00PM, 2024-10-21 16:00,
        /// or an offset like -0:15 (now minus 15 minutes)
        #[arg(short, long)]
        begin: Option<String>,
        /// Time the activity finished; records an already-closed entry.
        /// Must be after the begin time.
        #[arg(short = 's', long)]
        finish: Option<String>,
    },
    /// Finish the currently running activity
    Finish {
        /// Notes to attach while finishing
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Show the currently running activity
    Tracking {
        /// Show the long form including notes
        #[arg(long)]
        full: bool,
    },
    /// List tracked activities
    List {
        /// Date/time to start the list from
        #[arg(long)]
        since: Option<String>,
        /// Date/time to list until
        #[arg(long)]
        until: Option<String>,
        /// Project to be listed
        #[arg(short, long)]
        project: Option<String>,
        /// Task to be listed
        #[arg(short, long)]
        task: Option<String>,
        /// Show the total hours of the listed activities
        #[arg(long)]
        total: bool,
        /// Render hours as hours,minutes instead of decimals
        #[arg(long)]
        minutes: bool,
        /// Treat a still-running entry as excluded by --until
        #[arg(long)]
        until_excludes_running: bool,
    },
    /// Aggregated hours for a named calendar window
    Report {
        /// Window: current-week, last-week, current-month, last-month,
        /// current-quarter, current-year
        #[arg(long, default_value = "current-week")]
        window: String,
        /// Grouping granularity: day, week, month
        #[arg(long = "by", default_value = "day")]
        granularity: String,
        /// Render hours as hours,minutes instead of decimals
        #[arg(long)]
        minutes: bool,
    },
    /// Export tracked activities
    Export {
        /// Format to export: csv, json
        #[arg(long, default_value = "csv")]
        format: String,
        /// Output file (csv defaults to stint-export-<date>.csv,
        /// json defaults to stdout)
        #[arg(long)]
        file: Option<PathBuf>,
        /// CSV delimiter character
        #[arg(long)]
        delimiter: Option<char>,
        /// Write all fields to the csv so the file can be imported again
        #[arg(long)]
        all_fields: bool,
        /// Date/time to start the export from
        #[arg(long)]
        since: Option<String>,
        /// Date/time to export until
        #[arg(long)]
        until: Option<String>,
        /// Project to be exported
        #[arg(short, long)]
        project: Option<String>,
        /// Task to be exported
        #[arg(short, long)]
        task: Option<String>,
    },
    /// Import tracked activities
    Import {
        /// File to import
        file: PathBuf,
        /// Format to import: csv, json
        #[arg(long)]
        format: String,
        /// CSV delimiter character
        #[arg(long)]
        delimiter: Option<char>,
    },
    /// Erase a tracked activity by id
    Erase {
        /// Entry id
        id: String,
    },
}

pub fn run() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not operator errors; everything else
            // must exit 1.
            if e.use_stderr() {
                e.print().ok();
                std::process::exit(1);
            }
            e.print().ok();
            return Ok(());
        }
    };
    handle_command(cli)
}

fn handle_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Track { project, task, notes, begin, finish } => {
            handle_track(project, task, notes, begin, finish)
        }
        Commands::Finish { notes } => handle_finish(notes),
        Commands::Tracking { full } => handle_tracking(full),
        Commands::List { since, until, project, task, total, minutes, until_excludes_running } => {
            handle_list(since, until, project, task, total, minutes, until_excludes_running)
        }
        Commands::Report { window, granularity, minutes } => {
            handle_report(window, granularity, minutes)
        }
        Commands::Export { format, file, delimiter, all_fields, since, until, project, task } => {
            handle_export(format, file, delimiter, all_fields, since, until, project, task)
        }
        Commands::Import { file, format, delimiter } => handle_import(file, format, delimiter),
        Commands::Erase { id } => handle_erase(id),
    }
}

fn handle_track(
    project: String,
    task: String,
    notes: Option<String>,
    begin: Option<String>,
    finish: Option<String>,
) -> Result<()> {
    let conn = Db::connect()?;
    let now = Utc::now();

    if EntryRepo::get_running(&conn)?.is_some() {
        bail!("an entry is already running; finish it before starting a new one");
    }

    let mut entry = Entry::start(&project, &task, now)?;
    let patch = EntryPatch {
        notes: notes.map(|n| n.replace("\\n", "\n")),
        begin: begin.map(|b| parse_flexible_time(&b, now)).transpose()?,
        finish: finish.map(|f| parse_flexible_time(&f, now)).transpose()?,
        ..Default::default()
    };
    entry.apply(patch, now)?;

    if !entry.is_well_formed() {
        bail!("finish time must be after begin time");
    }

    let running = entry.running;
    EntryRepo::insert(&conn, &mut entry, running)?;

    if entry.running {
        println!("{}", entry.start_line());
    } else {
        println!(
            "tracked {} on {} for {}h",
            entry.task,
            entry.project,
            fmt_hours(entry.hours, HoursFormat::Decimal)
        );
    }
    Ok(())
}

fn handle_finish(notes: Option<String>) -> Result<()> {
    let conn = Db::connect()?;
    let now = Utc::now();

    let mut entry = EntryRepo::get_running(&conn)?
        .ok_or_else(|| anyhow::anyhow!("no entry is currently running; nothing to finish"))?;

    entry.finish_at(now)?;
    if let Some(notes) = notes {
        entry.notes = notes.replace("\\n", "\n");
    }
    EntryRepo::finish_running(&conn, &entry)?;

    println!("{}", entry.finish_line(now, HoursFormat::Decimal));
    Ok(())
}

fn handle_tracking(full: bool) -> Result<()> {
    let conn = Db::connect()?;
    let now = Utc::now();

    match EntryRepo::get_running(&conn)? {
        Some(entry) if full => {
            println!("{}", entry.detail_block(now, HoursFormat::Decimal));
            Ok(())
        }
        Some(entry) => {
            println!("{}", entry.tracking_line(now, HoursFormat::Decimal));
            Ok(())
        }
        None => bail!("no entry is currently running"),
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_list(
    since: Option<String>,
    until: Option<String>,
    project: Option<String>,
    task: Option<String>,
    total: bool,
    minutes: bool,
    until_excludes_running: bool,
) -> Result<()> {
    let conn = Db::connect()?;
    let now = Utc::now();

    let entries = EntryRepo::list_all_ordered_by_start(&conn)?;
    let filter = EntryFilter {
        project,
        task,
        since: since.map(|s| parse_flexible_time(&s, now)).transpose()?,
        until: until.map(|u| parse_flexible_time(&u, now)).transpose()?,
        running_under_until: if until_excludes_running {
            RunningUnderUntil::Exclude
        } else {
            RunningUnderUntil::Keep
        },
    };
    let filtered = filter_entries(&entries, &filter);

    let format = if minutes { HoursFormat::HoursMinutes } else { HoursFormat::Decimal };
    print!("{}", format_entry_list(&filtered, now, format, total));
    Ok(())
}

fn handle_report(window: String, granularity: String, minutes: bool) -> Result<()> {
    let selector = WindowSelector::from_str(&window).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown window '{}'; expected one of current-week, last-week, current-month, \
             last-month, current-quarter, current-year",
            window
        )
    })?;
    let granularity = Granularity::from_str(&granularity).ok_or_else(|| {
        anyhow::anyhow!("unknown grouping '{}'; expected day, week, or month", granularity)
    })?;

    let conn = Db::connect()?;
    let format = if minutes { HoursFormat::HoursMinutes } else { HoursFormat::Decimal };

    match window_report(&conn, selector, granularity, Utc::now()) {
        Ok(points) => {
            print!("{}", format_report(&points, format));
            Ok(())
        }
        // Correctable by picking another window, not a failure.
        Err(err @ CoreError::NoData { .. }) => {
            println!("{}", err);
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_export(
    format: String,
    file: Option<PathBuf>,
    delimiter: Option<char>,
    all_fields: bool,
    since: Option<String>,
    until: Option<String>,
    project: Option<String>,
    task: Option<String>,
) -> Result<()> {
    let conn = Db::connect()?;
    let now = Utc::now();

    let entries = EntryRepo::list_all_ordered_by_start(&conn)?;
    let filter = EntryFilter {
        project,
        task,
        since: since.map(|s| parse_flexible_time(&s, now)).transpose()?,
        until: until.map(|u| parse_flexible_time(&u, now)).transpose()?,
        running_under_until: RunningUnderUntil::Keep,
    };
    let mut filtered = filter_entries(&entries, &filter);

    // Exports carry live durations and freshly derived dates.
    for entry in &mut filtered {
        entry.hours = entry.duration_hours(now);
        entry.derive_date();
    }

    match format.as_str() {
        "csv" => {
            let delimiter = delimiter.unwrap_or(DEFAULT_DELIMITER);
            let text = transfer::entries_to_csv(&filtered, delimiter, all_fields, HoursFormat::Decimal);
            let path = file.unwrap_or_else(|| {
                PathBuf::from(format!("stint-export-{}.csv", now.format("%Y-%m-%d")))
            });
            write_new_file(&path, &text)?;
            println!("exported {} entries to {}", filtered.len(), path.display());
        }
        "json" => {
            let text = transfer::entries_to_json(&filtered)?;
            match file {
                Some(path) => {
                    write_new_file(&path, &text)?;
                    println!("exported {} entries to {}", filtered.len(), path.display());
                }
                None => println!("{}", text),
            }
        }
        other => bail!("unknown export format '{}'; expected csv or json", other),
    }
    Ok(())
}

fn handle_import(file: PathBuf, format: String, delimiter: Option<char>) -> Result<()> {
    let conn = Db::connect()?;
    let now = Utc::now();

    let text = std::fs::read_to_string(&file)
        .with_context(|| format!("could not read {}", file.display()))?;

    let entries = match format.as_str() {
        "csv" => transfer::entries_from_csv(&text, delimiter.unwrap_or(DEFAULT_DELIMITER), now)?,
        "json" => transfer::entries_from_json(&text)?,
        other => bail!("unknown import format '{}'; expected csv or json", other),
    };

    let count = transfer::import_into_store(&conn, entries)?;
    println!("imported {} entries from {}", count, file.display());
    Ok(())
}

fn handle_erase(id: String) -> Result<()> {
    let id = validate_entry_id(&id).map_err(|e| anyhow::anyhow!(e))?;
    let conn = Db::connect()?;
    EntryRepo::delete(&conn, id)?;
    println!("erased entry {}", id);
    Ok(())
}

fn write_new_file(path: &Path, text: &str) -> Result<()> {
    if path.exists() {
        bail!(
            "file {} already exists; choose a different --file or delete it first",
            path.display()
        );
    }
    std::fs::write(path, text).with_context(|| format!("could not write {}", path.display()))
}
