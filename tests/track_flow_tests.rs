// Integration tests for the tracking lifecycle commands
// These drive the full CLI end-to-end against a temporary database

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper to create a command pointed at a temporary database
fn new_cmd(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("stint").unwrap();
    cmd.env("STINT_DB", temp_dir.path().join("stint.db"));
    cmd
}

#[test]
fn test_track_starts_entry() {
    let temp_dir = TempDir::new().unwrap();

    new_cmd(&temp_dir)
        .args(["track", "--project", "acme", "--task", "wiring"])
        .assert()
        .success()
        .stdout(predicate::str::contains("started tracking wiring on acme"));
}

#[test]
fn test_second_track_is_rejected_while_running() {
    let temp_dir = TempDir::new().unwrap();

    new_cmd(&temp_dir)
        .args(["track", "--project", "acme", "--task", "wiring"])
        .assert()
        .success();

    new_cmd(&temp_dir)
        .args(["track", "--project", "acme", "--task", "review"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already running"));
}

#[test]
fn test_tracking_shows_running_entry() {
    let temp_dir = TempDir::new().unwrap();

    new_cmd(&temp_dir)
        .args(["track", "--project", "acme", "--task", "wiring"])
        .assert()
        .success();

    new_cmd(&temp_dir)
        .arg("tracking")
        .assert()
        .success()
        .stdout(predicate::str::contains("tracking wiring on acme"));
}

#[test]
fn test_tracking_full_shows_notes() {
    let temp_dir = TempDir::new().unwrap();

    new_cmd(&temp_dir)
        .args(["track", "--project", "acme", "--task", "wiring", "--notes", "site visit"])
        .assert()
        .success();

    new_cmd(&temp_dir)
        .args(["tracking", "--full"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Notes:").and(predicate::str::contains("site visit")));
}

#[test]
fn test_tracking_without_running_entry_fails() {
    let temp_dir = TempDir::new().unwrap();

    new_cmd(&temp_dir)
        .arg("tracking")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no entry is currently running"));
}

#[test]
fn test_finish_closes_the_running_entry() {
    let temp_dir = TempDir::new().unwrap();

    new_cmd(&temp_dir)
        .args(["track", "--project", "acme", "--task", "wiring"])
        .assert()
        .success();

    new_cmd(&temp_dir)
        .args(["finish", "--notes", "breaker swapped"])
        .assert()
        .success()
        .stdout(predicate::str::contains("finished tracking wiring on acme"));

    // Nothing left to finish.
    new_cmd(&temp_dir)
        .arg("finish")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no entry is currently running"));
}

#[test]
fn test_track_rejects_empty_task() {
    let temp_dir = TempDir::new().unwrap();

    new_cmd(&temp_dir)
        .args(["track", "--project", "acme", "--task", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("task cannot be empty"));
}

#[test]
fn test_track_with_begin_and_finish_records_closed_entry() {
    let temp_dir = TempDir::new().unwrap();

    new_cmd(&temp_dir)
        .args([
            "track",
            "--project",
            "acme",
            "--task",
            "wiring",
            "--begin",
            "2024-10-21 09:00",
            "--finish",
            "2024-10-21 11:00",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("tracked wiring on acme for 2.00h"));

    // The closed entry does not count as running.
    new_cmd(&temp_dir).arg("tracking").assert().failure();
}

#[test]
fn test_track_rejects_finish_before_begin() {
    let temp_dir = TempDir::new().unwrap();

    new_cmd(&temp_dir)
        .args([
            "track",
            "--project",
            "acme",
            "--task",
            "wiring",
            "--begin",
            "2024-10-21 11:00",
            "--finish",
            "2024-10-21 09:00",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("finish time must be after begin time"));
}

#[test]
fn test_track_rejects_malformed_begin_time() {
    let temp_dir = TempDir::new().unwrap();

    new_cmd(&temp_dir)
        .args(["track", "--project", "acme", "--task", "wiring", "--begin", "sometime"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not parse 'sometime'"));
}

#[test]
fn test_erase_removes_entry() {
    let temp_dir = TempDir::new().unwrap();

    new_cmd(&temp_dir)
        .args([
            "track",
            "--project",
            "acme",
            "--task",
            "wiring",
            "--begin",
            "2024-10-21 09:00",
            "--finish",
            "2024-10-21 10:00",
        ])
        .assert()
        .success();

    new_cmd(&temp_dir)
        .args(["erase", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("erased entry 1"));

    // Erasing the same id again is a surfaced error, not a silent no-op.
    new_cmd(&temp_dir)
        .args(["erase", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("entry 1 not found"));
}

#[test]
fn test_erase_rejects_non_numeric_id() {
    let temp_dir = TempDir::new().unwrap();

    new_cmd(&temp_dir)
        .args(["erase", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid entry ID"));
}
