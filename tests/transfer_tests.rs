// Integration tests for CSV/JSON export and import

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn new_cmd(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("stint").unwrap();
    cmd.env("STINT_DB", temp_dir.path().join("stint.db"));
    cmd
}

fn seed(temp_dir: &TempDir, project: &str, task: &str, begin: &str, finish: &str) {
    new_cmd(temp_dir)
        .args([
            "track", "--project", project, "--task", task, "--begin", begin, "--finish", finish,
        ])
        .assert()
        .success();
}

fn seed_three(temp_dir: &TempDir) {
    seed(temp_dir, "acme", "wiring", "2024-10-21 09:00", "2024-10-21 11:00");
    seed(temp_dir, "acme", "review", "2024-10-22 09:00", "2024-10-22 10:00");
    seed(temp_dir, "globex", "audit", "2024-10-23 09:00", "2024-10-23 12:00");
}

#[test]
fn test_csv_export_import_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    seed_three(&temp_dir);
    let file = temp_dir.path().join("export.csv");

    new_cmd(&temp_dir)
        .args(["export", "--format", "csv", "--all-fields", "--file"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("exported 3 entries"));

    let text = fs::read_to_string(&file).unwrap();
    assert!(text.starts_with("date;begin;finish;project;task;hours;notes\n"));

    new_cmd(&temp_dir)
        .args(["import", "--format", "csv"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("imported 3 entries"));

    // Originals plus copies, with the copies under fresh ids.
    new_cmd(&temp_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("wiring").count(2))
        .stdout(predicate::str::contains("audit").count(2));
}

#[test]
fn test_json_export_import_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    seed_three(&temp_dir);
    let file = temp_dir.path().join("export.json");

    new_cmd(&temp_dir)
        .args(["export", "--format", "json", "--file"])
        .arg(&file)
        .assert()
        .success();

    let text = fs::read_to_string(&file).unwrap();
    assert!(!text.contains("\"id\""));
    assert!(!text.contains("\"running\""));

    new_cmd(&temp_dir)
        .args(["import", "--format", "json"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("imported 3 entries"));

    new_cmd(&temp_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("review").count(2));
}

#[test]
fn test_json_export_without_file_prints_to_stdout() {
    let temp_dir = TempDir::new().unwrap();
    seed(&temp_dir, "acme", "wiring", "2024-10-21 09:00", "2024-10-21 11:00");

    new_cmd(&temp_dir)
        .args(["export", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"project\": \"acme\""));
}

#[test]
fn test_export_filters_before_writing() {
    let temp_dir = TempDir::new().unwrap();
    seed_three(&temp_dir);
    let file = temp_dir.path().join("acme-only.csv");

    new_cmd(&temp_dir)
        .args(["export", "--format", "csv", "--all-fields", "--project", "acme", "--file"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("exported 2 entries"));

    let text = fs::read_to_string(&file).unwrap();
    assert!(!text.contains("audit"));
}

#[test]
fn test_export_refuses_to_overwrite() {
    let temp_dir = TempDir::new().unwrap();
    seed(&temp_dir, "acme", "wiring", "2024-10-21 09:00", "2024-10-21 11:00");
    let file = temp_dir.path().join("export.csv");
    fs::write(&file, "existing").unwrap();

    new_cmd(&temp_dir)
        .args(["export", "--format", "csv", "--file"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_import_rejects_bad_row_with_index() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("bad.csv");
    fs::write(
        &file,
        "date;begin;finish;project;task;hours;notes\n\
         2024-10-21;2024-10-21 09:00:00;;acme;wiring\n",
    )
    .unwrap();

    new_cmd(&temp_dir)
        .args(["import", "--format", "csv"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("row 1")
                .and(predicate::str::contains("date, begin, finish, project, task, hours, notes")),
        );

    // Nothing was written.
    new_cmd(&temp_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_import_with_comma_delimiter() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("comma.csv");
    fs::write(
        &file,
        "date,begin,finish,project,task,hours,notes\n\
         2024-10-21,2024-10-21 09:00:00,2024-10-21 10:00:00,acme,wiring,1.00,\n",
    )
    .unwrap();

    new_cmd(&temp_dir)
        .args(["import", "--format", "csv", "--delimiter", ","])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("imported 1 entries"));
}

#[test]
fn test_import_unknown_format_fails() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("data.xml");
    fs::write(&file, "<entries/>").unwrap();

    new_cmd(&temp_dir)
        .args(["import", "--format", "xml"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown import format"));
}

#[test]
fn test_import_missing_file_fails() {
    let temp_dir = TempDir::new().unwrap();

    new_cmd(&temp_dir)
        .args(["import", "--format", "csv", "missing.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not read"));
}
