//! Command-line behaviour of the `qexplore` binary

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use qexplore::history::{encode, ResultType};
use tempfile::TempDir;

use super::common::fixtures::{record_at, response_json};

fn qexplore(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("qexplore").expect("binary should build");
    cmd.arg("--data-dir").arg(data_dir);
    cmd
}

fn add_response(data_dir: &Path, id: &str, minutes: i64) {
    let file = data_dir.join(format!("{}.json", id));
    fs::write(&file, response_json(id, minutes, ResultType::Void).to_string()).unwrap();
    qexplore(data_dir)
        .arg("add")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Added {}", id)));
}

#[test]
fn test_add_list_and_replay() {
    let dir = TempDir::new().unwrap();
    add_response(dir.path(), "gen-a", 1);
    add_response(dir.path(), "gen-b", 2);

    qexplore(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("gen-b").and(predicate::str::contains("4.00 km")));

    qexplore(dir.path())
        .args(["replay", "gen-a"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Radius: 4.00 km")
                .and(predicate::str::contains("Type:   void"))
                .and(predicate::str::contains("google.com/maps")),
        );
}

#[test]
fn test_replay_unknown_id_fails() {
    let dir = TempDir::new().unwrap();
    qexplore(dir.path())
        .args(["replay", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn test_delete_missing_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    qexplore(dir.path())
        .args(["delete", "missing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not found"));
}

#[test]
fn test_clear_requires_confirmation() {
    let dir = TempDir::new().unwrap();
    add_response(dir.path(), "gen-a", 1);

    qexplore(dir.path()).arg("clear").assert().failure();
    qexplore(dir.path()).args(["clear", "--yes"]).assert().success();
    qexplore(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No history"));
}

#[test]
fn test_export_then_import_into_other_data_dir() {
    let source = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    add_response(source.path(), "gen-a", 1);
    add_response(source.path(), "gen-b", 2);

    let export_file = source.path().join("history.json");
    qexplore(source.path())
        .args(["export", "--format", "json", "--output"])
        .arg(&export_file)
        .assert()
        .success();

    qexplore(target.path())
        .arg("import")
        .arg(&export_file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 records (0 duplicates, 0 malformed)"));
}

#[test]
fn test_annotations_shown_in_list_and_replay() {
    let dir = TempDir::new().unwrap();
    let annotated = record_at("fav-1", 5)
        .with_name("Quiet park")
        .with_notes("Bring water")
        .with_favorite(true);
    let file = dir.path().join("annotated.json");
    fs::write(&file, serde_json::json!([encode(&annotated).unwrap()]).to_string()).unwrap();
    qexplore(dir.path()).arg("import").arg(&file).assert().success();

    qexplore(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("* fav-1").and(predicate::str::contains("Quiet park")));

    qexplore(dir.path())
        .args(["replay", "fav-1"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Name:   Quiet park")
                .and(predicate::str::contains("Notes:  Bring water"))
                .and(predicate::str::contains("Favorite")),
        );
}

#[test]
fn test_import_rejects_wrong_shape() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bad.json");
    fs::write(&file, r#"{"records": []}"#).unwrap();
    qexplore(dir.path())
        .arg("import")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Import format error"));
}

#[test]
fn test_gpx_export_to_stdout() {
    let dir = TempDir::new().unwrap();
    add_response(dir.path(), "gen-a", 1);
    qexplore(dir.path())
        .args(["export", "--format", "gpx"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<name>q-explore gen-a</name>"));
}

#[test]
fn test_settings_switch_units() {
    let dir = TempDir::new().unwrap();
    add_response(dir.path(), "gen-a", 1);

    qexplore(dir.path())
        .args(["settings", "set", "units", "imperial"])
        .assert()
        .success();
    qexplore(dir.path())
        .args(["settings", "get", "units"])
        .assert()
        .success()
        .stdout("imperial\n");
    qexplore(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("2.49 mi"));

    qexplore(dir.path())
        .args(["settings", "set", "colour", "red"])
        .assert()
        .failure();
}

#[test]
fn test_convert() {
    let dir = TempDir::new().unwrap();
    qexplore(dir.path())
        .args(["convert", "3000", "m", "mi"])
        .assert()
        .success()
        .stdout("1.86 mi\n");
    qexplore(dir.path())
        .args(["convert", "1", "furlong", "m"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown unit"));
}
