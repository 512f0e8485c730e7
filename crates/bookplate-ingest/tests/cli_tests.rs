//! Smoke tests for the bookplate-ingest binary

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use assert_cmd::Command;
use common::{write_export, TestDirs, TestRecord};
use predicates::prelude::*;

const ENV_VARS: &[&str] = &[
    "MARC_FULL_SOURCE_DIR",
    "MARC_FULL_OUTPUT_DIR",
    "BOOKPLATE_JSON_DIR",
    "TRACKER_PATH",
    "ARCHIVE_PATTERN",
    "PROGRESS_INTERVAL",
    "LOG_LEVEL",
    "LOG_OUTPUT",
    "LOG_FORMAT",
    "LOG_DIR",
    "LOG_FILE_PREFIX",
    "LOG_FILTER",
    "LOG_INCLUDE_LOCATION",
    "RUST_LOG",
];

/// The binary with a clean environment, run from the temp root so no `.env` is picked up
fn bookplate_ingest(dirs: &TestDirs) -> Command {
    let mut cmd = Command::cargo_bin("bookplate-ingest").unwrap();
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.current_dir(dirs.root.path());
    cmd
}

#[test]
fn test_help() {
    let dirs = TestDirs::new();
    bookplate_ingest(&dirs)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("report"));
}

#[test]
fn test_report_with_env_vars() {
    let dirs = TestDirs::new();
    write_export(
        &dirs.source,
        "BIBS_1.tar.gz",
        &[TestRecord::with_bookplate("991001", "Gift of the Class of 1950", "Class Fund")],
    );

    bookplate_ingest(&dirs)
        .env("MARC_FULL_SOURCE_DIR", &dirs.source)
        .env("MARC_FULL_OUTPUT_DIR", &dirs.output)
        .env("BOOKPLATE_JSON_DIR", &dirs.store)
        .arg("report")
        .assert()
        .success();

    assert!(dirs.tracker_path().is_file());
    assert!(dirs.store.join("991001.json").is_file());
}

#[test]
fn test_report_with_flags() {
    let dirs = TestDirs::new();
    write_export(&dirs.source, "BIBS_1.tar.gz", &[TestRecord::plain("1")]);
    let tracker = dirs.root.path().join("reports").join("run.json");

    bookplate_ingest(&dirs)
        .arg("report")
        .arg("--source-dir")
        .arg(&dirs.source)
        .arg("--output-dir")
        .arg(&dirs.output)
        .arg("--tracker")
        .arg(&tracker)
        .assert()
        .success();

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&tracker).unwrap()).unwrap();
    assert_eq!(report["step_02"]["count_all_marc_records"], 1);
}

#[test]
fn test_report_without_source_fails() {
    let dirs = TestDirs::new();
    bookplate_ingest(&dirs)
        .arg("report")
        .arg("--output-dir")
        .arg(&dirs.output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("MARC_FULL_SOURCE_DIR"));
}

#[test]
fn test_failed_save_exits_nonzero() {
    let dirs = TestDirs::new();
    write_export(
        &dirs.source,
        "BIBS_1.tar.gz",
        &[TestRecord::with_bookplate("42", "Gift of G", "")],
    );
    std::fs::create_dir_all(&dirs.store).unwrap();
    std::fs::write(dirs.store.join("42.json"), "[broken").unwrap();

    bookplate_ingest(&dirs)
        .arg("report")
        .arg("--source-dir")
        .arg(&dirs.source)
        .arg("--output-dir")
        .arg(&dirs.output)
        .arg("--bookplate-dir")
        .arg(&dirs.store)
        .assert()
        .failure();

    assert!(dirs.tracker_path().is_file());
}

#[test]
fn test_invalid_log_level_is_reported() {
    let dirs = TestDirs::new();

    bookplate_ingest(&dirs)
        .env("LOG_LEVEL", "loudest")
        .arg("report")
        .arg("--source-dir")
        .arg(&dirs.source)
        .arg("--output-dir")
        .arg(&dirs.output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Ignoring invalid logging environment"));
}
