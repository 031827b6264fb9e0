//! End-to-end tests for the optarc CLI
//!
//! These tests drive the compiled binary against synthesized archives:
//! - Successful conversion and output layout
//! - Custom output path
//! - Validation of good and broken configurations
//! - Exit codes and error messages for the fatal cases

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const WATER_XYZ: &str = "3\nwater\nO 0.0 0.0 0.117\nH 0.0 0.757 -0.467\nH 0.0 -0.757 -0.467\n";

const ARCHIVE_YAML: &str = r#"
provider_prefix: example
database_description: One molecule with an energy
entries:
  - entry_type: structures
    entry_paths:
      - matches:
          - "xyzs/*.xyz"
    property_paths:
      - file: data.csv
    property_definitions:
      - name: energy
        title: Total energy
        unit: eV
        type: float
"#;

/// Helper to build a small but complete archive on disk
fn write_archive(dir: &Path) {
    fs::create_dir_all(dir.join("xyzs")).unwrap();
    fs::write(dir.join("xyzs/water.xyz"), WATER_XYZ).unwrap();
    fs::write(dir.join("data.csv"), "id,energy\nwater,-76.4\n").unwrap();
    fs::write(dir.join("optimade.yaml"), ARCHIVE_YAML).unwrap();
}

fn optarc() -> Command {
    Command::cargo_bin("optarc").unwrap()
}

// ============================================================================
// Convert
// ============================================================================

#[test]
fn test_convert_writes_jsonl() {
    let dir = TempDir::new().unwrap();
    write_archive(dir.path());

    optarc()
        .arg("convert")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Converted archive"))
        .stdout(predicate::str::contains("optimade.jsonl"));

    let content = fs::read_to_string(dir.path().join("optimade.jsonl")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("x-optimade"));
    assert!(lines[1].contains("_example_energy"));
    assert!(lines[2].contains("\"id\":\"xyzs/water.xyz\""));
    assert!(lines[2].contains("-76.4"));
}

#[test]
fn test_convert_with_output_flag() {
    let dir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    write_archive(dir.path());

    let output = out_dir.path().join("db.jsonl");
    optarc()
        .arg("convert")
        .arg(dir.path())
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    assert!(output.exists());
    assert!(!dir.path().join("optimade.jsonl").exists());
}

#[test]
fn test_convert_refuses_existing_output() {
    let dir = TempDir::new().unwrap();
    write_archive(dir.path());
    fs::write(dir.path().join("optimade.jsonl"), "old data\n").unwrap();

    optarc()
        .arg("convert")
        .arg(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Not overwriting"));

    // the existing file is untouched
    assert_eq!(
        fs::read_to_string(dir.path().join("optimade.jsonl")).unwrap(),
        "old data\n"
    );
}

#[test]
fn test_convert_missing_config_fails() {
    let dir = TempDir::new().unwrap();

    optarc()
        .arg("convert")
        .arg(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("optimade.yaml"));
}

#[test]
fn test_convert_unmatched_wildcard_fails() {
    let dir = TempDir::new().unwrap();
    write_archive(dir.path());
    fs::remove_dir_all(dir.path().join("xyzs")).unwrap();

    optarc()
        .arg("convert")
        .arg(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No files match"));
}

// ============================================================================
// Validate
// ============================================================================

#[test]
fn test_validate_reports_entry_types() {
    let dir = TempDir::new().unwrap();
    write_archive(dir.path());

    optarc()
        .arg("validate")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Valid configuration"))
        .stdout(predicate::str::contains("structures"));
}

#[test]
fn test_validate_rejects_duplicate_property_names() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("optimade.yaml"),
        r#"
database_description: Broken
entries:
  - entry_type: structures
    entry_paths:
      - file: structures.zip
    property_definitions:
      - name: energy
        type: float
      - name: energy
        type: string
"#,
    )
    .unwrap();

    optarc()
        .arg("validate")
        .arg(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("more than once"));
}

// ============================================================================
// Usage
// ============================================================================

#[test]
fn test_no_subcommand_shows_help() {
    optarc().assert().failure().code(2);
}
