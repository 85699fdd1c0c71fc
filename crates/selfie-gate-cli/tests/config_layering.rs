//! Integration tests for configuration layering.
//!
//! Tests the full priority chain: hardcoded defaults < XDG config < project config < CLI args

#![allow(clippy::unwrap_used)] // Test code uses unwrap for brevity
#![allow(deprecated)] // cargo_bin deprecation warning

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use selfie_gate_test_support::SyntheticPhotoBuilder;
use serde_json::Value;

/// Command isolated from the user's config and model directories.
fn selfie_gate(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("selfie-gate").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .current_dir(home);
    cmd
}

/// A sharp, well-lit photo that is only too small (192x192).
fn small_photo(dir: &Path) -> PathBuf {
    SyntheticPhotoBuilder::good_photo()
        .save(dir, "small.png")
        .unwrap()
}

fn write_project_config(home: &Path, content: &str) {
    fs::write(home.join(".selfie-gate.toml"), content).unwrap();
}

fn first_report(stdout: &[u8]) -> Value {
    let text = String::from_utf8_lossy(stdout);
    let line = text.lines().next().unwrap();
    serde_json::from_str(line).unwrap()
}

#[test]
fn test_project_config_applies_format() {
    let home = tempfile::tempdir().unwrap();
    let photo = small_photo(home.path());
    write_project_config(home.path(), "[output]\nformat = 'json'\n");

    selfie_gate(home.path())
        .arg("--no-face")
        .arg(&photo)
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("["));
}

#[test]
fn test_cli_overrides_project_config() {
    let home = tempfile::tempdir().unwrap();
    let photo = small_photo(home.path());
    write_project_config(home.path(), "[output]\nformat = 'json'\n");

    selfie_gate(home.path())
        .arg("--format")
        .arg("jsonl")
        .arg("--no-face")
        .arg(&photo)
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("{"));
}

#[test]
fn test_project_config_found_in_parent_directory() {
    let home = tempfile::tempdir().unwrap();
    let photo = small_photo(home.path());
    write_project_config(home.path(), "[output]\nformat = 'json'\n");
    let nested = home.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();

    selfie_gate(home.path())
        .current_dir(&nested)
        .arg("--no-face")
        .arg(&photo)
        .assert()
        .stdout(predicate::str::starts_with("["));
}

#[test]
fn test_config_threshold_changes_verdict() {
    let home = tempfile::tempdir().unwrap();
    let photo = small_photo(home.path());
    write_project_config(home.path(), "[gate]\nmin_short_side = 160\n");

    let output = selfie_gate(home.path())
        .arg("--no-face")
        .arg(&photo)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let report = first_report(&output.stdout);
    assert_eq!(report["result"]["ok"], true);
    assert_eq!(report["result"]["score"], 100);
}

#[test]
fn test_config_disables_face_detection() {
    let home = tempfile::tempdir().unwrap();
    let photo = small_photo(home.path());
    write_project_config(home.path(), "[face]\nenabled = false\n");

    selfie_gate(home.path())
        .arg("-vv")
        .arg(&photo)
        .assert()
        .code(1)
        .stderr(
            predicate::str::contains("Face detection disabled")
                .and(predicate::str::contains("selfie-gate models fetch").not()),
        );
}

#[test]
fn test_invalid_config_is_ignored_with_warning() {
    let home = tempfile::tempdir().unwrap();
    let photo = small_photo(home.path());
    write_project_config(
        home.path(),
        "[gate]\nmin_short_side = 160\nmin_face_area_ratio = 2.0\n",
    );

    let output = selfie_gate(home.path())
        .arg("--no-face")
        .arg(&photo)
        .output()
        .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("gate.min_face_area_ratio"), "{stderr}");
    // The relaxed resolution threshold was discarded along with the bad value
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(first_report(&output.stdout)["result"]["issues"][0], "LOW_RESOLUTION");
}

#[test]
fn test_unparseable_config_is_skipped() {
    let home = tempfile::tempdir().unwrap();
    let photo = small_photo(home.path());
    write_project_config(home.path(), "[output\nformat = 'json'\n");

    selfie_gate(home.path())
        .arg("--no-face")
        .arg(&photo)
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("{"))
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_xdg_config_applies() {
    let home = tempfile::tempdir().unwrap();
    let photo = small_photo(home.path());
    let xdg = home.path().join("config").join("selfie-gate");
    fs::create_dir_all(&xdg).unwrap();
    fs::write(xdg.join("config.toml"), "[output]\nformat = 'json'\n").unwrap();

    selfie_gate(home.path())
        .arg("--no-face")
        .arg(&photo)
        .assert()
        .stdout(predicate::str::starts_with("["));
}

#[cfg(target_os = "linux")]
#[test]
fn test_project_config_overrides_xdg() {
    let home = tempfile::tempdir().unwrap();
    let photo = small_photo(home.path());
    let xdg = home.path().join("config").join("selfie-gate");
    fs::create_dir_all(&xdg).unwrap();
    fs::write(
        xdg.join("config.toml"),
        "[output]\nformat = 'json'\n\n[gate]\nmin_short_side = 160\n",
    )
    .unwrap();
    write_project_config(home.path(), "[output]\nformat = 'jsonl'\n");

    let output = selfie_gate(home.path())
        .arg("--no-face")
        .arg(&photo)
        .output()
        .unwrap();

    // Format from the project file, threshold still from XDG
    let report = first_report(&output.stdout);
    assert_eq!(report["result"]["ok"], true);
    assert_eq!(output.status.code(), Some(0));
}
