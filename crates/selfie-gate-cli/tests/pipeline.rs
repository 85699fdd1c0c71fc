//! Pipeline integration tests using synthetic photos.
//!
//! Runs the binary end to end on generated photos with known statistics.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::uninlined_format_args,
    deprecated
)]

use std::path::Path;

use assert_cmd::Command;
use selfie_gate_test_support::{SyntheticPhoto, SyntheticPhotoBuilder};
use serde_json::Value;

/// Command isolated from the user's config and model directories.
fn selfie_gate(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("selfie-gate").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .current_dir(home);
    cmd
}

/// Checks a single photo without face detection; returns (exit code, report).
fn check(photo: &SyntheticPhoto, name: &str) -> (i32, Value) {
    let home = tempfile::tempdir().unwrap();
    let path = photo.save(home.path(), name).unwrap();

    let output = selfie_gate(home.path())
        .arg("--no-face")
        .arg(&path)
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    let report = serde_json::from_str(stdout.lines().next().expect("one report")).unwrap();
    (output.status.code().unwrap(), report)
}

fn issues(report: &Value) -> Vec<String> {
    report["result"]["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

/// Full-resolution variant of a checkerboard with large cells so the
/// analysis thumbnail keeps hard edges.
fn large_checkerboard(low: u8, high: u8) -> SyntheticPhoto {
    SyntheticPhotoBuilder::checkerboard_with_levels(480, 640, 32, low, high)
}

// === Accepted ===

#[test]
fn test_sharp_well_lit_photo_accepted() {
    let (code, report) = check(&large_checkerboard(64, 192), "good.png");

    assert_eq!(code, 0);
    assert!(issues(&report).is_empty());
    assert_eq!(report["result"]["score"], 100);
    assert!(report["result"]["metrics"]["blurVariance"].as_f64().unwrap() > 70.0);
}

#[test]
fn test_low_contrast_alone_is_tolerated() {
    // 768 px shrinks exactly 4x, keeping the 32 px cells aligned and crisp.
    // Levels 32 apart give a contrast of 16, just under the threshold.
    let photo = SyntheticPhotoBuilder::checkerboard_with_levels(576, 768, 32, 112, 144);
    let (code, report) = check(&photo, "flat.png");

    assert_eq!(issues(&report), vec!["LOW_CONTRAST"]);
    assert_eq!(report["result"]["ok"], true);
    assert_eq!(report["result"]["score"], 91);
    assert_eq!(
        report["result"]["message"],
        "Image contrast is low. Improve lighting and retry."
    );
    assert!(report.get("submission").is_some());
    assert_eq!(code, 0);
}

// === Rejected ===

#[test]
fn test_small_photo_low_resolution() {
    let (code, report) = check(&SyntheticPhotoBuilder::good_photo(), "small.png");

    assert_eq!(code, 1);
    assert_eq!(issues(&report), vec!["LOW_RESOLUTION"]);
    assert_eq!(report["result"]["score"], 80);
    assert_eq!(report["result"]["metrics"]["shortSide"], 192);
}

#[test]
fn test_black_photo() {
    let (code, report) = check(&SyntheticPhotoBuilder::black_photo(), "black.png");

    assert_eq!(code, 1);
    assert_eq!(
        issues(&report),
        vec!["LOW_RESOLUTION", "LOW_LIGHT", "LOW_CONTRAST", "BLURRY"]
    );
    assert_eq!(report["result"]["metrics"]["brightness"], 0.0);
    assert_eq!(report["result"]["metrics"]["contrast"], 0.0);
    // 100 - 20 - 14 - 9 - 18
    assert_eq!(report["result"]["score"], 39);
    assert_eq!(
        report["result"]["message"],
        "Photo resolution is too low. Move closer and try again."
    );
}

#[test]
fn test_smooth_gradient_is_blurry() {
    let photo = SyntheticPhotoBuilder::horizontal_gradient(480, 640);
    let (code, report) = check(&photo, "gradient.png");

    assert_eq!(code, 1);
    assert_eq!(issues(&report), vec!["BLURRY"]);
    assert_eq!(report["result"]["score"], 82);
}

#[test]
fn test_dark_photo_low_light() {
    let (code, report) = check(&large_checkerboard(20, 70), "dark.png");

    assert_eq!(code, 1);
    assert_eq!(issues(&report), vec!["LOW_LIGHT"]);
    assert_eq!(report["result"]["score"], 86);
    assert_eq!(
        report["result"]["message"],
        "Lighting is too dark. Move to a brighter area."
    );
}

#[test]
fn test_bright_photo_overexposed() {
    let (code, report) = check(&large_checkerboard(200, 250), "bright.png");

    assert_eq!(code, 1);
    assert_eq!(issues(&report), vec!["OVEREXPOSED"]);
    assert_eq!(report["result"]["score"], 90);
}

#[test]
fn test_white_photo() {
    let (_, report) = check(&SyntheticPhotoBuilder::white(480, 640), "white.png");
    assert_eq!(issues(&report), vec!["OVEREXPOSED", "LOW_CONTRAST", "BLURRY"]);
}

// === Batches and Degradation ===

#[test]
fn test_batch_exit_code_reflects_any_rejection() {
    let home = tempfile::tempdir().unwrap();
    large_checkerboard(64, 192).save(home.path(), "a.png").unwrap();
    SyntheticPhotoBuilder::black_photo()
        .save(home.path(), "b.png")
        .unwrap();

    let output = selfie_gate(home.path())
        .arg("--no-face")
        .arg(home.path().join("a.png"))
        .arg(home.path().join("b.png"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&output.stdout).lines().count(), 2);
}

#[test]
fn test_recursive_scan() {
    let home = tempfile::tempdir().unwrap();
    let nested = home.path().join("photos").join("day1");
    std::fs::create_dir_all(&nested).unwrap();
    large_checkerboard(64, 192).save(&nested, "a.png").unwrap();

    let flat = selfie_gate(home.path())
        .arg("--no-face")
        .arg(home.path().join("photos"))
        .output()
        .unwrap();
    assert!(flat.stdout.is_empty());

    let recursive = selfie_gate(home.path())
        .arg("--no-face")
        .arg("-r")
        .arg(home.path().join("photos"))
        .output()
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&recursive.stdout).lines().count(), 1);
    assert_eq!(recursive.status.code(), Some(0));
}

#[test]
fn test_unreadable_photo_is_skipped() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("broken.jpg");
    std::fs::write(&path, b"not a jpeg at all").unwrap();

    let output = selfie_gate(home.path())
        .arg("--no-face")
        .arg(&path)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Skipping"), "{stderr}");
}

#[test]
fn test_truncated_photo_degrades_to_resolution_check() {
    let home = tempfile::tempdir().unwrap();
    let bytes = large_checkerboard(64, 192).png_bytes();
    let path = home.path().join("truncated.png");
    // Keep every chunk up to the start of the pixel data, then cut it short
    let idat = bytes.windows(4).position(|w| w == b"IDAT").unwrap();
    std::fs::write(&path, &bytes[..idat + 4 + 16]).unwrap();

    let output = selfie_gate(home.path())
        .arg("--no-face")
        .arg(&path)
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    let report: Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();
    assert_eq!(report["dimensions"]["width"], 480);
    assert!(issues(&report).is_empty());
    assert_eq!(report["result"]["metrics"]["brightness"], 0.0);
    assert_eq!(report["result"]["metrics"]["blurVariance"], 0.0);
}

#[test]
fn test_corrupt_face_model_degrades_to_no_face_checks() {
    let home = tempfile::tempdir().unwrap();
    let models = home.path().join("models");
    std::fs::create_dir(&models).unwrap();
    std::fs::write(models.join("seeta_fd_frontal_v1.0.bin"), b"").unwrap();
    let photo = large_checkerboard(64, 192)
        .save(home.path(), "good.png")
        .unwrap();

    let output = selfie_gate(home.path())
        .arg("--models-dir")
        .arg(&models)
        .arg(&photo)
        .output()
        .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Face detection disabled"), "{stderr}");
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let report: Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();
    assert_eq!(report["result"]["faceDetectionAvailable"], false);
    assert_eq!(report["result"]["metrics"]["faceCount"], 0);
}

#[test]
fn test_repeated_runs_are_deterministic() {
    let home = tempfile::tempdir().unwrap();
    let photo = large_checkerboard(64, 192)
        .save(home.path(), "good.png")
        .unwrap();

    let run = || {
        let output = selfie_gate(home.path())
            .arg("--no-face")
            .arg(&photo)
            .output()
            .unwrap();
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let report: Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();
        report["result"].clone()
    };

    assert_eq!(run(), run());
}
