//! Integration tests for the gpq binary
//!
//! None of these reach a remote source: they cover argument handling,
//! JSON output and dry-run planning.

use std::path::PathBuf;
use std::process::{Command, Output};

fn gpq_bin() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove 'deps' directory
    path.push("gpq");
    path
}

fn run(args: &[&str]) -> Output {
    let dir = tempfile::tempdir().unwrap();
    Command::new(gpq_bin())
        .args(args)
        .current_dir(dir.path())
        .env_remove("GPQ_SIZE_THRESHOLD_MB")
        .env_remove("GPQ_DOWNLOAD_DIR")
        .output()
        .expect("Failed to execute command")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("Output should be valid JSON")
}

#[test]
fn test_presets_json_is_valid() {
    let output = run(&["presets", "--json"]);
    assert!(output.status.success());

    let parsed = stdout_json(&output);
    assert_eq!(parsed["status"], "success");

    let presets = parsed["data"].as_array().unwrap();
    assert!(presets
        .iter()
        .any(|p| p["source"] == "overture" && p["key"] == "places"));
}

#[test]
fn test_presets_unknown_source_fails() {
    let output = run(&["presets", "--source", "nowhere"]);
    assert!(!output.status.success());
}

#[test]
fn test_config_json_reports_sources() {
    let output = run(&["config", "--json"]);
    assert!(output.status.success());

    let parsed = stdout_json(&output);
    let entries = parsed["data"].as_array().unwrap();
    let threshold = entries
        .iter()
        .find(|e| e["key"] == "size_threshold_mb")
        .expect("threshold should be listed");
    assert_eq!(threshold["source"], "Default");
}

#[test]
fn test_bad_scheme_fails() {
    let output = run(&["download", "ftp://example.com/data.parquet", "--dry-run"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unrecognized dataset locator"), "stderr: {}", stderr);
}

#[test]
fn test_unknown_output_extension_fails() {
    let output = run(&[
        "download",
        "https://example.com/data.parquet",
        "-o",
        "out.shp",
        "--dry-run",
    ]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unsupported output format"), "stderr: {}", stderr);
}

#[test]
fn test_dry_run_plans_intersection_without_bbox_column() {
    let output = run(&[
        "download",
        "https://example.com/data.parquet",
        "--bbox",
        "-122.5,37.7,-122.4,37.8",
        "-o",
        "out.geojson",
        "--dry-run",
        "--json",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let parsed = stdout_json(&output);
    let plan = &parsed["data"][0];
    let materialize = plan["materialize_sql"].as_str().unwrap();
    assert!(materialize.contains("ST_Intersects"), "got {}", materialize);
    assert!(plan["sample_sql"].is_string());
    assert!(plan["export_sql"].as_str().unwrap().contains("GeoJSON"));
}

#[test]
fn test_dry_run_trusted_preset_uses_bbox_range() {
    let output = run(&[
        "download",
        "--preset",
        "overture/places",
        "--bbox",
        "-122.5,37.7,-122.4,37.8",
        "--dry-run",
        "--json",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let parsed = stdout_json(&output);
    let plan = &parsed["data"][0];
    let materialize = plan["materialize_sql"].as_str().unwrap();
    assert!(materialize.contains("BETWEEN"), "got {}", materialize);
    assert!(plan["sample_sql"].is_null());

    let output_path = plan["output"].as_str().unwrap();
    assert!(output_path.contains("overture_places_"), "got {}", output_path);
}

#[test]
fn test_dry_run_does_not_write_output() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.parquet");

    let output = Command::new(gpq_bin())
        .args(["download", "https://example.com/data.parquet", "--dry-run", "-o"])
        .arg(&target)
        .current_dir(dir.path())
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command should succeed");
    assert!(!target.exists(), "Dry-run should not write the output file");
}
