use assert_cmd::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn sample_project() -> PathBuf {
    let fixture = repo_root()
        .join("fixtures")
        .join("projects")
        .join("sample.json");
    assert!(fixture.exists(), "fixture missing: {}", fixture.display());
    fixture
}

/// Copies the sample project into a fresh directory, since `run` saves it in place.
fn scratch_project() -> (tempfile::TempDir, PathBuf) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let project = tmp.path().join("case.json");
    fs::copy(sample_project(), &project).expect("copy fixture");
    (tmp, project)
}

fn run_case(project: &Path, out_dir: &Path, parcels: &str) -> serde_json::Value {
    let exe = assert_cmd::cargo_bin!("casemap");
    let output = Command::new(exe)
        .current_dir(repo_root())
        .args([
            "run",
            "--project",
            project.to_string_lossy().as_ref(),
            "--case-name",
            "Shoreline Commons",
            "--case-id",
            "2023-000123",
            "--manager",
            "J. Doe",
            "--carto-code",
            "SHOR",
            "--parcels",
            parcels,
            "--out-dir",
            out_dir.to_string_lossy().as_ref(),
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("report is JSON")
}

#[test]
fn cli_run_writes_both_exhibits() {
    let (tmp, project) = scratch_project();
    let out_dir = tmp.path().join("exhibits");

    let report = run_case(&project, &out_dir, "R-10001, R10002");
    assert_eq!(report["buffer_distance"], 500);
    assert_eq!(report["dissolved"], true);
    assert_eq!(report["matched_features"], 2);
    assert_eq!(report["saved"], true);

    for name in ["2023_000123_SHOR_Aerial.pdf", "2023_000123_SHOR_Overlay.pdf"] {
        let bytes = fs::read(out_dir.join(name)).expect("read pdf");
        assert!(bytes.starts_with(b"%PDF-"), "{name} is not a PDF");
    }

    let saved = fs::read_to_string(&project).expect("read project");
    assert!(saved.contains("BUFF_DIST"), "buffer distance field was not saved");
}

#[test]
fn cli_run_outside_the_boundary_uses_the_rural_distance() {
    let (tmp, project) = scratch_project();
    let report = run_case(&project, &tmp.path().join("out"), "R20001");
    assert_eq!(report["buffer_distance"], 1000);
    assert_eq!(report["dissolved"], false);
}

#[test]
fn cli_run_fails_when_nothing_matches() {
    let (tmp, project) = scratch_project();
    let before = fs::read_to_string(&project).expect("read project");

    let exe = assert_cmd::cargo_bin!("casemap");
    Command::new(exe)
        .current_dir(repo_root())
        .args([
            "--project",
            project.to_string_lossy().as_ref(),
            "--case-id",
            "2023-000123",
            "--parcels",
            "R99999",
            "--out-dir",
            tmp.path().join("out").to_string_lossy().as_ref(),
        ])
        .assert()
        .code(1);

    let after = fs::read_to_string(&project).expect("read project");
    assert_eq!(before, after);
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn cli_query_prints_the_predicate() {
    let exe = assert_cmd::cargo_bin!("casemap");
    let output = Command::new(exe)
        .current_dir(repo_root())
        .args(["query", "--parcels", "R-10001 R10002,,R3"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).expect("JSON");
    assert_eq!(value["identifiers"], serde_json::json!(["R10001", "R10002", "R3"]));
    assert_eq!(value["predicate"], "ACCOUNT IN ('R10001', 'R10002', 'R3')");
}

#[test]
fn cli_inspect_lists_layers_and_layouts() {
    let exe = assert_cmd::cargo_bin!("casemap");
    let output = Command::new(exe)
        .current_dir(repo_root())
        .args([
            "inspect",
            "--project",
            sample_project().to_string_lossy().as_ref(),
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).expect("JSON");
    let layers = value["maps"][0]["layers"].as_array().expect("layers");
    assert_eq!(layers.len(), 4);
    assert_eq!(layers[0]["name"], "Tax Parcels");
    assert_eq!(layers[0]["features"], 4);
    assert_eq!(value["layouts"][1]["frames"][0], "Overlay Map Frame");
}

#[test]
fn cli_usage_errors_exit_with_code_2() {
    let exe = assert_cmd::cargo_bin!("casemap");
    Command::new(exe)
        .current_dir(repo_root())
        .args(["--bogus"])
        .assert()
        .code(2);

    let exe = assert_cmd::cargo_bin!("casemap");
    Command::new(exe)
        .current_dir(repo_root())
        .args(["run", "--parcels", "R10001"])
        .assert()
        .code(2);
}
