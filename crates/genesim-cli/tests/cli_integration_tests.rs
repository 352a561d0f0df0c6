//! CLI integration tests for genesim
//!
//! Tests the genesim CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;

/// Command isolated to `dir`: its own database and config directory
#[allow(deprecated)]
fn genesim_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("genesim").unwrap();
    cmd.env("GENESIM_CONFIG_DIR", dir.path().join("config"));
    cmd.env_remove("GENESIM_DATABASE");
    cmd.arg("--database").arg(dir.path().join("genesim.db"));
    cmd
}

fn write_genes(dir: &TempDir, names: &[&str]) -> PathBuf {
    let path = dir.path().join("genes.json");
    std::fs::write(&path, json!(names).to_string()).unwrap();
    path
}

fn write_table(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("sims.json");
    let table = json!({
        "/cosine": {
            "index": ["A", "B", "C"],
            "columns": ["A", "B", "C"],
            "data": [[1.0, 0.9, 0.1], [0.9, 1.0, 0.4], [0.1, 0.4, 1.0]]
        }
    });
    std::fs::write(&path, table.to_string()).unwrap();
    path
}

#[test]
fn test_help_lists_strategies() {
    let dir = TempDir::new().unwrap();
    genesim_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("baseline"))
        .stdout(predicate::str::contains("bulk-create"))
        .stdout(predicate::str::contains("copy-from-file"));
}

#[test]
fn test_missing_gene_list_fails() {
    let dir = TempDir::new().unwrap();
    genesim_cmd(&dir)
        .args(["bulk-create", "missing.json"])
        .arg(dir.path().join("out.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("E100"));

    assert!(!dir.path().join("out.csv").exists());
}

#[test]
fn test_bulk_create_writes_report() {
    let dir = TempDir::new().unwrap();
    let genes = write_genes(&dir, &["A", "B", "C"]);
    let output = dir.path().join("out.csv");

    genesim_cmd(&dir)
        .arg("bulk-create")
        .arg(&genes)
        .arg(&output)
        .args(["--seed", "11"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bulk_create_sims"));

    let report = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], "metric,seconds,count");
    assert!(lines[1].starts_with("bulk_create_genes,") && lines[1].ends_with(",3"));
    assert!(lines[2].starts_with("bulk_create_sims,") && lines[2].ends_with(",9"));
}

#[test]
fn test_baseline_then_rank() {
    let dir = TempDir::new().unwrap();
    let genes = write_genes(&dir, &["A", "B", "C"]);
    let table = write_table(&dir);

    genesim_cmd(&dir)
        .arg("--quiet")
        .arg("baseline")
        .arg(&genes)
        .arg(dir.path().join("out.csv"))
        .arg(&table)
        .assert()
        .success();

    let output = genesim_cmd(&dir).args(["rank", "A"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let first: Vec<&str> = stdout.lines().map(|l| l.split('\t').nth(3).unwrap()).collect();
    assert_eq!(first, ["1", "0.9", "0.9", "0.1", "0.1"]);
}

#[test]
fn test_rank_unknown_gene() {
    let dir = TempDir::new().unwrap();
    genesim_cmd(&dir)
        .args(["rank", "YFG1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E001"));
}

#[test]
fn test_status_counts() {
    let dir = TempDir::new().unwrap();
    let genes = write_genes(&dir, &["A", "B"]);

    genesim_cmd(&dir)
        .arg("copy-from")
        .arg(&genes)
        .arg(dir.path().join("out.csv"))
        .assert()
        .success();

    genesim_cmd(&dir)
        .args(["--quiet", "status"])
        .assert()
        .success()
        .stdout("2\t4\n");
}

#[test]
fn test_config_path_uses_config_dir() {
    let dir = TempDir::new().unwrap();
    genesim_cmd(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"))
        .stdout(predicate::str::contains(dir.path().to_string_lossy().as_ref()));
}

#[test]
fn test_config_set_and_get() {
    let dir = TempDir::new().unwrap();
    genesim_cmd(&dir)
        .args(["config", "set", "loader.batch_size", "250"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set loader.batch_size = 250"));

    genesim_cmd(&dir)
        .args(["config", "get", "loader.batch_size"])
        .assert()
        .success()
        .stdout("250\n");

    genesim_cmd(&dir)
        .args(["config", "set", "loader.batch_size", "lots"])
        .assert()
        .failure();
}
