//! Integration tests for the `horizon` binary

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::NamedTempFile;

const CASE: &str = r#"{
    "name": "cap case",
    "buses": [{ "name": "x", "nom_max": { "solar": 2200 } }],
    "generators": [
        { "name": "pv", "bus": "x", "carrier": "solar", "p_nom_extendable": true, "capital_cost": 1 },
        { "name": "backup", "bus": "x", "carrier": "gas", "p_nom": 5000, "marginal_cost": 100 }
    ],
    "loads": [{ "name": "demand", "bus": "x", "p_set": 3000 }]
}"#;

fn case_file(json: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = cargo_bin_cmd!("horizon");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("solve"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("schema"));
}

#[test]
fn test_schema_extends_link_outputs() {
    let mut cmd = cargo_bin_cmd!("horizon");
    cmd.args(["schema", "--kind", "link", "--link-outputs", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bus3"))
        .stdout(predicate::str::contains("efficiency3"))
        .stdout(predicate::str::contains("p3"));
}

#[test]
fn test_schema_unknown_kind_fails() {
    let mut cmd = cargo_bin_cmd!("horizon");
    cmd.args(["schema", "--kind", "turbine"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown entity kind"));
}

#[test]
fn test_validate_clean_case() {
    let case = case_file(CASE);
    let mut cmd = cargo_bin_cmd!("horizon");
    cmd.arg("validate")
        .arg(case.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Sub-networks: 1"));
}

#[test]
fn test_validate_reports_dangling_bus() {
    let case = case_file(
        r#"{
            "buses": [{ "name": "x" }],
            "loads": [{ "name": "demand", "bus": "y", "p_set": 10 }]
        }"#,
    );
    let mut cmd = cargo_bin_cmd!("horizon");
    cmd.args(["validate", "--format", "json"])
        .arg(case.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("unknown bus 'y'"));
}

#[test]
fn test_print_options_applies_overrides() {
    let mut options = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(options, "solver_tolerance = 0.001").unwrap();

    let mut cmd = cargo_bin_cmd!("horizon");
    cmd.args(["solve", "unused.json", "--print-options", "--multi-period", "--options"])
        .arg(options.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("multi_period = true"))
        .stdout(predicate::str::contains("solver_tolerance = 0.001"));
}

#[test]
fn test_solve_writes_results() {
    let case = case_file(CASE);
    let out = NamedTempFile::new().unwrap();

    let mut cmd = cargo_bin_cmd!("horizon");
    cmd.arg("solve")
        .arg(case.path())
        .arg("--out")
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Status: optimal"));

    let results: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.path()).unwrap()).unwrap();
    assert_eq!(results["network"], "cap case");
    assert_eq!(results["outcome"]["status"], "Optimal");
    let pv = results["generators"][0]["p_nom_opt"].as_f64().unwrap();
    assert!((pv - 2200.0).abs() < 0.5, "pv capacity {}", pv);
}

#[test]
fn test_solve_infeasible_exit_code() {
    let case = case_file(
        r#"{
            "buses": [{ "name": "x" }],
            "generators": [{ "name": "g", "bus": "x", "carrier": "gas", "p_nom": 5 }],
            "loads": [{ "name": "demand", "bus": "x", "p_set": 10 }]
        }"#,
    );
    let mut cmd = cargo_bin_cmd!("horizon");
    cmd.arg("solve")
        .arg(case.path())
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Status: infeasible"));
}
