//! CLI integration tests for every subcommand.
//!
//! Uses `assert_cmd` to spawn the `pactum` binary and verify exit codes,
//! stdout content, and stderr content. Contracts are written to a
//! temporary directory per test.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const PERSON: &str = r#"{
    "types": {
        "Address": { "street": "(string)", "zip?": "(number)" }
    },
    "root": {
        "id": "(number)",
        "name": "(string)",
        "status": { "$enum": ["ACTIVE", "SUSPENDED"] },
        "address?": "(Address?)"
    },
    "examples": [ { "id": 7, "name": "Ada", "status": "ACTIVE" } ]
}"#;

/// `PERSON` with a narrower enum and a new mandatory key on Address.
const PERSON_NARROWED: &str = r#"{
    "types": {
        "Address": { "street": "(string)", "zip?": "(number)", "country": "(string)" }
    },
    "root": {
        "id": "(number)",
        "name": "(string)",
        "status": { "$enum": ["ACTIVE"] },
        "address?": "(Address?)"
    }
}"#;

/// `PERSON` with a wider enum and a nullable name.
const PERSON_RELAXED: &str = r#"{
    "types": {
        "Address": { "street": "(string)", "zip?": "(number)" }
    },
    "root": {
        "id": "(number)",
        "name": "(string?)",
        "status": { "$enum": ["ACTIVE", "SUSPENDED", "CLOSED"] },
        "address?": "(Address?)"
    }
}"#;

/// Helper: create a Command for the `pactum` binary.
fn pactum() -> Command {
    let mut cmd = cargo_bin_cmd!("pactum");
    cmd.env_remove("RUST_LOG")
        .env_remove("PACTUM_MAX_TEST_REQUEST_COMBINATIONS")
        .env_remove("PACTUM_NEGATIVE_POLICY");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    pactum()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Contract pattern matching and test generation",
        ));
}

#[test]
fn version_exits_0() {
    pactum()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pactum"));
}

#[test]
fn tests_help_lists_flags() {
    pactum()
        .args(["tests", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--negative"))
        .stdout(predicate::str::contains("--limit"));
}

// ──────────────────────────────────────────────
// 2. Match subcommand
// ──────────────────────────────────────────────

#[test]
fn match_valid_value_exits_0() {
    let tmp = TempDir::new().unwrap();
    let contract = write(&tmp, "person.json", PERSON);
    let value = write(
        &tmp,
        "value.json",
        r#"{"id": 1, "name": "Ada", "status": "ACTIVE", "address": {"street": "Baker"}}"#,
    );
    pactum()
        .arg("match")
        .arg(&contract)
        .arg(&value)
        .assert()
        .success()
        .stdout(predicate::str::contains("matched"));
}

#[test]
fn match_reports_every_mismatch() {
    let tmp = TempDir::new().unwrap();
    let contract = write(&tmp, "person.json", PERSON);
    let value = write(
        &tmp,
        "value.json",
        r#"{"id": "abc123", "name": 5, "status": "GONE"}"#,
    );
    pactum()
        .arg("match")
        .arg(&contract)
        .arg(&value)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("3 mismatch(es)"))
        .stdout(predicate::str::contains(">> id"))
        .stdout(predicate::str::contains(">> name"))
        .stdout(predicate::str::contains(r#"one of "ACTIVE", "SUSPENDED""#));
}

#[test]
fn match_json_output_lists_paths() {
    let tmp = TempDir::new().unwrap();
    let contract = write(&tmp, "person.json", PERSON);
    let value = write(
        &tmp,
        "value.json",
        r#"{"id": 1, "name": "Ada", "status": "ACTIVE", "address": {"zip": 1}}"#,
    );
    let out = pactum()
        .args(["--output", "json", "match"])
        .arg(&contract)
        .arg(&value)
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["matched"], false);
    let paths: Vec<&str> = json["failures"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["path"].as_str().unwrap())
        .collect();
    assert!(paths.iter().all(|p| p.starts_with("address")), "{:?}", paths);
    assert!(paths.iter().any(|p| p.ends_with("street")), "{:?}", paths);
}

#[test]
fn match_mock_mode_accepts_type_tokens() {
    let tmp = TempDir::new().unwrap();
    let contract = write(&tmp, "person.json", PERSON);
    let value = write(
        &tmp,
        "value.json",
        r#"{"id": "(number)", "name": "(string)", "status": "ACTIVE"}"#,
    );
    pactum()
        .arg("match")
        .arg(&contract)
        .arg(&value)
        .assert()
        .failure();
    pactum()
        .args(["match", "--mock"])
        .arg(&contract)
        .arg(&value)
        .assert()
        .success();
}

#[test]
fn match_nonexistent_contract_exits_1() {
    let tmp = TempDir::new().unwrap();
    let value = write(&tmp, "value.json", "{}");
    pactum()
        .args(["match", "nonexistent_contract_xyz.json"])
        .arg(&value)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error reading"));
}

#[test]
fn unknown_type_reference_exits_1_with_json_error() {
    let tmp = TempDir::new().unwrap();
    let contract = write(&tmp, "broken.json", r#"{"root": {"a": "(Ghost)"}}"#);
    let value = write(&tmp, "value.json", "{}");
    let out = pactum()
        .args(["--output", "json", "match"])
        .arg(&contract)
        .arg(&value)
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stderr
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert!(json["error"].as_str().unwrap().contains("unknown pattern (Ghost)"));
}

// ──────────────────────────────────────────────
// 3. Generate subcommand
// ──────────────────────────────────────────────

#[test]
fn generate_emits_matching_values() {
    let tmp = TempDir::new().unwrap();
    let contract = write(&tmp, "person.json", PERSON);
    let out = pactum()
        .args(["--output", "json", "generate", "--count", "3"])
        .arg(&contract)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let values = json.as_array().unwrap();
    assert_eq!(values.len(), 3);
    for value in values {
        assert!(value["id"].is_number());
        assert!(value["name"].is_string());
        let status = value["status"].as_str().unwrap();
        assert!(status == "ACTIVE" || status == "SUSPENDED");

        let path = write(&tmp, "generated.json", &value.to_string());
        pactum().arg("match").arg(&contract).arg(&path).assert().success();
    }
}

// ──────────────────────────────────────────────
// 4. Tests subcommand
// ──────────────────────────────────────────────

#[test]
fn tests_use_contract_examples() {
    let tmp = TempDir::new().unwrap();
    let contract = write(&tmp, "person.json", PERSON);
    let out = pactum()
        .args(["--output", "json", "tests"])
        .arg(&contract)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let inputs = json.as_array().unwrap();
    // address? (Address?) is absent, null, or an Address with and without
    // zip; every other key is pinned by the example.
    assert_eq!(inputs.len(), 4);
    for input in inputs {
        assert_eq!(input["row"], "example 1");
        assert_eq!(input["value"]["id"], 7);
        assert_eq!(input["value"]["name"], "Ada");
    }
}

#[test]
fn tests_with_row_file_and_limit() {
    let tmp = TempDir::new().unwrap();
    let contract = write(&tmp, "person.json", PERSON);
    let row = write(&tmp, "row.json", r#"{"name": "Grace"}"#);
    let out = pactum()
        .args(["--output", "json", "tests", "--limit", "2", "--row"])
        .arg(&row)
        .arg(&contract)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let inputs = json.as_array().unwrap();
    assert_eq!(inputs.len(), 2);
    assert!(inputs.iter().all(|i| i["value"]["name"] == "Grace"));
}

#[test]
fn tests_invalid_row_example_exits_1() {
    let tmp = TempDir::new().unwrap();
    let contract = write(&tmp, "person.json", PERSON);
    let row = write(&tmp, "row.json", r#"{"id": "seven"}"#);
    pactum()
        .args(["tests", "--row"])
        .arg(&row)
        .arg(&contract)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("example for id is invalid"));
}

#[test]
fn negative_tests_never_match() {
    let tmp = TempDir::new().unwrap();
    let contract = write(&tmp, "person.json", PERSON);
    let out = pactum()
        .args(["--output", "json", "tests", "--negative", "--limit", "100"])
        .arg(&contract)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let inputs = json.as_array().unwrap();
    assert!(!inputs.is_empty());
    for input in inputs {
        let path = write(&tmp, "negative.json", &input["value"].to_string());
        pactum()
            .arg("match")
            .arg(&contract)
            .arg(&path)
            .assert()
            .failure()
            .code(1);
    }
}

#[test]
fn negative_policy_comes_from_config_file() {
    let tmp = TempDir::new().unwrap();
    let contract = write(&tmp, "person.json", PERSON);
    let config = write(
        &tmp,
        "pactum.toml",
        "[generation]\nnegative_policy = \"non-stringly\"\n",
    );
    let out = pactum()
        .args(["--output", "json", "--config"])
        .arg(&config)
        .args(["tests", "--negative", "--limit", "100"])
        .arg(&contract)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let inputs = json.as_array().unwrap();
    assert!(!inputs.is_empty());
    for input in inputs {
        let value = input["value"].as_object().unwrap();
        assert!(
            value.values().all(|v| !v.is_null()),
            "null substitute under non-stringly: {:?}",
            value
        );
    }
}

#[test]
fn env_cap_of_zero_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let contract = write(&tmp, "person.json", PERSON);
    pactum()
        .env("PACTUM_MAX_TEST_REQUEST_COMBINATIONS", "0")
        .arg("tests")
        .arg(&contract)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("must be > 0"));
}

// ──────────────────────────────────────────────
// 5. Compat subcommand
// ──────────────────────────────────────────────

#[test]
fn compat_identical_contracts_exits_0() {
    let tmp = TempDir::new().unwrap();
    let older = write(&tmp, "older.json", PERSON);
    let newer = write(&tmp, "newer.json", PERSON);
    pactum()
        .arg("compat")
        .arg(&older)
        .arg(&newer)
        .assert()
        .success()
        .stdout(predicate::str::contains("compatible (2 pattern(s) checked)"));
}

#[test]
fn compat_relaxed_contract_exits_0() {
    let tmp = TempDir::new().unwrap();
    let older = write(&tmp, "older.json", PERSON);
    let newer = write(&tmp, "newer.json", PERSON_RELAXED);
    pactum()
        .arg("compat")
        .arg(&older)
        .arg(&newer)
        .assert()
        .success();
}

#[test]
fn compat_narrowed_contract_exits_1() {
    let tmp = TempDir::new().unwrap();
    let older = write(&tmp, "older.json", PERSON);
    let newer = write(&tmp, "newer.json", PERSON_NARROWED);
    let out = pactum()
        .args(["--output", "json", "compat"])
        .arg(&older)
        .arg(&newer)
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["compatible"], false);
    let types: Vec<&str> = json["incompatible"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["root", "Address"]);
}
