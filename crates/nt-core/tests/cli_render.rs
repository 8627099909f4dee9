//! CLI tests for nt-core: rendering, suppression and settings checks.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get a Command for nt-core binary.
fn nt_core() -> Command {
    let mut cmd = Command::cargo_bin("nt-core").expect("nt-core binary should exist");
    cmd.env_remove("NOTICE_CONFIG")
        .env_remove("NOTICE_CONFIG_DIR")
        .env_remove("RUST_LOG")
        .env("NOTICE_LOG", "off");
    cmd
}

fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn settings(dir: &Path) -> PathBuf {
    write_json(
        dir,
        "notifier.json",
        &json!({
            "schema_version": "1.0.0",
            "api_key": "project-key",
            "environment_name": "staging",
            "params_filters": ["password", {"pattern": "(?i)token"}],
            "ignore": ["ActiveRecord::RecordNotFound"]
        }),
    )
}

fn order_error(dir: &Path) -> PathBuf {
    write_json(
        dir,
        "input.json",
        &json!({
            "fields": {
                "error_class": "OrderError",
                "error_message": "total went negative",
                "backtrace": ["app/models/order.rb:44:in 'total'"],
                "parameters": {"password": "hunter2", "authToken": "t-1", "id": 9}
            },
            "request": {"url": "https://shop.example.com/orders/9"}
        }),
    )
}

#[test]
fn render_json_payload() {
    let dir = TempDir::new().unwrap();
    let config = settings(dir.path());
    let input = order_error(dir.path());

    let output = nt_core()
        .arg("--config")
        .arg(&config)
        .args(["render", "--format", "json", "--input"])
        .arg(&input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let doc: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(doc["apiKey"], "project-key");
    assert_eq!(doc["error"]["message"], "OrderError: total went negative");
    assert_eq!(doc["request"]["params"]["password"], "[FILTERED]");
    assert_eq!(doc["request"]["params"]["authToken"], "[FILTERED]");
    assert_eq!(doc["request"]["params"]["id"], 9);
    assert_eq!(doc["serverEnvironment"]["environmentName"], "staging");
    assert_eq!(doc["backtrace"][0]["line"], 44);
}

#[test]
fn render_xml_is_default() {
    let dir = TempDir::new().unwrap();
    let config = settings(dir.path());
    let input = order_error(dir.path());

    nt_core()
        .arg("--config")
        .arg(&config)
        .args(["render", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<?xml"))
        .stdout(predicate::str::contains("<api-key>project-key</api-key>"))
        .stdout(predicate::str::contains(
            "<line method=\"total\" file=\"app/models/order.rb\" number=\"44\"/>",
        ))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn render_reads_stdin() {
    let dir = TempDir::new().unwrap();
    let config = settings(dir.path());

    nt_core()
        .arg("--config")
        .arg(&config)
        .args(["render", "-f", "json", "-i", "-"])
        .write_stdin(r#"{"error": {"type": "Timeout", "message": "slow"}}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"message\":\"Timeout: slow\""));
}

#[test]
fn ignored_class_exits_one_without_output() {
    let dir = TempDir::new().unwrap();
    let config = settings(dir.path());
    let input = write_json(
        dir.path(),
        "ignored.json",
        &json!({"fields": {"error_class": "ActiveRecord::RecordNotFound"}}),
    );

    nt_core()
        .arg("--config")
        .arg(&config)
        .args(["render", "--input"])
        .arg(&input)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());
}

#[test]
fn malformed_input_is_input_error() {
    let dir = TempDir::new().unwrap();
    let config = settings(dir.path());
    let input = dir.path().join("broken.json");
    std::fs::write(&input, "{ not json").unwrap();

    nt_core()
        .arg("--config")
        .arg(&config)
        .args(["render", "--input"])
        .arg(&input)
        .assert()
        .code(12)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn invalid_settings_is_config_error() {
    let dir = TempDir::new().unwrap();
    let config = write_json(
        dir.path(),
        "notifier.json",
        &json!({"params_filters": [{"pattern": "(unclosed"}]}),
    );
    let input = order_error(dir.path());

    nt_core()
        .arg("--config")
        .arg(&config)
        .args(["render", "--input"])
        .arg(&input)
        .assert()
        .code(11)
        .stderr(predicate::str::contains("config error"));
}

#[test]
fn check_reports_settings() {
    let dir = TempDir::new().unwrap();
    let config = settings(dir.path());

    let output = nt_core()
        .arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["valid"], true);
    assert_eq!(report["source"], "CLI argument");
    assert_eq!(report["environment_name"], "staging");
    assert_eq!(report["api_key_set"], true);
    assert_eq!(report["params_filters"], 2);
    assert!(!output.windows(11).any(|w| w == b"project-key"));
}

#[test]
fn unknown_format_fails() {
    nt_core()
        .args(["render", "--format", "yaml", "--input", "-"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error"));
}
