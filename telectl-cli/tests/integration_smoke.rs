//! Smoke tests to verify command module wiring

use assert_cmd::Command;
use predicates::prelude::*;

fn telectl() -> Command {
    let mut cmd = Command::cargo_bin("telectl").unwrap();
    // Keep the user's real config and .env out of the picture
    cmd.env("HOME", std::env::temp_dir().join("telectl-smoke-home"))
        .env_remove("DATABASE_URL")
        .env_remove("TELECTL_ENDPOINT")
        .env_remove("TELECTL_QUERY_SERVICE_ENDPOINT");
    cmd
}

// === Pipelines ===

#[test]
fn test_pipelines_create_help() {
    telectl()
        .args(["pipelines", "create", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--file"));
}

#[test]
fn test_pipelines_create_rejects_invalid_file_locally() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(
        &path,
        r#"{"orderId": 0, "name": "nginx", "alias": "nginx", "filter": "true", "config": []}"#,
    )
    .unwrap();

    telectl()
        .args(["pipelines", "--endpoint", "http://127.0.0.1:1", "create", "--file"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("orderId"));
}

// === Rules ===

#[test]
fn test_rules_list_help() {
    telectl()
        .args(["rules", "list", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("drop or sampling"));
}

#[test]
fn test_rules_list_unknown_type() {
    telectl()
        .args(["rules", "list", "--type", "retain"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("retain"));
}

#[test]
fn test_rules_edit_rejects_negative_priority_locally() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edit.json");
    std::fs::write(
        &path,
        r#"{"ruleType": "drop", "name": "noisy", "priority": -3,
            "config": {"dropConfig": {"conditions": "a = 1"}}}"#,
    )
    .unwrap();

    telectl()
        .args(["rules", "--endpoint", "http://127.0.0.1:1", "edit", "r1", "--file"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("priority"));
}

#[test]
fn test_rules_outcome_help() {
    telectl()
        .args(["rules", "outcome", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DEPLOYED or FAILED"));
}

// === Attributes ===

#[test]
fn test_attributes_keys_help() {
    telectl()
        .args(["attributes", "keys", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--data-source"));
}

#[test]
fn test_attributes_unreachable_query_service() {
    telectl()
        .args(["attributes", "--endpoint", "http://127.0.0.1:1", "keys", "--search", "http"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to reach query service"));
}

// === Config ===

#[test]
fn test_config_path() {
    telectl()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".telectl/config.toml"));
}

#[test]
fn test_config_show_defaults() {
    telectl()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("127.0.0.1:3040"))
        .stdout(predicate::str::contains("query_service_endpoint"));
}

#[test]
fn test_config_show_redacts_database_password() {
    telectl()
        .args(["config", "show"])
        .env("DATABASE_URL", "postgres://telectl:hunter2@db/telectl")
        .assert()
        .success()
        .stdout(predicate::str::contains("telectl:***@db"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn test_malformed_global_env_file_is_reported() {
    let home = tempfile::tempdir().unwrap();
    let telectl_dir = home.path().join(".telectl");
    std::fs::create_dir_all(&telectl_dir).unwrap();
    std::fs::write(telectl_dir.join(".env"), "GOOD=1\nthis line has no equals sign\n").unwrap();

    telectl()
        .env("HOME", home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Failed to load"));
}

// === Server ===

#[cfg(feature = "server")]
#[test]
fn test_serve_help() {
    telectl()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--cors-permissive"));
}

#[cfg(feature = "server")]
#[test]
fn test_migrate_without_database_url() {
    telectl()
        .arg("migrate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATABASE_URL not set"));
}

// === Completions ===

#[test]
fn test_completions_bash() {
    telectl()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("telectl"));
}
