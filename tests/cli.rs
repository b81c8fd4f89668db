use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const SCHEMA_V1: &str = r#"{"$schema":"http://json-schema.org/draft-07/schema#","title":"porter.yaml v1"}"#;
const SCHEMA_V2: &str = r#"{"$schema":"http://json-schema.org/draft-07/schema#","title":"porter.yaml v2"}"#;

fn parse_jsonl(stdout: &[u8]) -> Vec<Value> {
    let s = String::from_utf8_lossy(stdout);
    s.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str::<Value>(l).expect("valid jsonl line"))
        .collect()
}

/// Write an executable `porter` stand-in
#[cfg(unix)]
fn write_porter(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("porter");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
fn porter_printing(dir: &Path, schema: &str) -> PathBuf {
    write_porter(
        dir,
        &format!(
            "if [ \"$1\" = \"schema\" ]; then printf '%s' '{}'; exit 0; fi\necho \"porter v1.0.0\"",
            schema
        ),
    )
}

struct Env {
    temp: TempDir,
    porter: PathBuf,
}

impl Env {
    fn state_dir(&self) -> PathBuf {
        self.temp.path().join("state")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("porter-yaml"));
        cmd.env_remove("RUST_LOG")
            .arg("--state-dir")
            .arg(self.state_dir())
            .arg("--porter")
            .arg(&self.porter)
            .arg("--no-color");
        cmd
    }

    fn persisted(&self) -> Option<String> {
        let content = fs::read_to_string(self.state_dir().join("state.json")).ok()?;
        let state: Value = serde_json::from_str(&content).unwrap();
        state["entries"]["last-porter-yaml-schema"]
            .as_str()
            .map(str::to_string)
    }
}

#[cfg(unix)]
fn env_with_schema(schema: &str) -> Env {
    let temp = tempdir().unwrap();
    let bin = temp.path().join("bin");
    fs::create_dir_all(&bin).unwrap();
    let porter = porter_printing(&bin, schema);
    Env { temp, porter }
}

#[test]
fn resolve_uri_matches_porter_manifests_only() {
    let temp = tempdir().unwrap();
    let env = Env {
        porter: temp.path().join("porter"),
        temp,
    };

    let assert = env
        .cmd()
        .arg("resolve-uri")
        .arg("bundles/wordpress/porter.yaml")
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["kind"], "schema_uri");
    assert_eq!(items[0]["detail"], "porter://schema/porter");

    let assert = env
        .cmd()
        .arg("resolve-uri")
        .arg("bundles/wordpress/values.yaml")
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[0]["kind"], "no_match");
}

#[cfg(unix)]
#[test]
fn first_refresh_loads_and_persists_schema() {
    let env = env_with_schema(SCHEMA_V1);

    let assert = env
        .cmd()
        .arg("refresh")
        .assert()
        .success()
        .stderr(predicate::str::contains("Loading porter.yaml schema..."))
        .stderr(predicate::str::contains(
            "Loaded porter.yaml schema. Please close and re-open porter.yaml for intellisense.",
        ));

    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[0]["kind"], "registered");
    assert_eq!(items[1]["kind"], "loaded");
    assert_eq!(items[1]["meta"]["bytes"], SCHEMA_V1.len());
    assert_eq!(env.persisted().as_deref(), Some(SCHEMA_V1));
}

#[cfg(unix)]
#[test]
fn unchanged_refresh_is_silent() {
    let env = env_with_schema(SCHEMA_V1);
    env.cmd().arg("refresh").assert().success();

    let assert = env
        .cmd()
        .arg("refresh")
        .assert()
        .success()
        .stderr(predicate::str::is_empty());

    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[1]["kind"], "unchanged");
}

#[cfg(unix)]
#[test]
fn changed_schema_is_reported_as_update() {
    let env = env_with_schema(SCHEMA_V1);
    env.cmd().arg("refresh").assert().success();

    porter_printing(env.porter.parent().unwrap(), SCHEMA_V2);
    let assert = env
        .cmd()
        .arg("refresh")
        .assert()
        .success()
        .stderr(predicate::str::contains("Updated porter.yaml schema."))
        .stderr(predicate::str::contains("Loading porter.yaml schema...").not());

    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[1]["kind"], "updated");
    assert_eq!(env.persisted().as_deref(), Some(SCHEMA_V2));
}

#[cfg(unix)]
#[test]
fn failed_refresh_keeps_cached_schema() {
    let env = env_with_schema(SCHEMA_V1);
    env.cmd().arg("refresh").assert().success();

    write_porter(
        env.porter.parent().unwrap(),
        "echo 'Error: porter is broken' >&2; exit 1",
    );
    let assert = env
        .cmd()
        .arg("refresh")
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "Porter intellisense may be out of date.",
        ))
        .stderr(predicate::str::contains(
            "Details: Unable to run Porter: Error: porter is broken",
        ));

    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[1]["kind"], "fetch_failed");
    assert_eq!(items[1]["detail"], "cached schema kept");
    assert_eq!(env.persisted().as_deref(), Some(SCHEMA_V1));
}

#[cfg(unix)]
#[test]
fn failed_first_refresh_warns_schema_unavailable() {
    let temp = tempdir().unwrap();
    let porter = write_porter(temp.path(), "echo 'no docker' >&2; exit 1");
    let env = Env { temp, porter };

    env.cmd()
        .arg("refresh")
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "Error loading Porter schema. Porter intellisense will not be available.",
        ));

    assert_eq!(env.persisted(), None);
}

#[cfg(unix)]
#[test]
fn resolve_content_serves_persisted_schema_without_porter() {
    let env = env_with_schema(SCHEMA_V1);
    env.cmd().arg("refresh").assert().success();

    // porter disappears; lookups still answer from the cache
    fs::remove_file(&env.porter).unwrap();

    env.cmd()
        .arg("--format")
        .arg("raw")
        .arg("resolve-content")
        .arg("porter://schema/porter")
        .assert()
        .success()
        .stdout(format!("{}\n", SCHEMA_V1));

    let assert = env
        .cmd()
        .arg("resolve-content")
        .arg("https://schema/porter")
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[0]["kind"], "no_match");
}

#[cfg(unix)]
#[test]
fn schema_round_trip_through_yaml_service() {
    let env = env_with_schema(SCHEMA_V1);
    env.cmd().arg("refresh").assert().success();

    let assert = env
        .cmd()
        .arg("schema")
        .arg("bundle/porter.yaml")
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[0]["kind"], "schema_content");
    assert_eq!(items[0]["subject"], "porter://schema/porter");
    assert_eq!(items[0]["detail"], SCHEMA_V1);
}

#[cfg(unix)]
#[test]
fn status_and_clear() {
    let env = env_with_schema(SCHEMA_V1);

    let assert = env.cmd().arg("status").assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[0]["detail"], "no schema cached");

    env.cmd().arg("refresh").assert().success();
    let assert = env.cmd().arg("status").assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[0]["kind"], "state");
    assert_eq!(items[0]["meta"]["bytes"], SCHEMA_V1.len());
    assert!(items[0]["meta"]["updated_at"].is_string());

    env.cmd().arg("clear").assert().success();
    assert_eq!(env.persisted(), None);
}

#[cfg(unix)]
#[test]
fn watch_stops_after_count() {
    let env = env_with_schema(SCHEMA_V1);

    let assert = env
        .cmd()
        .arg("watch")
        .arg("--interval")
        .arg("1")
        .arg("--count")
        .arg("2")
        .assert()
        .success();

    let kinds: Vec<_> = parse_jsonl(&assert.get_output().stdout)
        .iter()
        .map(|v| v["kind"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(kinds, vec!["registered", "loaded", "unchanged"]);
}

fn write_corrupt_state(env: &Env) {
    fs::create_dir_all(env.state_dir()).unwrap();
    fs::write(env.state_dir().join("state.json"), "{ not json").unwrap();
}

#[test]
fn clear_repairs_corrupt_state() {
    let temp = tempdir().unwrap();
    let env = Env {
        porter: temp.path().join("porter"),
        temp,
    };
    write_corrupt_state(&env);

    let assert = env.cmd().arg("clear").assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[0]["detail"], "cleared");

    let content = fs::read_to_string(env.state_dir().join("state.json")).unwrap();
    let state: Value = serde_json::from_str(&content).unwrap();
    assert_eq!(state["entries"], serde_json::json!({}));

    let assert = env.cmd().arg("doctor").assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert!(items[1]["detail"].as_str().unwrap().contains("0 entries"));
}

#[cfg(unix)]
#[test]
fn corrupt_state_degrades_to_no_schema() {
    let env = env_with_schema(SCHEMA_V1);
    write_corrupt_state(&env);

    env.cmd()
        .arg("--format")
        .arg("raw")
        .arg("resolve-content")
        .arg("porter://schema/porter")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let assert = env
        .cmd()
        .arg("refresh")
        .assert()
        .success()
        .stderr(predicate::str::contains("global state is corrupt"));
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[1]["kind"], "loaded");
    assert_eq!(env.persisted().as_deref(), Some(SCHEMA_V1));
}

#[cfg(unix)]
#[test]
fn failing_porter_with_corrupt_state_still_succeeds() {
    let temp = tempdir().unwrap();
    let porter = write_porter(temp.path(), "exit 1");
    let env = Env { temp, porter };
    write_corrupt_state(&env);

    env.cmd()
        .arg("refresh")
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "Porter intellisense will not be available.",
        ));
}

#[cfg(unix)]
#[test]
fn doctor_reports_porter_version() {
    let env = env_with_schema(SCHEMA_V1);

    let assert = env.cmd().arg("doctor").assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items.len(), 2);
    assert!(items[0]["detail"]
        .as_str()
        .unwrap()
        .contains("found: porter v1.0.0"));
}
