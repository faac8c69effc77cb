//! Integration tests for the kiln CLI

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("config.toml"), "").expect("write config");
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn lockfile(&self) -> PathBuf {
        self.path().join("kiln.lock.json")
    }

    fn cache(&self) -> PathBuf {
        self.path().join("cache")
    }

    fn add_package_source(&self, name: &str, version: &str) -> PathBuf {
        let source = self.path().join("sources").join(name);
        std::fs::create_dir_all(source.join("lib")).expect("create source");
        std::fs::write(
            source.join("manifest.toml"),
            format!("[package]\nname = \"{name}\"\nversion = \"{version}\"\n\n[dependencies]\nshared = \"^1\"\n"),
        )
        .expect("write manifest");
        std::fs::write(source.join("lib/index.js"), format!("// {name}\n")).expect("write file");
        source
    }

    fn write_lockfile(&self, packages: &Value) {
        let lockfile = json!({ "version": 1, "packages": packages });
        std::fs::write(
            self.lockfile(),
            serde_json::to_string_pretty(&lockfile).expect("serialize"),
        )
        .expect("write lockfile");
    }

    fn read_lockfile(&self) -> Value {
        let contents = std::fs::read_to_string(self.lockfile()).expect("read lockfile");
        serde_json::from_str(&contents).expect("parse lockfile")
    }

    fn kiln(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_kiln"))
            .arg("--config")
            .arg(self.path().join("config.toml"))
            .arg("--cache-dir")
            .arg(self.cache())
            .arg("--color")
            .arg("never")
            .args(args)
            .arg("--lockfile")
            .arg(self.lockfile())
            .env_remove("KILN_CONCURRENCY")
            .env_remove("KILN_CACHE_DIR")
            .env_remove("KILN_FETCH_TIMEOUT")
            .env_remove("KILN_OUTPUT")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute kiln")
    }

    fn kiln_json(&self, args: &[&str]) -> Value {
        let mut full = vec!["--json"];
        full.extend_from_slice(args);
        let output = self.kiln(&full);
        assert!(
            output.status.success(),
            "kiln failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout is JSON")
    }
}

fn copy_ref(name: &str, source: &Path) -> Value {
    json!({
        "name": name,
        "version": "1.0.0",
        "remote": { "type": "copy", "source": source.display().to_string() }
    })
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_kiln"))
        .arg("--help")
        .output()
        .expect("Failed to execute kiln");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fetch"));
    assert!(stdout.contains("status"));
}

#[test]
fn fetch_writes_hashes_back_then_hits_the_cache() {
    let ws = Workspace::new();
    let a = ws.add_package_source("a", "1.0.0");
    let b = ws.add_package_source("b", "2.1.0");
    ws.write_lockfile(&json!([copy_ref("a", &a), copy_ref("b", &b)]));

    let first = ws.kiln_json(&["fetch"]);
    assert_eq!(first["kind"], "fetch");
    assert_eq!(first["fetched"], 2);
    assert_eq!(first["cached"], 0);
    assert_eq!(first["lockfile_updated"], true);
    assert_eq!(first["packages"][0]["name"], "a");
    assert_eq!(first["packages"][0]["status"], "fetched");
    assert_eq!(first["packages"][0]["dependencies"], 1);

    let lockfile = ws.read_lockfile();
    let hash = lockfile["packages"][0]["remote"]["hash"]
        .as_str()
        .expect("hash written back")
        .to_string();
    assert_eq!(hash.len(), 64);
    assert!(lockfile["packages"][0]["remote"].get("resolved").is_none());

    let second = ws.kiln_json(&["fetch"]);
    assert_eq!(second["fetched"], 0);
    assert_eq!(second["cached"], 2);
    assert_eq!(second["lockfile_updated"], false);
    assert_eq!(second["packages"][1]["status"], "cached");
    assert_eq!(second["packages"][0]["hash"], hash.as_str());
}

#[test]
fn status_reports_cached_and_missing_packages() {
    let ws = Workspace::new();
    let a = ws.add_package_source("a", "1.0.0");
    ws.write_lockfile(&json!([copy_ref("a", &a)]));

    let before = ws.kiln_json(&["status"]);
    assert_eq!(before["kind"], "status");
    assert_eq!(before["packages"][0]["cached"], false);

    ws.kiln_json(&["fetch"]);

    let after = ws.kiln_json(&["status"]);
    assert_eq!(after["packages"][0]["cached"], true);
    let dest = PathBuf::from(after["packages"][0]["dest"].as_str().expect("dest"));
    assert!(dest.starts_with(ws.cache()));
    assert!(dest.join("manifest.toml").exists());
}

#[test]
fn optional_failures_are_skipped() {
    let ws = Workspace::new();
    let a = ws.add_package_source("a", "1.0.0");
    let mut missing = copy_ref("ghost", &ws.path().join("sources/ghost"));
    missing["optional"] = json!(true);
    ws.write_lockfile(&json!([copy_ref("a", &a), missing]));

    let report = ws.kiln_json(&["fetch"]);
    assert_eq!(report["fetched"], 1);
    assert_eq!(report["skipped"], 1);
    assert_eq!(report["packages"][1]["name"], "ghost");
    assert_eq!(report["packages"][1]["status"], "skipped");
    assert!(report["packages"][1]["error"].is_string());
}

#[test]
fn skipped_rows_follow_the_failed_version() {
    let ws = Workspace::new();
    let a = ws.add_package_source("a", "2.0.0");
    let mut current = copy_ref("a", &a);
    current["version"] = json!("2.0.0");
    let mut stale = copy_ref("a", &ws.path().join("sources/gone"));
    stale["optional"] = json!(true);
    ws.write_lockfile(&json!([stale, current]));

    let report = ws.kiln_json(&["fetch"]);
    assert_eq!(report["skipped"], 1);
    assert_eq!(report["packages"][0]["version"], "1.0.0");
    assert_eq!(report["packages"][0]["status"], "skipped");
    assert_eq!(report["packages"][0]["dependencies"], Value::Null);
    assert_eq!(report["packages"][1]["version"], "2.0.0");
    assert_eq!(report["packages"][1]["status"], "fetched");
    assert!(report["packages"][1]["error"].is_null());
    assert_eq!(report["packages"][1]["dependencies"], 1);
}

#[test]
fn unknown_transport_fails_the_run() {
    let ws = Workspace::new();
    ws.write_lockfile(&json!([{
        "name": "c",
        "version": "1.0.0",
        "remote": { "type": "svn", "source": "svn://example.invalid/c" }
    }]));

    let output = ws.kiln(&["fetch"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown fetcher for svn"));
    assert!(stderr.contains("Package: c"));
}

#[test]
fn frozen_fetch_leaves_the_lockfile_alone() {
    let ws = Workspace::new();
    let a = ws.add_package_source("a", "1.0.0");
    ws.write_lockfile(&json!([copy_ref("a", &a)]));
    let before = std::fs::read_to_string(ws.lockfile()).expect("read lockfile");

    let report = ws.kiln_json(&["fetch", "--frozen"]);
    assert_eq!(report["fetched"], 1);
    assert_eq!(report["lockfile_updated"], false);
    assert_eq!(
        std::fs::read_to_string(ws.lockfile()).expect("read lockfile"),
        before
    );
}

#[test]
fn zero_concurrency_is_rejected() {
    let ws = Workspace::new();
    ws.write_lockfile(&json!([]));

    let output = ws.kiln(&["fetch", "--concurrency", "0"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--concurrency"));
}
