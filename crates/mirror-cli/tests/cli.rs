//! CLI command integration tests.
//! Each test uses a temp directory via MIRROR_DATA_DIR for full isolation.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::process::{Child, Command as StdCommand, Stdio};
use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const EGO: &str = "I am more enlightened than most people and they are chosen to suffer";

fn mirror_cmd(data_dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("mirror").unwrap();
    cmd.env("MIRROR_DATA_DIR", data_dir.path());
    cmd.env_remove("MIRROR_CONFIG");
    cmd
}

fn extract_stat_value<'a>(output: &'a str, key: &str) -> &'a str {
    output
        .lines()
        .find(|l| l.trim_start().starts_with(key))
        .and_then(|l| l.split(':').nth(1))
        .map(str::trim)
        .unwrap_or("")
}

#[test]
fn classify_prints_category_and_scores() {
    let dir = TempDir::new().unwrap();
    mirror_cmd(&dir)
        .args(["classify", EGO])
        .assert()
        .success()
        .stdout(predicate::str::contains("category: spiritual_ego (score 0.40)"))
        .stdout(predicate::str::contains("victim_consciousness"));
}

#[test]
fn classify_empty_is_default() {
    let dir = TempDir::new().unwrap();
    mirror_cmd(&dir)
        .args(["classify", ""])
        .assert()
        .success()
        .stdout(predicate::str::contains("category: presence (default"));
}

#[test]
fn classify_json() {
    let dir = TempDir::new().unwrap();
    let output = mirror_cmd(&dir)
        .args(["classify", "--json", "I trust and accept"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["category"], "surrender_flow");
    assert_eq!(json["is_default"], false);
    assert_eq!(json["scores"].as_array().unwrap().len(), 7);
}

#[test]
fn respond_logs_then_stats_and_history() {
    let dir = TempDir::new().unwrap();

    mirror_cmd(&dir)
        .args(["respond", "--name", "Maya", EGO])
        .assert()
        .success()
        .stdout(predicate::str::contains("Maya"));

    mirror_cmd(&dir)
        .args(["respond", "I feel love"])
        .assert()
        .success()
        .stdout(predicate::str::contains("friend"));

    let output = mirror_cmd(&dir).arg("stats").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(extract_stat_value(&stdout, "logged:"), "2");
    assert_eq!(extract_stat_value(&stdout, "spiritual_ego:"), "1");
    assert_eq!(extract_stat_value(&stdout, "heart_opening:"), "1");

    mirror_cmd(&dir)
        .args(["history", "--limit", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[heart_opening] I feel love"))
        .stdout(predicate::str::contains("spiritual_ego").not());
}

#[test]
fn respond_no_log_leaves_log_empty() {
    let dir = TempDir::new().unwrap();
    mirror_cmd(&dir)
        .args(["respond", "--no-log", "afraid"])
        .assert()
        .success();

    mirror_cmd(&dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("logged:     0"));
}

#[test]
fn respond_with_seed_is_repeatable() {
    let dir = TempDir::new().unwrap();
    let run = || {
        mirror_cmd(&dir)
            .args(["respond", "--no-log", "--seed", "9", "I am worried"])
            .output()
            .unwrap()
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn history_empty() {
    let dir = TempDir::new().unwrap();
    mirror_cmd(&dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("(no interactions logged)"));
}

#[test]
fn demo_runs_every_category() {
    let dir = TempDir::new().unwrap();
    let output = mirror_cmd(&dir)
        .args(["demo", "--seed", "1"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for category in [
        "spiritual_ego",
        "victim_consciousness",
        "fear_consciousness",
        "control_patterns",
        "heart_opening",
        "surrender_flow",
        "presence",
    ] {
        assert!(stdout.contains(&format!("[{category} ")), "missing {category}");
    }
    assert!(stdout.contains("> (empty)"));

    // Demo never writes to the log
    mirror_cmd(&dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("logged:     0"));
}

#[test]
fn export_writes_json() {
    let dir = TempDir::new().unwrap();
    mirror_cmd(&dir).args(["respond", "trust"]).assert().success();

    let path = dir.path().join("out.json");
    mirror_cmd(&dir)
        .arg("export")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("exported 1 interactions"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json[0]["category"], "surrender_flow");
    assert_eq!(json[0]["query"], "trust");
}

#[test]
fn categories_toml_roundtrips_as_table() {
    let dir = TempDir::new().unwrap();
    let output = mirror_cmd(&dir)
        .args(["categories", "--toml"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let table_path = dir.path().join("table.toml");
    std::fs::write(&table_path, &output.stdout).unwrap();

    mirror_cmd(&dir)
        .arg("--table")
        .arg(&table_path)
        .arg("categories")
        .assert()
        .success()
        .stdout(predicate::str::contains("presence [light] (default)"))
        .stdout(predicate::str::contains("keywords: enlightened, chosen"));
}

#[test]
fn custom_table_file() {
    let dir = TempDir::new().unwrap();
    let table_path = dir.path().join("custom.toml");
    std::fs::write(
        &table_path,
        r#"
default = "calm"

[[category]]
name = "rush"
tone = "shadow"
keywords = ["hurry", "late"]
template = "Slow down, {name}."

[[category]]
name = "calm"
tone = "light"
template = "All is well, {name}."
"#,
    )
    .unwrap();

    mirror_cmd(&dir)
        .arg("--table")
        .arg(&table_path)
        .args(["respond", "--no-log", "--name", "Bo", "running late"])
        .assert()
        .success()
        .stdout(predicate::str::diff("Slow down, Bo.\n"));
}

#[test]
fn invalid_table_file_fails() {
    let dir = TempDir::new().unwrap();
    let table_path = dir.path().join("bad.toml");
    std::fs::write(
        &table_path,
        "default = \"x\"\n[[category]]\nname = \"x\"\ntone = \"light\"\ntemplate = \"no name\"\n",
    )
    .unwrap();

    mirror_cmd(&dir)
        .arg("--table")
        .arg(&table_path)
        .args(["classify", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must contain {name}"));
}

#[test]
fn config_file_sets_subject() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("mirror.toml"),
        "[responder]\nsubject = \"wanderer\"\n",
    )
    .unwrap();

    mirror_cmd(&dir)
        .args(["respond", "--no-log", ""])
        .assert()
        .success()
        .stdout(predicate::str::contains("wanderer"));
}

// --- serve ---

struct Server(Child);

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

/// Start `mirror serve` on an ephemeral port and return it with its address.
fn spawn_serve(dir: &TempDir) -> (Server, String) {
    let mut child = StdCommand::new(env!("CARGO_BIN_EXE_mirror"))
        .args(["serve", "--addr", "127.0.0.1:0", "--seed", "4"])
        .env("MIRROR_DATA_DIR", dir.path())
        .env_remove("MIRROR_CONFIG")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn mirror serve");

    let stdout = child.stdout.take().expect("stdout pipe");
    let mut line = String::new();
    BufReader::new(stdout).read_line(&mut line).unwrap();
    let addr = line
        .trim()
        .strip_prefix("listening on http://")
        .unwrap_or_else(|| panic!("unexpected banner: {line:?}"))
        .to_string();
    (Server(child), addr)
}

fn http(addr: &str, method: &str, path: &str, body: Option<&str>) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

    let body = body.unwrap_or("");
    write!(
        stream,
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
    .unwrap();

    let mut raw = String::new();
    stream.read_to_string(&mut raw).unwrap();
    let status = raw
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let body = raw
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_default();
    (status, body)
}

#[test]
fn serve_answers_http() {
    let dir = TempDir::new().unwrap();
    let (_server, addr) = spawn_serve(&dir);

    let (status, body) = http(&addr, "GET", "/health", None);
    assert_eq!(status, 200);
    assert!(body.contains("ok"));

    let (status, body) = http(
        &addr,
        "POST",
        "/api/consciousness",
        Some(&format!(r#"{{"query": "{EGO}", "name": "Maya"}}"#)),
    );
    assert_eq!(status, 200);
    assert!(body.contains("spiritual_ego"), "body: {body}");
    assert!(body.contains("Maya"));

    let (status, body) = http(&addr, "POST", "/api/consciousness", Some("{not json"));
    assert_eq!(status, 400);
    assert!(body.contains("error"));

    let (status, body) = http(&addr, "GET", "/api/stats", None);
    assert_eq!(status, 200);
    assert!(body.contains(r#""logged":1"#), "body: {body}");

    let (status, body) = http(&addr, "GET", "/", None);
    assert_eq!(status, 200);
    assert!(body.contains("<form"));
}
