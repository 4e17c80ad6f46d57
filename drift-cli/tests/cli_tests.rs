use std::fs;
use std::path::Path;

use assert_cmd::Command;
use filetime::FileTime;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

const STAMP: &str = "2021-03-04T05:06:07Z";
const STAMP_UNIX: i64 = 1_614_834_367;

fn drift() -> Command {
    let mut cmd = Command::cargo_bin("drift").expect("binary");
    cmd.env_remove("RUST_LOG");
    cmd
}

/// A store with one blob per `(content_ref, body)` and an empty index.
fn store(blobs: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("blobs")).unwrap();
    for (content_ref, body) in blobs {
        fs::write(dir.path().join("blobs").join(content_ref), body).unwrap();
    }
    fs::write(dir.path().join("index.json"), r#"{"entries": {}}"#).unwrap();
    dir
}

fn init(root: &Path, remote: &Path, jobs: usize) {
    drift()
        .arg("init")
        .arg(root)
        .arg("--remote")
        .arg(remote)
        .arg("--jobs")
        .arg(jobs.to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized drift context"));
}

fn write_plan(root: &Path, plan: serde_json::Value) {
    fs::write(
        root.join(".drift").join("plan.json"),
        serde_json::to_string_pretty(&plan).unwrap(),
    )
    .unwrap();
}

fn add(path: &str, content_ref: &str) -> serde_json::Value {
    json!({
        "path": path,
        "operation": "add",
        "source": {"id": path, "content_ref": content_ref, "mod_time": STAMP}
    })
}

#[test]
fn init_creates_context_file() {
    let root = TempDir::new().unwrap();
    let remote = store(&[]);
    init(root.path(), remote.path(), 3);

    let yaml = fs::read_to_string(root.path().join(".drift/context.yaml")).unwrap();
    assert!(yaml.contains("concurrency: 3"));
}

#[test]
fn pull_outside_a_context_fails() {
    let dir = TempDir::new().unwrap();
    drift()
        .current_dir(dir.path())
        .args(["pull", "--no-prompt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no drift context found"));
}

#[test]
fn pull_applies_every_add_with_remote_mtime() {
    let root = TempDir::new().unwrap();
    let blobs: Vec<(String, String)> = (0..5)
        .map(|i| (format!("b{i}"), format!("contents {i}")))
        .collect();
    let refs: Vec<(&str, &str)> = blobs
        .iter()
        .map(|(r, b)| (r.as_str(), b.as_str()))
        .collect();
    let remote = store(&refs);
    init(root.path(), remote.path(), 4);

    let plan: Vec<_> = (0..5)
        .map(|i| add(&format!("nested/{i}/file.txt"), &format!("b{i}")))
        .collect();
    write_plan(root.path(), json!(plan));

    drift()
        .current_dir(root.path())
        .args(["pull", "--no-prompt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied 5 change(s) in 2 window(s)"));

    for i in 0..5 {
        let path = root.path().join(format!("nested/{i}/file.txt"));
        assert_eq!(fs::read_to_string(&path).unwrap(), format!("contents {i}"));
        let mtime = FileTime::from_last_modification_time(&fs::metadata(&path).unwrap());
        assert_eq!(mtime.unix_seconds(), STAMP_UNIX);
    }
}

#[test]
fn jobs_flag_overrides_configured_window() {
    let root = TempDir::new().unwrap();
    let remote = store(&[]);
    init(root.path(), remote.path(), 4);
    write_plan(root.path(), json!([add("a", ""), add("b", ""), add("c", "")]));

    drift()
        .current_dir(root.path())
        .args(["pull", "--no-prompt", "-j", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("in 3 window(s)"));
}

#[test]
fn failed_download_exits_nonzero_and_names_the_path() {
    let root = TempDir::new().unwrap();
    let remote = store(&[("present", "ok")]);
    init(root.path(), remote.path(), 4);
    write_plan(
        root.path(),
        json!([add("good.txt", "present"), add("bad.txt", "missing")]),
    );

    drift()
        .current_dir(root.path())
        .args(["pull", "--no-prompt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad.txt"))
        .stderr(predicate::str::contains("1 of 2 change(s) failed"));

    assert!(root.path().join("good.txt").exists());
}

#[test]
fn dry_run_lists_changes_without_touching_disk() {
    let root = TempDir::new().unwrap();
    let remote = store(&[]);
    init(root.path(), remote.path(), 4);
    write_plan(root.path(), json!([add("new.txt", "")]));

    drift()
        .current_dir(root.path())
        .args(["pull", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("new.txt"))
        .stdout(predicate::str::contains("1 change(s) would be applied"));

    assert!(!root.path().join("new.txt").exists());
}

#[test]
fn declining_the_prompt_applies_nothing() {
    let root = TempDir::new().unwrap();
    let remote = store(&[]);
    init(root.path(), remote.path(), 4);
    write_plan(root.path(), json!([add("new.txt", "")]));

    drift()
        .current_dir(root.path())
        .arg("pull")
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 change(s) not applied"));

    assert!(!root.path().join("new.txt").exists());
}

#[test]
fn status_reports_pending_plan() {
    let root = TempDir::new().unwrap();
    let remote = store(&[]);
    init(root.path(), remote.path(), 2);
    write_plan(root.path(), json!([add("a", ""), add("b", "")]));

    drift()
        .current_dir(root.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 pending change(s)"));
}
