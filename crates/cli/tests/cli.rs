use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn social_state(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = online(dir);
    cmd.arg("--offline");
    cmd
}

fn online(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("social-state");
    cmd.current_dir(dir.path())
        .env("SOCIAL_STATE__GENERAL__STATE_PATH", state_path(dir.path()))
        .env("SOCIAL_STATE__GENERAL__FLUSH_DEBOUNCE_MS", "10");
    cmd
}

fn state_path(dir: &Path) -> std::path::PathBuf {
    dir.join("state.json")
}

fn create_post(dir: &TempDir) {
    social_state(dir)
        .args([
            "post",
            "create",
            "--title",
            "Hello there",
            "--body",
            "First local post",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created local:1"));
}

#[test]
fn config_init_writes_example_file() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("config.toml");

    let mut cmd = cargo_bin_cmd!("social-state");
    cmd.args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).expect("read config");
    assert!(content.contains("state_backend"));
    assert!(content.contains("viewer_id = 1"));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "# mine\n").expect("write config");

    let mut cmd = cargo_bin_cmd!("social-state");
    cmd.args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    assert_eq!(fs::read_to_string(&config_path).unwrap(), "# mine\n");
}

#[test]
fn like_survives_restart() {
    let dir = TempDir::new().expect("temp dir");
    create_post(&dir);

    social_state(&dir)
        .args(["like", "local:1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Liked local:1 (likes: 1)"));

    let output = social_state(&dir)
        .args(["feed", "list", "--liked", "--json"])
        .output()
        .expect("run feed list");
    assert!(output.status.success());

    let posts: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    let posts = posts.as_array().expect("array of posts");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["id"], "local:1");
    assert_eq!(posts[0]["counters"]["likes"], 1);
    assert_eq!(posts[0]["is_liked"], true);
    assert!(state_path(dir.path()).exists());
}

#[test]
fn second_like_is_a_no_op() {
    let dir = TempDir::new().expect("temp dir");
    create_post(&dir);

    social_state(&dir).args(["like", "local:1"]).assert().success();
    social_state(&dir)
        .args(["like", "local:1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Already liked local:1 (likes: 1)"));
}

#[test]
fn comments_are_listed_after_restart() {
    let dir = TempDir::new().expect("temp dir");
    create_post(&dir);

    social_state(&dir)
        .args(["comment", "add", "local:1", "--body", "Nice one"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added comment"));

    let output = social_state(&dir)
        .args(["comment", "list", "local:1", "--json"])
        .output()
        .expect("run comment list");
    assert!(output.status.success());

    let comments: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    let comments = comments.as_array().expect("array of comments");
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["body"], "Nice one");

    let output = social_state(&dir)
        .args(["feed", "list", "--json"])
        .output()
        .expect("run feed list");
    let posts: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(posts[0]["counters"]["comments"], 1);
}

#[test]
fn comments_of_unknown_post_list_empty() {
    let dir = TempDir::new().expect("temp dir");

    let output = social_state(&dir)
        .args(["comment", "list", "local:5", "--json"])
        .output()
        .expect("run comment list");
    assert!(output.status.success());
    let comments: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(comments, serde_json::json!([]));

    social_state(&dir)
        .args(["comment", "list", "dummyjson:404"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No comments"));
}

#[test]
fn stats_totals_local_engagement() {
    let dir = TempDir::new().expect("temp dir");
    create_post(&dir);
    social_state(&dir).args(["like", "local:1"]).assert().success();
    social_state(&dir)
        .args(["comment", "add", "local:1", "--body", "Nice one"])
        .assert()
        .success();

    let output = social_state(&dir)
        .args(["stats", "--json"])
        .output()
        .expect("run stats");
    assert!(output.status.success());

    let stats: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(stats["total_posts"], 1);
    assert_eq!(stats["total_likes"], 1);
    assert_eq!(stats["total_comments"], 1);
    assert_eq!(stats["total_shares"], 0);
    assert_eq!(stats["engagement_rate"], 2.0);
}

#[test]
fn stub_provider_syncs_without_network() {
    let dir = TempDir::new().expect("temp dir");

    let output = online(&dir)
        .env("SOCIAL_STATE__FEED__PROVIDER", "stub")
        .args(["feed", "sync", "--json"])
        .output()
        .expect("run feed sync");
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(report["total_posts"], 5);
    let sources = report["sources"].as_array().expect("array of sources");
    assert_eq!(sources.len(), 2);
    assert!(sources.iter().all(|s| s["error"].is_null()));
}

#[test]
fn memory_backend_keeps_nothing() {
    let dir = TempDir::new().expect("temp dir");

    social_state(&dir)
        .env("SOCIAL_STATE__GENERAL__STATE_BACKEND", "memory")
        .args(["post", "create", "--title", "Hello there", "--body", "Gone soon"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created local:1"));

    social_state(&dir)
        .env("SOCIAL_STATE__GENERAL__STATE_BACKEND", "memory")
        .args(["feed", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No posts"));

    assert!(!state_path(dir.path()).exists());
}

#[test]
fn like_unknown_post_fails() {
    let dir = TempDir::new().expect("temp dir");

    social_state(&dir)
        .args(["like", "local:99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Post not found"));
}

#[test]
fn anonymous_viewer_cannot_compose() {
    let dir = TempDir::new().expect("temp dir");

    social_state(&dir)
        .env("SOCIAL_STATE__IDENTITY__ANONYMOUS", "true")
        .args(["post", "create", "--title", "Hello there", "--body", "Body"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Authentication required"));

    assert!(!state_path(dir.path()).exists());
}

#[test]
fn deleted_post_disappears_from_feed() {
    let dir = TempDir::new().expect("temp dir");
    create_post(&dir);

    social_state(&dir)
        .args(["post", "delete", "local:1"])
        .assert()
        .success();

    social_state(&dir)
        .args(["feed", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No posts"));
}

#[test]
fn feed_sync_is_refused_offline() {
    let dir = TempDir::new().expect("temp dir");

    social_state(&dir)
        .args(["feed", "sync"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("offline"));
}

#[test]
fn doctor_reports_json() {
    let dir = TempDir::new().expect("temp dir");

    let output = social_state(&dir)
        .args(["doctor", "--json"])
        .output()
        .expect("run doctor");
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(report["overall"], "ok");
    assert_eq!(report["state"]["status"], "ok");
}
