use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn insp_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("insp");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[server]
bind = "127.0.0.1:0"

[store]
backend = "sqlite"
path = "{}/data/insp.sqlite"

[enrichment]
provider = "disabled"
"#,
        root.display()
    );

    let config_path = config_dir.join("insp.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_insp(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = insp_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run insp binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

/// Pull the record id out of `insp add` / `insp get` output.
fn extract_id(stdout: &str) -> String {
    stdout
        .lines()
        .find_map(|l| l.strip_prefix("id:"))
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| panic!("no id line in output: {}", stdout))
}

#[test]
fn test_init_creates_store() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_insp(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/insp.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_insp(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_insp(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_add_uses_fallback_enrichment() {
    let (_tmp, config_path) = setup_test_env();
    run_insp(&config_path, &["init"]);

    let (stdout, stderr, success) = run_insp(&config_path, &["add", "我想做一个语音记录的APP"]);
    assert!(success, "add failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("category:   技术创新"));
    assert!(stdout.contains("应用开发"));
    assert!(extract_id(&stdout).starts_with("inspiration_"));
}

#[test]
fn test_add_get_delete_cycle() {
    let (_tmp, config_path) = setup_test_env();
    run_insp(&config_path, &["init"]);

    let (stdout, _, success) = run_insp(&config_path, &["add", "weekend hiking plan"]);
    assert!(success);
    let id = extract_id(&stdout);

    let (stdout, _, success) = run_insp(&config_path, &["get", &id]);
    assert!(success);
    assert!(stdout.contains("weekend hiking plan"));

    let (stdout, _, success) = run_insp(&config_path, &["delete", &id]);
    assert!(success);
    assert!(stdout.contains("Deleted"));

    let (_, stderr, success) = run_insp(&config_path, &["get", &id]);
    assert!(!success, "get after delete should fail");
    assert!(stderr.contains("not found"));

    let (_, _, success) = run_insp(&config_path, &["delete", &id]);
    assert!(!success, "second delete should fail");
}

#[test]
fn test_list_and_search() {
    let (_tmp, config_path) = setup_test_env();
    run_insp(&config_path, &["init"]);

    run_insp(&config_path, &["add", "an app for tracking habits"]);
    run_insp(&config_path, &["add", "family picnic next sunday"]);

    let (stdout, _, success) = run_insp(&config_path, &["list"]);
    assert!(success);
    assert!(stdout.contains("page 1/1, 2 items"));

    let (stdout, _, success) = run_insp(&config_path, &["list", "--search", "PICNIC"]);
    assert!(success);
    assert!(stdout.contains("family picnic"));
    assert!(!stdout.contains("tracking habits"));
    assert!(stdout.contains("1 items"));

    let (stdout, _, success) = run_insp(&config_path, &["list", "--category", "技术创新"]);
    assert!(success);
    assert!(stdout.contains("tracking habits"));
    assert!(!stdout.contains("family picnic"));
}

#[test]
fn test_list_empty() {
    let (_tmp, config_path) = setup_test_env();
    run_insp(&config_path, &["init"]);

    let (stdout, _, success) = run_insp(&config_path, &["list"]);
    assert!(success);
    assert!(stdout.contains("No inspirations found."));
    assert!(stdout.contains("page 1/0, 0 items"));
}

#[test]
fn test_add_blank_text_rejected() {
    let (_tmp, config_path) = setup_test_env();
    run_insp(&config_path, &["init"]);

    let (_, stderr, success) = run_insp(&config_path, &["add", "   "]);
    assert!(!success);
    assert!(stderr.contains("transcribedText"));

    let (stdout, _, _) = run_insp(&config_path, &["list"]);
    assert!(stdout.contains("0 items"));
}

#[test]
fn test_reindex_and_stats() {
    let (_tmp, config_path) = setup_test_env();
    run_insp(&config_path, &["init"]);
    run_insp(&config_path, &["add", "app one"]);
    run_insp(&config_path, &["add", "app two"]);

    let (stdout, _, success) = run_insp(&config_path, &["reindex"]);
    assert!(success);
    assert!(stdout.contains("Index rebuilt: 2 entries"));

    let (stdout, _, success) = run_insp(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("total items: 2"));
    assert!(stdout.contains("技术创新"));
}

#[test]
fn test_enrich_without_config() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("does-not-exist.toml");

    let (stdout, stderr, success) = run_insp(&missing, &["enrich", "design a new logo"]);
    assert!(success, "enrich failed: stderr={}", stderr);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["category"], "创意设计");
    assert!(value["tags"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("设计")));
}

#[test]
fn test_invalid_config_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("bad.toml");
    fs::write(&config_path, "[server]\nbind = \"x\"\n[store]\nbackend = \"redis\"\n").unwrap();

    let (_, stderr, success) = run_insp(&config_path, &["list"]);
    assert!(!success);
    assert!(stderr.contains("Unknown store backend"));
}
