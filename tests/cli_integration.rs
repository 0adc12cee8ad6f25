//! Integration tests for the practice CLI
//!
//! These tests exercise the full CLI workflow against a temporary data
//! directory. They verify that commands work end-to-end without mocking.

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Helper to run the practice CLI with a specific data directory
fn run_practice(args: &[&str], data_dir: &Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_practice"))
        .args(args)
        .env("PRACTICE_DATA_DIR", data_dir)
        .env("NO_COLOR", "1")
        .current_dir(data_dir)
        .output()
        .expect("Failed to execute practice")
}

/// Helper to get stdout as string
fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Helper to get stderr as string
fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Run a command that must succeed and return its stdout
fn ok(args: &[&str], data_dir: &Path) -> String {
    let output = run_practice(args, data_dir);
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        stderr(&output)
    );
    stdout(&output)
}

/// Add an item and return its id (the last word of the "Added" line)
fn add_item(args: &[&str], data_dir: &Path) -> String {
    let mut full = vec!["add"];
    full.extend_from_slice(args);
    let out = ok(&full, data_dir);
    out.split_whitespace()
        .last()
        .expect("add prints the new id")
        .to_string()
}

// =============================================================================
// Basic Command Tests
// =============================================================================

#[test]
fn test_help_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_practice"))
        .arg("--help")
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("practice"));
    assert!(out.contains("Practice tracker"));
}

#[test]
fn test_version_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_practice"))
        .arg("--version")
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    assert!(stdout(&output).contains("practice"));
}

// =============================================================================
// Shell Completion Tests
// =============================================================================

#[test]
fn test_completion_zsh() {
    let output = Command::new(env!("CARGO_BIN_EXE_practice"))
        .args(["completion", "zsh"])
        .output()
        .expect("Failed to execute");

    assert!(
        output.status.success(),
        "completion zsh failed: {}",
        stderr(&output)
    );
    assert!(
        stdout(&output).contains("#compdef practice"),
        "zsh completion should contain #compdef"
    );
}

#[test]
fn test_completion_bash() {
    let output = Command::new(env!("CARGO_BIN_EXE_practice"))
        .args(["completion", "bash"])
        .output()
        .expect("Failed to execute");

    assert!(output.status.success());
    assert!(stdout(&output).contains("_practice"));
}

// =============================================================================
// Init and Items
// =============================================================================

#[test]
fn test_init_writes_config_and_seeds_items() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let out = ok(&["init"], temp_dir.path());
    assert!(out.contains("Created"));
    assert!(temp_dir.path().join("config.toml").exists());

    // Running init again keeps the existing config
    let out = ok(&["init"], temp_dir.path());
    assert!(out.contains("Exists"));

    let out = ok(&["items"], temp_dir.path());
    assert!(out.contains("Ladies Night"));
    assert!(out.contains("Note Trainer"));
    assert!(out.contains("BassBuzz M1 L1"));
}

#[test]
fn test_add_and_filter_items_by_kind() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    add_item(&["Scale Drill", "-k", "exercise", "--burst", "-f", "focus=alternate picking"], temp_dir.path());
    add_item(&["Walking Line", "-k", "riff", "-f", "targetBpm=90"], temp_dir.path());

    let out = ok(&["items", "--kind", "exercise"], temp_dir.path());
    assert!(out.contains("Scale Drill"));
    assert!(!out.contains("Walking Line"));
    assert!(!out.contains("Ladies Night"));

    let out = ok(&["show", "Walking Line"], temp_dir.path());
    assert!(out.contains("Riff"));
    assert!(out.contains("90"));
}

#[test]
fn test_add_rejects_invalid_fields() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    // Resources need a link
    let output = run_practice(&["add", "Docs", "-k", "resource"], temp_dir.path());
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Error"));

    let output = run_practice(&["add", "Too Fast", "-k", "riff", "-f", "targetBpm=999"], temp_dir.path());
    assert!(!output.status.success());
}

#[test]
fn test_unknown_kind_is_rejected_by_parser() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_practice(&["add", "Thing", "-k", "banjo"], temp_dir.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("banjo"));
}

#[test]
fn test_edit_item() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let id = add_item(&["Groove", "-k", "riff"], temp_dir.path());

    ok(&["edit", &id, "--title", "Groove in E", "-f", "targetBpm=120", "--pinned", "true"], temp_dir.path());

    let out = ok(&["show", &id], temp_dir.path());
    assert!(out.contains("Groove in E"));
    assert!(out.contains("120"));

    let out = ok(&[], temp_dir.path());
    assert!(out.contains("Pinned"));
    assert!(out.contains("Groove in E"));
}

#[test]
fn test_show_missing_item_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_practice(&["show", "no-such-item"], temp_dir.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Not found"));
}

// =============================================================================
// BassBuzz and Logs
// =============================================================================

#[test]
fn test_workout_awards_notes() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let id = add_item(&["Lesson 3", "-k", "bassbuzz", "-f", "module=1", "-f", "lesson=3"], temp_dir.path());

    let out = ok(&["workout", &id, "slow"], temp_dir.path());
    assert!(out.contains("Slow workout"));
    assert!(out.contains("+2"));

    let out = ok(&["notes"], temp_dir.path());
    assert!(out.contains("2 note(s)"));

    let out = ok(&["logs", "--kind", "bassbuzz"], temp_dir.path());
    assert!(out.contains("Lesson 3"));
    assert!(out.contains("bassbuzz-slow"));

    let out = ok(&["logs", "--kind", "riff"], temp_dir.path());
    assert!(out.contains("No logs."));
}

#[test]
fn test_workout_on_non_lesson_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_practice(&["workout", "Ladies Night", "fast"], temp_dir.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("not a BassBuzz lesson"));
}

#[test]
fn test_toggle_completed() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let out = ok(&["toggle-completed", "BassBuzz M1 L1"], temp_dir.path());
    assert!(out.contains("is now done"));

    let out = ok(&["bassbuzz"], temp_dir.path());
    assert!(out.contains("[x]"));
    assert!(out.contains("M1 L1"));

    let out = ok(&["toggle-completed", "bassbuzz m1 l1"], temp_dir.path());
    assert!(out.contains("not done"));
}

#[test]
fn test_delete_removes_item_and_logs() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let id = add_item(&["Lesson 4", "-k", "bassbuzz", "-f", "module=1", "-f", "lesson=4"], temp_dir.path());
    ok(&["workout", &id, "lesson"], temp_dir.path());
    ok(&["workout", &id, "fast"], temp_dir.path());

    let out = ok(&["delete", &id, "--yes"], temp_dir.path());
    assert!(out.contains("Deleted"));

    let out = ok(&["logs"], temp_dir.path());
    assert!(out.contains("No logs."));
    let out = ok(&["notes"], temp_dir.path());
    assert!(out.contains("0 note(s)"));
}

#[test]
fn test_week_has_seven_days() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let out = ok(&["week"], temp_dir.path());
    assert_eq!(out.lines().filter(|l| l.contains("note(s)")).count(), 7);

    let out = ok(&["week", "--day", "2020-01-01"], temp_dir.path());
    assert!(out.contains("2020-01-01"));
    assert!(out.contains("Nothing logged."));
}

#[test]
fn test_last_calendar_day_is_an_error_not_a_crash() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    for args in [["week", "--day", "+262142-12-31"], ["logs", "--to", "+262142-12-31"]] {
        let output = run_practice(&args, temp_dir.path());
        assert_eq!(output.status.code(), Some(1), "{:?}", args);
        assert!(stderr(&output).contains("out of range"), "{:?}", args);
    }
}

// =============================================================================
// Export / Import
// =============================================================================

#[test]
fn test_export_to_stdout_is_json() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let out = ok(&["export", "-o", "-"], temp_dir.path());

    let doc: serde_json::Value = serde_json::from_str(&out).expect("export should be JSON");
    assert_eq!(doc["version"], "1.0");
    assert_eq!(doc["items"].as_array().map(|a| a.len()), Some(5));
    assert!(doc["exportDate"].is_string());
}

#[test]
fn test_export_then_import_into_fresh_dir() {
    let source = TempDir::new().expect("Failed to create temp dir");
    let id = add_item(&["Lesson 5", "-k", "bassbuzz", "-f", "module=2", "-f", "lesson=5"], source.path());
    ok(&["workout", &id, "middle"], source.path());

    let file = source.path().join("backup.json");
    let file_arg = file.to_str().expect("utf-8 temp path");
    let out = ok(&["export", "-o", file_arg], source.path());
    assert!(out.contains("Exported 6 item(s), 1 log(s)"));

    let target = TempDir::new().expect("Failed to create temp dir");
    let out = ok(&["import", file_arg], target.path());
    assert!(out.contains("Imported 6 item(s), 1 log(s)"));

    // A second import adds no duplicate logs
    let out = ok(&["import", file_arg], target.path());
    assert!(out.contains("(1 already present)"));

    let out = ok(&["notes"], target.path());
    assert!(out.contains("2 note(s)"));
}

#[test]
fn test_import_rejects_other_major_version() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let file = temp_dir.path().join("future.json");
    std::fs::write(&file, r#"{"version":"2.0","exportDate":"2024-03-05T12:00:00.000Z","items":[],"logs":[]}"#)
        .expect("write export");

    let output = run_practice(&["import", file.to_str().expect("utf-8 temp path")], temp_dir.path());
    assert_eq!(output.status.code(), Some(1));
}

// =============================================================================
// Storage backends
// =============================================================================

#[test]
fn test_sqlite_backend_from_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[storage]\nbackend = \"sqlite\"\nseed_on_empty = false\n",
    )
    .expect("write config");

    add_item(&["Scale Drill", "-k", "exercise", "--burst"], temp_dir.path());
    assert!(temp_dir.path().join("practice.db").exists());

    let out = ok(&["items"], temp_dir.path());
    assert!(out.contains("Scale Drill"));
    assert!(!out.contains("Ladies Night"));
}
