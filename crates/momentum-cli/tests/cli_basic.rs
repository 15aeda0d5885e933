//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_momentum-cli"))
        .args(args)
        .env("MOMENTUM_DATA_DIR", data_dir)
        .env_remove("MOMENTUM_LOG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &Path, args: &[&str]) -> Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("stdout should be JSON")
}

fn event_types(events: &Value) -> Vec<String> {
    events
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["type"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_complete_builds_streak() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "ledger.utc_offset_minutes", "0"]);
    assert_eq!(code, 0);

    let first = run_json(dir.path(), &["complete", "a"]);
    assert_eq!(first["outcome"]["momentum"]["streak_count"], 1);
    assert_eq!(first["outcome"]["award"]["display_amount"], 10);

    run_json(dir.path(), &["complete", "b"]);
    let third = run_json(dir.path(), &["complete", "c", "--x", "12.5", "--y", "40"]);
    assert_eq!(third["outcome"]["momentum"]["streak_count"], 3);
    assert_eq!(third["outcome"]["award"]["display_amount"], 15);
    assert_eq!(third["outcome"]["award"]["is_bonus"], true);

    let types = event_types(&third["events"]);
    assert!(types.contains(&"momentum_changed".to_string()));
    assert!(types.contains(&"celebration_triggered".to_string()));
    let celebration = third["events"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["type"] == "celebration_triggered")
        .unwrap();
    assert_eq!(celebration["position"]["x"], 12.5);
}

#[test]
fn test_status_reports_totals() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["complete", "a"]);
    let status = run_json(dir.path(), &["status"]);
    assert_eq!(status["ledger"]["total_points"], 10);
    assert_eq!(status["momentum"]["is_active"], true);
    assert_eq!(status["focus_state"], "idle");
    assert_eq!(status["blocking"]["is_blocking"], false);
}

#[test]
fn test_daily_goal_event() {
    let dir = tempfile::tempdir().unwrap();
    let goals = run_json(dir.path(), &["goal", "daily", "2"]);
    assert_eq!(goals["daily_goal"], 2);

    let first = run_json(dir.path(), &["complete", "a"]);
    assert!(!event_types(&first["events"]).contains(&"daily_goal_reached".to_string()));
    let second = run_json(dir.path(), &["complete", "b"]);
    assert!(event_types(&second["events"]).contains(&"daily_goal_reached".to_string()));
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "focus.work_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "focus.work_minutes", "40"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "focus.work_minutes"]);
    assert_eq!(stdout.trim(), "40");

    let (stdout, _, code) = run_cli(dir.path(), &["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.trim().ends_with("config.toml"));
}

#[test]
fn test_config_rejects_bad_values() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "focus.work_minutes", "0"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error"));

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "no.such.key"]);
    assert_ne!(code, 0);
}

#[test]
fn test_focus_runs_to_break_time() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &[
            "focus", "start", "a", "--seconds", "3", "--deep", "--apps", "Chat,Video",
            "--tick-ms", "5",
        ],
    );
    assert_eq!(code, 0, "focus failed: {stderr}");

    let events: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be JSON"))
        .collect();
    let types: Vec<&str> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
    assert_eq!(types.first(), Some(&"blocking_state_changed"));
    assert!(types.contains(&"focus_completed"));

    let blocking: Vec<&Value> = events
        .iter()
        .filter(|e| e["type"] == "blocking_state_changed")
        .collect();
    assert_eq!(blocking[0]["session"]["is_deep_focus"], true);
    assert_eq!(blocking[0]["session"]["can_cancel"], false);
    assert_eq!(blocking[0]["session"]["selection_summary"], "2 apps");
    assert_eq!(blocking.last().unwrap()["session"]["is_blocking"], false);

    let last = events.last().unwrap();
    assert_eq!(last["type"], "focus_session_changed");
    assert_eq!(last["session"]["state"], "break_time");
}

#[test]
fn test_reset_clears_combo() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["complete", "a"]);
    let reset = run_json(dir.path(), &["reset"]);
    assert_eq!(reset["type"], "engine_reset");
    let status = run_json(dir.path(), &["status"]);
    assert_eq!(status["momentum"]["streak_count"], 0);
    assert_eq!(status["ledger"]["total_points"], 10);
}
