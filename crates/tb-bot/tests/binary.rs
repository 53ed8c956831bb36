//! Drives the `timebot` binary through its JSON-lines console transport.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use serde_json::{Value, json};
use tempfile::TempDir;

fn timebot_binary() -> String {
    env!("CARGO_BIN_EXE_timebot").to_string()
}

fn write_config(temp: &Path, extra: &str) -> std::path::PathBuf {
    let db_path = temp.join("data/timebot.db");
    let config_path = temp.join("config.toml");
    std::fs::write(
        &config_path,
        format!("database_path = \"{}\"\n{extra}", db_path.display()),
    )
    .unwrap();
    config_path
}

fn run(temp: &Path, config: &Path, input: &str) -> Output {
    let mut child = Command::new(timebot_binary())
        .env("HOME", temp)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start timebot");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn text_event(user: i64, text: &str) -> String {
    json!({
        "sender": {"id": user, "name": "Ann"},
        "event": {"type": "text", "text": text},
    })
    .to_string()
}

fn outbound(output: &Output) -> Vec<Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout carries JSON lines"))
        .collect()
}

#[test]
fn test_console_session_tracks_a_task() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "");

    let input = [
        text_event(10, "hello"),
        text_event(10, "⏭ Skip"),
        "this is not an event".to_string(),
        text_event(10, "⏰ Start"),
        text_event(10, "Docs"),
        text_event(10, "⏹️ Stop"),
        text_event(10, "❌ No"),
        text_event(10, "📊 Today"),
    ]
    .join("\n");

    let output = run(temp.path(), &config, &input);
    assert!(
        output.status.success(),
        "timebot should exit cleanly at end of input: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let messages = outbound(&output);
    assert!(messages.iter().all(|m| m["to"] == 10));
    assert!(messages[0]["text"]
        .as_str()
        .unwrap()
        .ends_with("First, which timezone are you in?"));
    assert_eq!(messages[0]["keyboard"]["kind"], "reply");

    let last = messages.last().unwrap();
    assert_eq!(last["type"], "text");
    let report = last["text"].as_str().unwrap();
    assert!(report.starts_with("📊 Report for"), "{report}");
    assert!(report.contains("• Docs: 00:00:"), "{report}");

    assert!(temp.path().join("data/timebot.db").exists());
}

#[test]
fn test_entries_survive_restart() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "");

    let first = [
        text_event(11, "hello"),
        text_event(11, "Samara (UTC+4)"),
        text_event(11, "⏰ Start"),
        text_event(11, "Planning"),
        text_event(11, "⏹️ Stop"),
        text_event(11, "❌ No"),
    ]
    .join("\n");
    assert!(run(temp.path(), &config, &first).status.success());

    // A running timer is not persisted, but the stored entry and timezone are.
    let second = [text_event(11, "📊 Today")].join("\n");
    let output = run(temp.path(), &config, &second);
    assert!(output.status.success());
    let messages = outbound(&output);
    assert_eq!(messages.len(), 1);
    assert!(messages[0]["text"].as_str().unwrap().contains("• Planning"));
}

#[test]
fn test_invalid_config_fails() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "broadcast_delay_ms = \"soon\"");

    let output = run(temp.path(), &config, "");
    assert!(!output.status.success());
    assert!(
        String::from_utf8_lossy(&output.stderr).contains("failed to load configuration"),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
}
