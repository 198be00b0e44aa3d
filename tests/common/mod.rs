#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

/// Run the binary in `cwd` (so no stray `transcriptor.toml` is picked up)
/// and return `(exit code, stdout, stderr)`.
pub fn run_cli(cwd: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_transcriptor"))
        .current_dir(cwd)
        .args(args)
        .output()
        .expect("failed to spawn binary");
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

/// Write one JSON value per line and return the file's path.
pub fn write_jsonl(dir: &Path, name: &str, lines: &[serde_json::Value]) -> PathBuf {
    let contents = lines
        .iter()
        .map(|v| serde_json::to_string(v).unwrap())
        .collect::<Vec<_>>()
        .join("\n");
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

pub fn user_text(text: &str, timestamp: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "user",
        "uuid": format!("u-{text}"),
        "isSidechain": false,
        "timestamp": timestamp,
        "message": { "role": "user", "content": text }
    })
}

pub fn assistant(content: serde_json::Value, timestamp: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "assistant",
        "isSidechain": false,
        "timestamp": timestamp,
        "message": {
            "role": "assistant",
            "model": "claude-sonnet-4-5-20250929",
            "content": content,
            "usage": { "input_tokens": 10, "output_tokens": 5 }
        }
    })
}

pub fn tool_results(ids: &[&str], output: &str) -> serde_json::Value {
    let blocks: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| serde_json::json!({ "type": "tool_result", "tool_use_id": id, "content": output }))
        .collect();
    serde_json::json!({
        "type": "user",
        "isSidechain": false,
        "message": { "role": "user", "content": blocks }
    })
}

/// A short session: question, shell command with a remark, then a
/// multi-step answer.
pub fn session() -> Vec<serde_json::Value> {
    use serde_json::json;
    vec![
        json!({ "type": "summary", "summary": "Listing files" }),
        user_text("What is in this repo?", "2025-03-01T09:00:00Z"),
        assistant(
            json!([{ "type": "tool_use", "id": "t1", "name": "Bash",
                     "input": { "command": "ls -la", "description": "List files" } }]),
            "2025-03-01T09:00:01Z",
        ),
        tool_results(&["t1"], "Cargo.toml\nsrc"),
        user_text("thanks", "2025-03-01T09:00:02Z"),
        assistant(
            json!([
                { "type": "thinking", "thinking": "check the manifest" },
                { "type": "tool_use", "id": "t2", "name": "Read", "input": { "file_path": "Cargo.toml" } }
            ]),
            "2025-03-01T09:00:03Z",
        ),
        tool_results(&["t2"], "[package]"),
        assistant(json!([{ "type": "text", "text": "It is a Rust crate." }]), "2025-03-01T09:00:04Z"),
    ]
}
