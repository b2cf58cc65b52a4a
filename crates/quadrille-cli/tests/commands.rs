//! Runs the built binary end to end

use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

const STATES: &str = r#"{
    "kind": "state",
    "states": [
        {"id": "init", "kind": "initial"},
        {"id": "Idle"},
        {"id": "Busy"},
        {"id": "done", "kind": "final"}
    ],
    "transitions": [
        {"from": "init", "to": "Idle"},
        {"from": "Idle", "to": "Busy", "trigger": {"type": "event", "name": "start"}},
        {"from": "Busy", "to": "done", "trigger": {"type": "after", "millis": 250}}
    ]
}"#;

fn quadrille() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_quadrille"));
    cmd.env("QUADRILLE_LOG_LEVEL", "off");
    cmd
}

#[test]
fn test_layout_from_file_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("states.json");
    fs::write(&input, STATES).unwrap();

    let output = quadrille().arg("layout").arg(&input).output().unwrap();
    assert!(output.status.success());
    let layout: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(layout["template"], "Linear Chain");
    assert_eq!(layout["nodes"].as_array().unwrap().len(), 4);
}

#[test]
fn test_render_from_stdin() {
    let mut child = quadrille()
        .args(["render", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(STATES.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let drawing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let texts: Vec<&str> = drawing["primitives"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|p| p["type"] == "text")
        .filter_map(|p| p["text"].as_str())
        .collect();
    assert!(texts.contains(&"start"));
    assert!(texts.contains(&"after(250ms)"));
}

#[test]
fn test_patterns_marks_selected_match() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("states.json");
    fs::write(&input, STATES).unwrap();

    let output = quadrille().arg("patterns").arg(&input).output().unwrap();
    assert!(output.status.success());
    let matches: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let chain = matches
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["template"] == "Linear Chain")
        .unwrap();
    assert_eq!(chain["selected"], true);
    assert_eq!(chain["roles"]["state_0"], "init");
}

#[test]
fn test_required_pattern_failure_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("lonely.json");
    fs::write(&input, r#"{"kind": "class", "classes": [{"id": "A", "name": "A"}], "relations": []}"#).unwrap();

    let output = quadrille()
        .args(["layout", "--strategy", "pattern"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No structural pattern matched"));
}

#[test]
fn test_templates_lists_registry() {
    let output = quadrille().args(["templates", "--json"]).output().unwrap();
    assert!(output.status.success());
    let templates: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(templates.as_array().unwrap().len(), 14);
}
