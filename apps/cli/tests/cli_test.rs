//! Integration tests for the `ncv` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builds a command isolated from any real user configuration.
fn ncv(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ncv").unwrap();
    cmd.env("HOME", home.path()).current_dir(home.path());
    cmd
}

fn write_topology(dir: &TempDir) -> PathBuf {
    let topology = json!({
        "devices": [
            {"id": "dev-sw1", "name": "SW-1", "type": "switch", "ip": "10.0.0.2",
             "position": {"x": 400.0, "y": 400.0}},
            {"id": "dev-r1", "name": "R-1", "type": "router",
             "hardware": {"vendor": "Acme", "firmware": {"version": "2.0"}},
             "position": {"x": 400.0, "y": 180.0}}
        ],
        "connections": [
            {"id": "conn-1", "fromDeviceId": "dev-r1", "toDeviceId": "dev-sw1"}
        ]
    });
    let path = dir.path().join("topology.json");
    fs::write(&path, serde_json::to_string_pretty(&topology).unwrap()).unwrap();
    path
}

fn device_events(name: &str) -> String {
    let input = json!({
        "device": {"name": name, "type": "switch"},
        "connections": [{"toDeviceName": "SW-1"}],
        "reasoning": "edge closet",
        "confidence": "high"
    })
    .to_string();
    let (head, tail) = input.split_at(input.len() / 2);
    [
        json!({"kind": "text_delta", "index": 0, "text": "Adding a switch."}),
        json!({"kind": "block_start", "index": 1, "blockType": "tool_use", "blockId": "toolu_1",
               "toolName": "suggest_device_addition"}),
        json!({"kind": "json_delta", "index": 1, "fragment": head}),
        json!({"kind": "json_delta", "index": 1, "fragment": tail}),
        json!({"kind": "block_stop", "index": 1}),
    ]
    .iter()
    .map(Value::to_string)
    .collect::<Vec<_>>()
    .join("\n")
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).unwrap()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    ncv(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("replay"))
        .stdout(predicate::str::contains("propose"))
        .stdout(predicate::str::contains("place"))
        .stdout(predicate::str::contains("tools"));
}

#[test]
fn test_tools_json_lists_catalogue() {
    let home = TempDir::new().unwrap();
    let output = ncv(&home).args(["tools", "--json"]).assert().success().get_output().stdout.clone();
    let tools = stdout_json(&output);
    let names: Vec<&str> = tools.as_array().unwrap().iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names.len(), 8);
    assert!(names.contains(&"suggest_device_addition"));
    assert!(names.contains(&"request_import"));
}

#[test]
fn test_tools_filter_human_output() {
    let home = TempDir::new().unwrap();
    ncv(&home)
        .args(["tools", "--filter", "vlan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("suggest_vlan_creation"))
        .stdout(predicate::str::contains("suggest_device_addition").not());
}

#[test]
fn test_replay_surfaces_single_device() {
    let home = TempDir::new().unwrap();
    let topology = write_topology(&home);
    let events = write(&home, "turn.jsonl", &device_events("SW-2"));

    let output = ncv(&home)
        .args(["replay", path_str(&events), "--topology", path_str(&topology), "--seed", "7", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report = stdout_json(&output);
    assert_eq!(report["outcome"]["pending"]["kind"], "device");
    assert_eq!(report["outcome"]["text"], "Adding a switch.");
    assert!(report.get("receipt").is_none());
}

#[test]
fn test_replay_approve_writes_topology() {
    let home = TempDir::new().unwrap();
    let topology = write_topology(&home);
    let events = write(&home, "turn.jsonl", &device_events("SW-2"));
    let out = home.path().join("after.json");

    ncv(&home)
        .args(["replay", path_str(&events), "--topology", path_str(&topology), "--seed", "7", "--approve"])
        .args(["--out", path_str(&out)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Committed"));

    let after = stdout_json(&fs::read(&out).unwrap());
    let devices = after["devices"].as_array().unwrap();
    assert_eq!(devices.len(), 3);
    assert!(devices.iter().any(|d| d["name"] == "SW-2"));
    assert_eq!(after["connections"].as_array().unwrap().len(), 2);
}

#[test]
fn test_replay_duplicate_has_nothing_to_approve() {
    let home = TempDir::new().unwrap();
    let topology = write_topology(&home);
    let events = write(&home, "turn.jsonl", &device_events(" sw-1 "));

    ncv(&home)
        .args(["replay", path_str(&events), "--topology", path_str(&topology), "--approve"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to approve"));
}

#[test]
fn test_replay_interrupted_turn_restores_input() {
    let home = TempDir::new().unwrap();
    let topology = write_topology(&home);
    let events = format!(
        "{}\n{}",
        json!({"kind": "text_delta", "index": 0, "text": "Working on it"}),
        json!({"kind": "transport_error", "message": "connection reset"})
    );
    let events = write(&home, "turn.jsonl", &events);

    let output = ncv(&home)
        .args(["replay", path_str(&events), "--topology", path_str(&topology), "--json"])
        .args(["--input", "add a core switch"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report = stdout_json(&output);
    assert_eq!(report["outcome"]["failed"], true);
    assert_eq!(report["outcome"]["restoredInput"], "add a core switch");
}

#[test]
fn test_replay_sse_capture() {
    let home = TempDir::new().unwrap();
    let topology = write_topology(&home);
    let frames = [
        json!({"type": "content_block_start", "index": 0,
               "content_block": {"type": "tool_use", "id": "toolu_9", "name": "suggest_vlan_creation", "input": {}}}),
        json!({"type": "content_block_delta", "index": 0,
               "delta": {"type": "input_json_delta", "partial_json": "{\"vlanId\": 30, \"name\": \"voice\", \"reasoning\": \"phones\", \"confidence\": \"high\"}"}}),
        json!({"type": "content_block_stop", "index": 0}),
        json!({"type": "message_stop"}),
    ];
    let capture: String = frames.iter().map(|f| format!("data: {}\n\n", f)).collect();
    let events = write(&home, "turn.sse", &capture);

    let output = ncv(&home)
        .args(["replay", path_str(&events), "--sse", "--topology", path_str(&topology), "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report = stdout_json(&output);
    assert_eq!(report["outcome"]["pending"]["kind"], "change");
}

#[test]
fn test_replay_missing_events_file_fails() {
    let home = TempDir::new().unwrap();
    let topology = write_topology(&home);
    ncv(&home)
        .args(["replay", "missing.jsonl", "--topology", path_str(&topology)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read events file"));
}

#[test]
fn test_propose_reports_diff() {
    let home = TempDir::new().unwrap();
    let topology = write_topology(&home);
    let message = "Upgrading the router.\n```json\n{\"action\": \"propose_changes\", \"deviceIds\": [\"dev-r1\"], \
                   \"updates\": {\"hardware.firmware.version\": \"2.1\"}, \"summary\": \"Firmware upgrade\"}\n```\n";
    let message = write(&home, "message.md", message);

    let output = ncv(&home)
        .args(["propose", path_str(&message), "--topology", path_str(&topology), "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let proposal = stdout_json(&output);
    assert_eq!(proposal["validation"]["valid"], true);
    let change = &proposal["affectedDevices"][0]["changes"]["hardware.firmware.version"];
    assert_eq!(change["old"], "2.0");
    assert_eq!(change["new"], "2.1");
}

#[test]
fn test_propose_strict_fails_on_unknown_device() {
    let home = TempDir::new().unwrap();
    let topology = write_topology(&home);
    let message = "```json\n{\"action\": \"propose_changes\", \"deviceIds\": [\"dev-gone\"], \
                   \"updates\": {\"notes\": \"rack 4\"}, \"summary\": \"Annotate\"}\n```";
    let message = write(&home, "message.md", message);

    ncv(&home)
        .args(["propose", path_str(&message), "--topology", path_str(&topology), "--strict"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("dev-gone"))
        .stderr(predicate::str::contains("Proposal is blocked"));
}

#[test]
fn test_propose_without_block() {
    let home = TempDir::new().unwrap();
    let topology = write_topology(&home);
    let message = write(&home, "message.md", "Nothing to change today.");

    ncv(&home)
        .args(["propose", path_str(&message), "--topology", path_str(&topology)])
        .assert()
        .success()
        .stdout(predicate::str::contains("No proposal found"));
}

#[test]
fn test_place_near_connected_device() {
    let home = TempDir::new().unwrap();
    let topology = write_topology(&home);

    let output = ncv(&home)
        .args(["place", "AP-1", "--type", "ap", "--connect", "SW-1", "--seed", "3", "--json"])
        .args(["--topology", path_str(&topology)])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let result = stdout_json(&output);
    assert_eq!(result["placement"]["strategy"], "near_connected");
    assert!(result["existing"].is_null());
}

#[test]
fn test_place_reports_existing_match() {
    let home = TempDir::new().unwrap();
    let topology = write_topology(&home);

    ncv(&home)
        .args(["place", "sw-1", "--type", "switch", "--topology", path_str(&topology), "--seed", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("matches existing device dev-sw1 by name"));
}

#[test]
fn test_place_rejects_unknown_type() {
    let home = TempDir::new().unwrap();
    let topology = write_topology(&home);

    ncv(&home)
        .args(["place", "X", "--type", "toaster", "--topology", path_str(&topology)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown device type 'toaster'"));
}

#[test]
fn test_local_config_selects_json_output() {
    let home = TempDir::new().unwrap();
    write(&home, ".netcanvasrc", "[output]\nformat = \"json\"\n");

    let output = ncv(&home).arg("tools").assert().success().get_output().stdout.clone();
    assert!(stdout_json(&output).is_array());
}

#[test]
fn test_invalid_pipeline_file_fails() {
    let home = TempDir::new().unwrap();
    let config = write(&home, "pipeline.toml", "[placement]\ngrid_size = -5.0\n");

    ncv(&home)
        .args(["tools", "--config", path_str(&config)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("grid_size"));
}
