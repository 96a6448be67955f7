//! Integration tests for the draftdesk binary
//!
//! Each test runs in its own temp directory with an explicit state path so
//! no ambient draftdesk.toml is picked up.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const TEST_JOB: &str = r#"{
    "beats": [
        {
            "id": "b1",
            "title": "Opening",
            "text": "Intro text",
            "rejectedOptions": [
                { "id": "d1", "name": "Noir", "text": "Rain on neon." }
            ]
        },
        {
            "id": "b2",
            "title": "Turn",
            "text": "Second beat"
        }
    ]
}"#;

/// Get a Command instance for the draftdesk binary
#[allow(deprecated)]
fn draftdesk_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("draftdesk").expect("Failed to find draftdesk binary");
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .arg("--state")
        .arg(dir.join("workspace_state.json"))
        .timeout(std::time::Duration::from_secs(10));
    cmd
}

fn submit_job(dir: &Path) {
    let job_path = dir.join("job.json");
    fs::write(&job_path, TEST_JOB).expect("Failed to write job");
    draftdesk_cmd(dir)
        .arg("submit")
        .arg(&job_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Submitted 2 beat(s)"));
}

#[test]
fn test_cost_uses_default_pricing() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    draftdesk_cmd(temp_dir.path())
        .arg("cost")
        .arg("1000")
        .arg("1000")
        .assert()
        .success()
        .stdout(predicate::str::contains("Input tokens:  1000 ($0.0030)"))
        .stdout(predicate::str::contains("Output tokens: 1000 ($0.0150)"))
        .stdout(predicate::str::contains("Total:         $0.0180"));
}

#[test]
fn test_cost_reads_pricing_from_config_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("custom.toml");
    fs::write(
        &config_path,
        "[pricing]\nprice_per_input_token = 0.01\nprice_per_output_token = 0.02\nmodel_name = \"house\"\n",
    )
    .expect("Failed to write config");

    draftdesk_cmd(temp_dir.path())
        .arg("--config")
        .arg(&config_path)
        .arg("cost")
        .arg("10")
        .arg("5")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pricing:       house"))
        .stdout(predicate::str::contains("Total:         $0.2000"));
}

#[test]
fn test_missing_config_file_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    draftdesk_cmd(temp_dir.path())
        .arg("--config")
        .arg(temp_dir.path().join("absent.toml"))
        .arg("show")
        .assert()
        .failure();
}

#[test]
fn test_show_empty_workspace() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    draftdesk_cmd(temp_dir.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"beats\": []"))
        .stdout(predicate::str::contains("\"formattedTotal\": \"$0.0000\""));
}

#[test]
fn test_submit_then_prompt() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    submit_job(temp_dir.path());
    assert!(temp_dir.path().join("workspace_state.json").exists());

    draftdesk_cmd(temp_dir.path())
        .arg("prompt")
        .arg("b1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Intro text"))
        .stdout(predicate::str::contains("Use baseline tone only."))
        .stdout(predicate::str::contains("None provided."));

    draftdesk_cmd(temp_dir.path())
        .arg("prompt")
        .arg("b1")
        .arg("--donor")
        .arg("d1")
        .arg("--instruction")
        .arg("Shorter")
        .assert()
        .success()
        .stdout(predicate::str::contains("Donor style (Noir):"))
        .stdout(predicate::str::contains("Rain on neon."))
        .stdout(predicate::str::contains("Shorter"));
}

#[test]
fn test_draft_is_persisted_and_shown() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    submit_job(temp_dir.path());

    draftdesk_cmd(temp_dir.path())
        .arg("draft")
        .arg("b1")
        .arg("--donor")
        .arg("d1")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sourceOption\": \"Noir\""));

    draftdesk_cmd(temp_dir.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"isSelected\": true"))
        .stdout(predicate::str::contains("in the style of Noir"));
}

#[test]
fn test_prompt_unknown_beat_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    submit_job(temp_dir.path());

    draftdesk_cmd(temp_dir.path())
        .arg("prompt")
        .arg("nope")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("beat not found: nope"));
}

#[test]
fn test_select_unknown_version_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    submit_job(temp_dir.path());

    draftdesk_cmd(temp_dir.path())
        .arg("select")
        .arg("b1")
        .arg("missing")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found: missing"));
}

#[test]
fn test_invalid_state_file_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(
        temp_dir.path().join("workspace_state.json"),
        r#"{"beats": "oops"}"#,
    )
    .expect("Failed to write state");

    draftdesk_cmd(temp_dir.path())
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation error"));
}

#[test]
fn test_system_failure_exits_with_one() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    draftdesk_cmd(temp_dir.path())
        .arg("submit")
        .arg(temp_dir.path().join("missing.json"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn test_tools_lists_selection() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    draftdesk_cmd(temp_dir.path())
        .arg("tools")
        .arg("satire")
        .arg("--limit")
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains("satire-010"))
        .stdout(predicate::str::contains("Storyboarding Tool 001"));

    draftdesk_cmd(temp_dir.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"selection\""))
        .stdout(predicate::str::contains("Satire Tool 010"));
}

#[test]
fn test_archetype_and_runtime() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    draftdesk_cmd(temp_dir.path())
        .arg("archetype")
        .assert()
        .success()
        .stdout(predicate::str::contains("Heroic Insight (720s)"))
        .stdout(predicate::str::contains("Micro Doc"));

    draftdesk_cmd(temp_dir.path())
        .arg("archetype")
        .arg("micro doc")
        .assert()
        .success()
        .stdout(predicate::str::contains("Laid out 3 beat(s): Setup, Clip, Tag"));

    draftdesk_cmd(temp_dir.path())
        .arg("runtime")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 0.0 min of 15.0 min"))
        .stdout(predicate::str::contains("Note: Setup text is empty"));

    draftdesk_cmd(temp_dir.path())
        .arg("archetype")
        .arg("Saga")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("archetype not found: Saga"));
}
