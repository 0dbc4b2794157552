//! Integration tests for deckctl

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const PANEL: &str = r#"
interface:
  expected_driver: F-16C
functions:
  - type: switch
    device: Electrical
    name: Battery
    device_id: "1"
    element: { id: "404" }
    action_id: "3001"
    positions:
      - { arg_value: "1.0", name: "On" }
      - { arg_value: "0.0", name: "Off" }
  - type: flag
    device: Caution
    name: Master Caution
    element: { id: "13", format: "%d" }
  - type: value
    device: Flight Instruments
    name: IAS
    element: { id: "51", format: "%0.4f", every_frame: true }
"#;

fn deckctl() -> Result<Command, Box<dyn std::error::Error>> {
    Ok(Command::cargo_bin("deckctl")?)
}

fn write_panel(dir: &TempDir, name: &str, text: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = dir.path().join(name);
    fs::write(&path, text)?;
    Ok(path)
}

#[test]
fn test_cli_help() -> TestResult {
    deckctl()?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("contract"))
        .stdout(predicate::str::contains("decode-alert"));
    Ok(())
}

#[test]
fn test_validate_human_and_json() -> TestResult {
    let dir = TempDir::new()?;
    let panel = write_panel(&dir, "panel.yaml", PANEL)?;

    deckctl()?
        .arg("validate")
        .arg(&panel)
        .assert()
        .success()
        .stdout(predicate::str::contains("functions: 3"));

    let output = deckctl()?.arg("validate").arg(&panel).arg("--json").output()?;
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["functions"], 3);
    assert_eq!(report["elements"], 3);
    assert_eq!(report["expected_driver"], "F-16C");
    Ok(())
}

#[test]
fn test_contract_lua_is_canonical() -> TestResult {
    let dir = TempDir::new()?;
    let panel = write_panel(&dir, "panel.yaml", PANEL)?;

    let first = deckctl()?.arg("contract").arg(&panel).output()?;
    let second = deckctl()?.arg("contract").arg(&panel).output()?;
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);

    let lua = String::from_utf8(first.stdout)?;
    let caution = lua.find("-- Caution.Master Caution").ok_or("missing caution")?;
    let battery = lua.find("-- Electrical.Battery").ok_or("missing battery")?;
    assert!(caution < battery);
    assert!(lua.contains("    [51] = \"%0.4f\",\n"));
    assert!(lua.contains("    [404] = \"%0.1f\",\n"));
    Ok(())
}

#[test]
fn test_contract_json_to_file() -> TestResult {
    let dir = TempDir::new()?;
    let panel = write_panel(&dir, "panel.yaml", PANEL)?;
    let out = dir.path().join("contract.json");

    deckctl()?
        .args(["contract", "--format", "json", "--output"])
        .arg(&out)
        .arg(&panel)
        .assert()
        .success();
    let contract: Value = serde_json::from_str(&fs::read_to_string(&out)?)?;
    assert_eq!(contract["functions"].as_array().map(Vec::len), Some(3));
    Ok(())
}

#[test]
fn test_bindings_lists_actions() -> TestResult {
    let dir = TempDir::new()?;
    let panel = write_panel(&dir, "panel.yaml", PANEL)?;
    deckctl()?
        .arg("bindings")
        .arg(&panel)
        .assert()
        .success()
        .stdout(predicate::str::contains("Electrical.Battery.set"));
    Ok(())
}

#[test]
fn test_decode_alert() -> TestResult {
    deckctl()?
        .args(["decode-alert", "SGkhIQ--"])
        .assert()
        .success()
        .stdout("Hi!!\n");
    deckctl()?
        .args(["decode-alert", "%%%"])
        .assert()
        .code(4);
    Ok(())
}

#[test]
fn test_missing_profile_exit_code() -> TestResult {
    deckctl()?
        .args(["validate", "/nonexistent/panel.yaml"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Profile not found"));
    Ok(())
}

#[test]
fn test_duplicate_element_is_rejected() -> TestResult {
    let dir = TempDir::new()?;
    let panel = write_panel(
        &dir,
        "dup.yaml",
        r#"
functions:
  - { type: flag, device: A, name: One, element: { id: "7" } }
  - { type: flag, device: B, name: Two, element: { id: "7" } }
"#,
    )?;
    let output = deckctl()?.arg("validate").arg(&panel).arg("--json").output()?;
    assert_eq!(output.status.code(), Some(4));
    let report: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["success"], false);
    assert_eq!(report["error"]["type"], "validation_error");
    Ok(())
}

#[test]
fn test_run_stops_after_duration() -> TestResult {
    let dir = TempDir::new()?;
    let panel = write_panel(&dir, "panel.yaml", PANEL)?;
    deckctl()?
        .arg("run")
        .arg(&panel)
        .args(["--listen", "127.0.0.1:0", "--duration", "1"])
        .timeout(std::time::Duration::from_secs(20))
        .assert()
        .success()
        .stdout(predicate::str::contains("listening on 127.0.0.1:"));
    Ok(())
}
