use assert_cmd::prelude::*;
use rstest::rstest;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

const PROFILE: &str = r#"{
  "name": "Lever",
  "final_weight_target": 40.0,
  "stages": [
    { "name": "Fill", "type": "flow", "dynamics": { "points": [[0, 4], [3, 4]] },
      "exit_triggers": [{ "type": "time", "value": 3, "comparison": ">=", "relative": true }] },
    { "name": "Peak", "type": "pressure", "dynamics": { "points": [[0, 9]] } },
    { "name": "Decline", "type": "flow", "dynamics": { "points": [[0, 2.5], [10, 1.5]], "over": "weight" },
      "exit_triggers": [{ "type": "weight", "value": 40, "comparison": ">=" }] }
  ]
}"#;

const SHOT_JSON: &str = r#"[
  { "time_s": 0.0, "stage": "Fill", "weight_g": 0.0, "pressure_bar": 1.0, "flow_ml_s": 4.0 },
  { "time_s": 3.0, "stage": "Fill", "weight_g": 0.5, "pressure_bar": 2.0, "flow_ml_s": 4.1 },
  { "time_s": 4.0, "stage": "Peak", "weight_g": 2.0, "pressure_bar": 9.0, "flow_ml_s": 2.0 },
  { "time_s": 10.0, "stage": "Peak", "weight_g": 14.0, "pressure_bar": 9.0, "flow_ml_s": 2.0 },
  { "time_s": 11.0, "stage": "Decline", "weight_g": 16.0, "pressure_bar": 8.0, "flow_ml_s": 2.4 },
  { "time_s": 21.0, "stage": "Decline", "weight_g": 26.0, "pressure_bar": 6.0, "flow_ml_s": 1.6 },
  { "time_s": 31.0, "stage": "Decline", "weight_g": 40.0, "pressure_bar": 4.0, "flow_ml_s": 1.4 }
]"#;

fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
    let dir = tempdir().unwrap();
    let profile = dir.path().join("profile.json");
    let shot = dir.path().join("shot.json");
    fs::write(&profile, PROFILE).unwrap();
    fs::write(&shot, SHOT_JSON).unwrap();
    (dir, profile, shot)
}

fn shot_cmd(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("shot").unwrap();
    cmd.arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(dir.path().join("absent.toml"));
    cmd
}

fn single_json_line(out: &[u8]) -> Value {
    let stdout = String::from_utf8_lossy(out);
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 1, "stdout was: {stdout}");
    serde_json::from_str(lines[0]).expect("valid JSON")
}

/// Validate the report schema for a successful analysis.
#[rstest]
fn analyze_report_schema() {
    let (dir, profile, shot) = setup();
    let out = shot_cmd(&dir)
        .arg("analyze")
        .arg("--profile")
        .arg(&profile)
        .arg("--shot")
        .arg(&shot)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = single_json_line(&out);

    assert_eq!(v["profile_name"], "Lever");
    assert_eq!(v["shot"]["sample_count"], 7);
    assert_eq!(v["weight"]["status"], "on_target");
    assert!(v["unreached_stages"].as_array().unwrap().is_empty());

    let stages = v["stages"].as_array().unwrap();
    assert_eq!(stages.len(), 3);
    for s in stages {
        assert!(s["stage_name"].is_string());
        assert!(s["status"].is_string());
        assert!(s["message"].is_string());
        // number or null
        assert!(s["profile_target"].is_number() || s["profile_target"].is_null());
        assert!(s["achieved_value"].is_number() || s["achieved_value"].is_null());
    }
    let decline = &stages[2];
    assert_eq!(decline["control_type"], "flow");
    assert_eq!(decline["achieved_value"], 1.4);
    assert_eq!(decline["trend"]["trend"], "declining");
    assert_eq!(decline["exit"]["primary"], 0);

    // weight-domain stage is anchored through the recorded weight: 10 g after its start is t = 21
    let times: Vec<f64> = v["target_curves"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|p| p["stage_name"] == "Decline")
        .map(|p| p["time_s"].as_f64().unwrap())
        .collect();
    assert_eq!(times, vec![11.0, 21.0]);

    // missing piston data is not worth a flag
    assert!(v["flags"].as_array().unwrap().is_empty());
}

#[rstest]
fn estimate_schema() {
    let (dir, profile, _) = setup();
    let out = shot_cmd(&dir)
        .arg("estimate")
        .arg("--profile")
        .arg(&profile)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = single_json_line(&out);
    let points = v["target_curves"].as_array().unwrap();
    assert_eq!(points[0]["target_flow"], 4.0);
    assert!(points[0].get("target_pressure").is_none());
    let peak = points.iter().find(|p| p["stage_name"] == "Peak").unwrap();
    assert_eq!(peak["time_s"], 3.0);
    assert_eq!(peak["target_pressure"], 9.0);
    assert!(v["flags"].as_array().unwrap().is_empty());
}

/// Rejected inputs produce a JSON error object with a stable reason.
#[rstest]
fn error_schema() {
    let (dir, profile, _) = setup();
    let shot = dir.path().join("nan.json");
    fs::write(
        &shot,
        r#"[{ "time_s": 0.0, "stage": "Fill" }, { "time_s": -1.0, "stage": "Fill" }]"#,
    )
    .unwrap();
    let out = shot_cmd(&dir)
        .arg("analyze")
        .arg("--profile")
        .arg(&profile)
        .arg("--shot")
        .arg(&shot)
        .assert()
        .code(4)
        .get_output()
        .stdout
        .clone();
    let v = single_json_line(&out);
    assert_eq!(v["reason"], "UnorderedSamples");
    assert_eq!(v["details"]["index"], 1);
    assert!(v["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[rstest]
fn batch_emits_one_object_per_shot() {
    let (dir, profile, shot) = setup();
    let out = shot_cmd(&dir)
        .arg("batch")
        .arg("--profile")
        .arg(&profile)
        .arg(&shot)
        .arg(&shot)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&out);
    let values: Vec<Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(values.len(), 2);
    assert!(values.iter().all(|v| v["report"]["profile_name"] == "Lever"));
    assert_eq!(values[0]["report"], values[1]["report"]);
}
