use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "pitwall-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_strategies_writes_output() {
    let exe = env!("CARGO_BIN_EXE_pitwall-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-strategies", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available strategies"));
    assert!(content.contains("wear-threshold"));
}

#[test]
fn cli_json_report_to_stdout_is_clean_json() {
    let exe = env!("CARGO_BIN_EXE_pitwall-tester");
    let output = Command::new(exe)
        .args([
            "--strategies",
            "one-stop,caution-opportunist",
            "--seeds",
            "1..3,0x10",
            "--iterations",
            "2",
            "--laps",
            "20",
            "--report",
            "json",
        ])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is json");
    let results = value["results"].as_array().expect("results array");
    assert_eq!(results.len(), 2 * 3);
    assert!(results.iter().all(|r| r["passed"] == serde_json::json!(true)));
    assert_eq!(value["aggregates"].as_array().expect("aggregates").len(), 2);
}

#[test]
fn cli_csv_report_with_config_file() {
    let exe = env!("CARGO_BIN_EXE_pitwall-tester");
    let config_path = temp_path("config.json");
    std::fs::write(
        &config_path,
        r#"{ "total_laps": 10, "full_caution_prob": 0.2 }"#,
    )
    .expect("write config");
    let output_path = temp_path("report.csv");
    let status = Command::new(exe)
        .args(["--strategies", "stay-out", "--seeds", "5", "--iterations", "3"])
        .arg("--config")
        .arg(&config_path)
        .args(["--report", "csv", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let csv = std::fs::read_to_string(output_path).expect("read csv");
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows.len(), 4);
    assert!(rows[1].starts_with("stay-out,5,10,"));
}

#[test]
fn cli_rejects_unknown_strategy_and_bad_seed() {
    let exe = env!("CARGO_BIN_EXE_pitwall-tester");
    let unknown = Command::new(exe)
        .args(["--strategies", "full-send", "--report", "json"])
        .output()
        .expect("run cli");
    assert!(!unknown.status.success());
    assert!(String::from_utf8_lossy(&unknown.stderr).contains("unknown strategy"));

    let bad_seed = Command::new(exe)
        .args(["--seeds", "spa", "--report", "json"])
        .output()
        .expect("run cli");
    assert!(!bad_seed.status.success());
    assert!(String::from_utf8_lossy(&bad_seed.stderr).contains("Unrecognized seed token"));
}

#[test]
fn cli_render_prints_lap_lines() {
    let exe = env!("CARGO_BIN_EXE_pitwall-tester");
    let output = Command::new(exe)
        .args([
            "--strategies",
            "ers-manager",
            "--iterations",
            "1",
            "--laps",
            "3",
            "--render",
        ])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Pitwall Strategy Tester"));
    assert!(stdout.contains("Lap 3/3 | Stint"));
    assert!(stdout.contains("Total time"));
}

#[test]
fn cli_races_config_seed_unless_seeds_are_given() {
    let exe = env!("CARGO_BIN_EXE_pitwall-tester");
    let config_path = temp_path("seeded.json");
    std::fs::write(&config_path, r#"{ "total_laps": 4, "seed": 9 }"#).expect("write config");

    let from_config = Command::new(exe)
        .args(["--strategies", "stay-out", "--iterations", "1", "--report", "csv"])
        .arg("--config")
        .arg(&config_path)
        .output()
        .expect("run cli");
    assert!(from_config.status.success());
    let csv = String::from_utf8_lossy(&from_config.stdout);
    assert!(csv.lines().nth(1).expect("one race").starts_with("stay-out,9,4,"));

    let overridden = Command::new(exe)
        .args(["--strategies", "stay-out", "--seeds", "2", "--iterations", "1"])
        .args(["--report", "csv"])
        .arg("--config")
        .arg(&config_path)
        .output()
        .expect("run cli");
    assert!(overridden.status.success());
    let csv = String::from_utf8_lossy(&overridden.stdout);
    assert!(csv.lines().nth(1).expect("one race").starts_with("stay-out,2,4,"));
    assert!(String::from_utf8_lossy(&overridden.stderr).contains("Ignoring config seed 9"));
}
