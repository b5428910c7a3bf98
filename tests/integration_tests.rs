use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn jsts() -> Command {
    Command::cargo_bin("jsts").expect("binary exists")
}

fn project_dir() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/project")
}

fn score_json(args: &[&str]) -> Value {
    let output = jsts()
        .args(["-p", project_dir(), "-f", "json", "score"])
        .args(args)
        .output()
        .expect("command runs");
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).expect("valid json")
}

fn file_names(json: &Value) -> Vec<String> {
    json["files"]
        .as_array()
        .expect("files array")
        .iter()
        .map(|f| f["file"].as_str().expect("file path").replace('\\', "/"))
        .collect()
}

// ---------------------------------------------------------------------------
// CLI smoke tests
// ---------------------------------------------------------------------------

#[test]
fn test_help_output() {
    jsts()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("testability"));
}

#[test]
fn test_version_output() {
    jsts()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("jsts"));
}

#[test]
fn test_score_text_output() {
    jsts()
        .args(["-p", project_dir(), "score"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Scores per file"))
        .stdout(predicate::str::contains("AVERAGE"))
        .stdout(predicate::str::contains("simple.js"));
}

#[test]
fn test_score_markdown_output() {
    jsts()
        .args(["-p", project_dir(), "-f", "markdown", "score", "--metrics"])
        .assert()
        .success()
        .stdout(predicate::str::contains("| FILE | SCORE |"))
        .stdout(predicate::str::contains("Metric scores (values) per file - 1 / 3"));
}

#[test]
fn test_score_with_metric_tables() {
    jsts()
        .args(["-p", project_dir(), "score", "--metrics"])
        .assert()
        .success()
        .stdout(predicate::str::contains("locM"))
        .stdout(predicate::str::contains("dpF_max"));
}

// ---------------------------------------------------------------------------
// Discovery and scoring
// ---------------------------------------------------------------------------

#[test]
fn test_score_discovers_only_source_files() {
    let json = score_json(&[]);
    let names = file_names(&json);

    assert_eq!(names.len(), 3);
    assert!(names.iter().any(|n| n.ends_with("/simple.js")));
    assert!(names.iter().any(|n| n.ends_with("/complex.js")));
    assert!(names.iter().any(|n| n.ends_with("/lib/deep/utils.ts")));
    assert!(!names.iter().any(|n| n.contains("node_modules")));
    assert!(!names.iter().any(|n| n.contains("__tests__")));
    assert!(!names.iter().any(|n| n.ends_with("app.min.js")));
    assert_eq!(json["summary"]["files_discovered"], 3);
}

#[test]
fn test_simple_file_scores_higher() {
    let json = score_json(&[]);
    let score = |suffix: &str| {
        json["files"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["file"].as_str().unwrap().ends_with(suffix))
            .unwrap()["score"]
            .as_f64()
            .unwrap()
    };
    assert!(score("simple.js") > score("complex.js"));

    for file in json["files"].as_array().unwrap() {
        let acc = file["accumulated_rank"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&acc));
    }
    assert!(json["average"].as_f64().is_some());
}

#[test]
fn test_score_output_is_deterministic() {
    let run = || {
        jsts()
            .args(["-p", project_dir(), "score", "--metrics"])
            .output()
            .expect("command runs")
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn test_metrics_command_json() {
    let output = jsts()
        .args(["-p", project_dir(), "-f", "json", "metrics"])
        .output()
        .expect("command runs");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    let complex = json["files"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["path"].as_str().unwrap().ends_with("complex.js"))
        .unwrap();
    assert!(complex["values"]["ccM"].as_f64().unwrap() > 5.0);
    assert_eq!(complex["values"]["ecM"], 2.0);
    assert!(complex["values"]["ccF"]["max"].is_number());
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

#[test]
fn test_empty_directory_reports_no_files() {
    let temp = TempDir::new().unwrap();
    jsts()
        .args(["-p", temp.path().to_str().unwrap(), "score"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No files were found"));
}

#[test]
fn test_missing_path_fails() {
    jsts()
        .args(["-p", "/nonexistent/jsts/path", "score"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_file_path_fails() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/project/simple.js");
    jsts()
        .args(["-p", path, "score"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn test_fail_under_threshold() {
    jsts()
        .args(["-p", project_dir(), "score", "--fail-under", "100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Threshold violation"));

    jsts()
        .args(["-p", project_dir(), "score", "--fail-under", "0"])
        .assert()
        .success();
}

#[test]
fn test_custom_dataset() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data.json");
    std::fs::write(
        &data,
        r#"{"metrics": ["ccM"], "values": {"ccM": [1, 2, 3]}, "moduleRanks": [10, 50]}"#,
    )
    .unwrap();

    let json = score_json(&["--data", data.to_str().unwrap()]);
    let first = &json["files"][0];
    assert_eq!(first["metric_ranks"].as_array().unwrap().len(), 1);
    assert_eq!(json["metric_keys"], serde_json::json!(["ccM"]));
}

#[test]
fn test_malformed_dataset_fails() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data.json");
    std::fs::write(&data, "{ not json").unwrap();

    jsts()
        .args(["-p", project_dir(), "score", "--data", data.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Reference dataset error"));
}

#[test]
fn test_missing_config_file_fails() {
    jsts()
        .args(["-p", project_dir(), "-c", "/nonexistent/jsts.toml", "score"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn test_config_file_applies() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("jsts.toml");
    std::fs::write(&config, "[discovery]\nexclude = [\"lib/**\"]\n").unwrap();

    let output = jsts()
        .args([
            "-p",
            project_dir(),
            "-c",
            config.to_str().unwrap(),
            "-f",
            "json",
            "score",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    let names = file_names(&json);
    assert_eq!(names.len(), 2);
    assert!(!names.iter().any(|n| n.ends_with("utils.ts")));
}
