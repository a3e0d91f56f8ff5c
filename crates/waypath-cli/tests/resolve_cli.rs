//! Integration tests for `waypath resolve` and `waypath explain`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-q", "-p", "waypath-cli", "--bin", "waypath", "--"]);
    cmd
}

/// A small package: `package.json` with a main field, plus one sibling file.
fn project() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    fs::write(root.join("package.json"), r#"{"main": "lib/index.js"}"#).unwrap();
    fs::create_dir_all(root.join("lib")).unwrap();
    fs::write(root.join("lib/index.js"), "").unwrap();
    fs::write(root.join("util.js"), "").unwrap();
    (dir, root)
}

fn json_stdout(output: &std::process::Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("stdout should be valid JSON")
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn test_resolve_json_reports_main_field() {
    let (_dir, root) = project();
    let output = cargo_bin()
        .args(["--json", "resolve", ".", "--sync", "--from"])
        .arg(&root)
        .output()
        .expect("Failed to run resolve command");

    assert!(output.status.success(), "{output:?}");
    let json = json_stdout(&output);
    assert_eq!(json["ok"], true);
    assert_eq!(
        json["resolved"].as_str(),
        Some(path_str(&root.join("lib").join("index.js")).as_str())
    );
    assert_eq!(
        json["descriptionFile"].as_str(),
        Some(path_str(&root.join("package.json")).as_str())
    );
    assert_eq!(json["ignored"], false);
    assert!(json.get("log").is_none());
}

#[test]
fn test_resolve_async_prints_path() {
    let (_dir, root) = project();
    let output = cargo_bin()
        .args(["resolve", "./util", "--from"])
        .arg(&root)
        .output()
        .expect("Failed to run resolve command");

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), path_str(&root.join("util.js")));
}

#[test]
fn test_resolve_not_found_exits_with_one() {
    let (_dir, root) = project();
    let output = cargo_bin()
        .args(["--json", "resolve", "./missing", "--log", "--from"])
        .arg(&root)
        .output()
        .expect("Failed to run resolve command");

    assert_eq!(output.status.code(), Some(1));
    let json = json_stdout(&output);
    assert_eq!(json["ok"], false);
    assert_eq!(json["code"], "not_found");
    let missing = json["missing"].as_array().unwrap();
    assert!(missing
        .iter()
        .any(|m| m.as_str() == Some(path_str(&root.join("missing.js")).as_str())));
    assert!(!json["log"].as_array().unwrap().is_empty());
}

#[test]
fn test_resolve_with_alias_flag() {
    let (_dir, root) = project();
    let output = cargo_bin()
        .args(["--json", "resolve", "helpers", "--alias", "helpers$=./util", "--from"])
        .arg(&root)
        .output()
        .expect("Failed to run resolve command");

    assert!(output.status.success(), "{output:?}");
    let json = json_stdout(&output);
    assert_eq!(
        json["resolved"].as_str(),
        Some(path_str(&root.join("util.js")).as_str())
    );
}

#[test]
fn test_resolve_with_config_file() {
    let (_dir, root) = project();
    fs::write(root.join("styles.css"), "").unwrap();
    fs::write(root.join("waypath.json"), r#"{"extensions": [".css"]}"#).unwrap();

    let output = cargo_bin()
        .args(["--json", "resolve", "./styles", "--config", "waypath.json", "--cwd"])
        .arg(&root)
        .output()
        .expect("Failed to run resolve command");

    assert!(output.status.success(), "{output:?}");
    let json = json_stdout(&output);
    assert_eq!(
        json["resolved"].as_str(),
        Some(path_str(&root.join("styles.css")).as_str())
    );
}

#[test]
fn test_explain_traces_stages() {
    let (_dir, root) = project();
    let output = cargo_bin()
        .args(["explain", "./util", "--from"])
        .arg(&root)
        .output()
        .expect("Failed to run explain command");

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[before-resolve] Resolving request: ./util"), "{stdout}");
    assert!(stdout.contains("[before-described-resolve] Has description data from"));
    assert!(stdout
        .lines()
        .last()
        .is_some_and(|line| line == format!("=> {}", path_str(&root.join("util.js")))));
}
