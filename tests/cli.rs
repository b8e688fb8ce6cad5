use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn cargo_bin() -> &'static str {
    "laxdata-cli"
}

#[test]
fn cli_stdin_stdout_basic() {
    let mut cmd = Command::cargo_bin(cargo_bin()).unwrap();
    let input = "```json\n{'a':1, b: 'x',}\n```";
    cmd.write_stdin(input).assert().success().stdout(predicate::function(|out: &[u8]| {
        std::str::from_utf8(out)
            .ok()
            .map(|s| s.contains("\"a\": 1") || s.contains("\"a\":1"))
            .unwrap_or(false)
    }));
}

#[test]
fn cli_file_to_file() {
    let dir = tempdir().unwrap();
    let inp = dir.path().join("in.json");
    let out = dir.path().join("out.json");
    fs::write(&inp, "{a:1, b:2}").unwrap();
    Command::cargo_bin(cargo_bin())
        .unwrap()
        .args([inp.to_str().unwrap(), "-o", out.to_str().unwrap()])
        .assert()
        .success();
    let s = fs::read_to_string(out).unwrap();
    assert!(s.contains("\"a\"") && s.contains("\"b\""));
}

#[test]
fn cli_pretty_output_has_newlines_and_indentation() {
    let mut cmd = Command::cargo_bin(cargo_bin()).unwrap();
    let assert = cmd.args(["--pretty"]).write_stdin("{a:1,b:2}").assert().success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(out.contains('\n') && out.contains("  "));
}

#[test]
fn cli_schema_validation_failure_exits_nonzero() {
    let dir = tempdir().unwrap();
    let schema_path = dir.path().join("schema.json");
    fs::write(
        &schema_path,
        r#"{"required": ["name"], "properties": {"name": {"type": "string"}}}"#,
    )
    .unwrap();

    Command::cargo_bin(cargo_bin())
        .unwrap()
        .args(["--schema", schema_path.to_str().unwrap()])
        .write_stdin("{\"age\": 12}")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("required"));
}

#[test]
fn cli_schema_validation_success() {
    let dir = tempdir().unwrap();
    let schema_path = dir.path().join("schema.json");
    fs::write(
        &schema_path,
        r#"{"required": ["name"], "properties": {"name": {"type": "string"}}}"#,
    )
    .unwrap();

    Command::cargo_bin(cargo_bin())
        .unwrap()
        .args(["--schema", schema_path.to_str().unwrap()])
        .write_stdin("{name: 'Ada'}")
        .assert()
        .success();
}

#[test]
fn cli_help_flag_exits_zero() {
    Command::cargo_bin(cargo_bin()).unwrap().arg("--help").assert().success();
}
