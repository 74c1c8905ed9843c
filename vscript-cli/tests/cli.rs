use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn script_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(content.as_bytes()).expect("write script");
    file
}

#[test]
fn test_tokens_text_output() {
    let file = script_file("local x = 5\n");
    Command::cargo_bin("vscript")
        .unwrap()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("LocalKeyword"))
        .stdout(predicate::str::contains("Identifier"))
        .stdout(predicate::str::contains("Integer"));
}

#[test]
fn test_tokens_json_output() {
    let file = script_file("local x = 5\n");
    Command::cargo_bin("vscript")
        .unwrap()
        .arg(file.path())
        .args(["--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"tokens\""))
        .stdout(predicate::str::contains("\"diagnostics\""));
}

#[test]
fn test_token_at_offset() {
    let file = script_file("local x = 5\n");
    Command::cargo_bin("vscript")
        .unwrap()
        .arg(file.path())
        .args(["--at", "6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Identifier"))
        .stdout(predicate::str::contains("\"x\""));
}

#[test]
fn test_diagnostics_on_stderr() {
    let file = script_file("local s = \"abc\n");
    Command::cargo_bin("vscript")
        .unwrap()
        .arg(file.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Unterminated string literal."));
}

#[test]
fn test_missing_file_fails() {
    Command::cargo_bin("vscript")
        .unwrap()
        .arg("/no/such/file.nut")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot read"));
}
