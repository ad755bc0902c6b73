use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn ls8() -> Command {
    Command::cargo_bin("ls8").unwrap()
}

#[test]
fn test_prints_eight() {
    ls8().arg("res/print8.ls8").assert().success().stdout("8");
}

#[test]
fn test_multiplies() {
    ls8().arg("res/mult.ls8").assert().success().stdout("72");
}

#[test]
fn test_stack_round_trip() {
    ls8().arg("res/stack.ls8").assert().success().stdout("42");
}

#[test]
fn test_forward_jump() {
    ls8().arg("res/jump.ls8").assert().success().stdout("1");
}

#[test]
fn test_missing_file_fails() {
    ls8().arg("res/nope.ls8").assert().failure();
}

#[test]
fn test_reports_assembly_errors_with_line_numbers() {
    let path = std::env::temp_dir().join("ls8-duplicate-label.ls8");
    std::fs::write(&path, "FOO: NOP\nFROB\nFOO: NOP\n").unwrap();

    ls8().arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"))
        .stderr(predicate::str::contains("duplicate label 'FOO'"));
}
