//! Command-line smoke tests for the `bp` binary

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("bp")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("questions"));
}

#[test]
fn test_version() {
    Command::cargo_bin("bp")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_subcommand_required() {
    Command::cargo_bin("bp")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_questions_requires_description() {
    Command::cargo_bin("bp")
        .unwrap()
        .arg("questions")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<DESCRIPTION>"));
}
