use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_options() {
    Command::cargo_bin("xproof")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--server"))
        .stdout(predicate::str::contains("--original"))
        .stdout(predicate::str::contains("--modified"))
        .stdout(predicate::str::contains("--kind"))
        .stdout(predicate::str::contains("--log-file"));
}

#[test]
fn test_version() {
    Command::cargo_bin("xproof")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("xproof "));
}

#[test]
fn test_unknown_kind_is_rejected() {
    Command::cargo_bin("xproof")
        .unwrap()
        .args(["--kind", "typo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown kind 'typo'"));
}

#[test]
fn test_unknown_flag_is_rejected() {
    Command::cargo_bin("xproof")
        .unwrap()
        .arg("--repo")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected argument"));
}
