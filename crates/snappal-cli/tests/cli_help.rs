use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("snappal")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("shell"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_history_help_shows_subcommands() {
    cargo_bin_cmd!("snappal")
        .args(["history", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("clear"));
}

#[test]
fn test_analyze_help_lists_formats() {
    cargo_bin_cmd!("snappal")
        .args(["analyze", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("summary"))
        .stdout(predicate::str::contains("tailwind"))
        .stdout(predicate::str::contains("--copy"));
}

#[test]
fn test_export_requires_format() {
    cargo_bin_cmd!("snappal")
        .args(["export", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--format"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("snappal")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
