//! Black-box checks of the CLI surface.

use assert_cmd::Command;

#[test]
fn help_lists_the_worker_flags() {
    let mut cmd = Command::cargo_bin("harrow").unwrap();
    let assert = cmd.arg("--help").assert().success();

    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    for flag in ["--num", "--retry", "--job-id", "--keep", "--debug", "--spot", "--on-prem"] {
        assert!(output.contains(flag), "missing flag in help: {flag}");
    }
}

#[test]
fn version_reports_the_package() {
    let mut cmd = Command::cargo_bin("harrow").unwrap();
    let assert = cmd.arg("--version").assert().success();

    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(output.starts_with("harrow"));
}

#[test]
fn kind_argument_is_required() {
    let mut cmd = Command::cargo_bin("harrow").unwrap();
    cmd.assert().failure();
}

#[test]
fn spot_and_on_prem_conflict() {
    let mut cmd = Command::cargo_bin("harrow").unwrap();
    cmd.args(["terrain_correct", "--spot", "--on-prem"])
        .assert()
        .failure();
}
