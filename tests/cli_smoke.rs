//! Behavioural smoke test for the CLI entrypoint.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

#[test]
fn cli_without_arguments_prints_usage_and_fails() {
    let mut cmd = cargo_bin_cmd!("gcebake");
    cmd.assert()
        .failure()
        .stdout("")
        .stderr(contains("Usage"));
}

#[test]
fn cli_instance_info_requires_instance_name() {
    let mut cmd = cargo_bin_cmd!("gcebake");
    cmd.arg("instance-info");
    cmd.assert().failure().stderr(contains("<INSTANCE>"));
}
