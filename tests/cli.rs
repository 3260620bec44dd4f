// ABOUTME: Integration tests for the caravel CLI commands.
// ABOUTME: Validates --help output, defaults printing, and local validation failures.

use assert_cmd::Command;
use predicates::prelude::*;

fn caravel_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("caravel"))
}

#[test]
fn help_shows_commands() {
    caravel_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("route"))
        .stdout(predicate::str::contains("scale"));
}

#[test]
fn defaults_prints_registry_and_base_images() {
    let temp_dir = tempfile::tempdir().unwrap();
    caravel_cmd()
        .current_dir(temp_dir.path())
        .arg("defaults")
        .assert()
        .success()
        .stdout(predicate::str::contains("docker.io"))
        .stdout(predicate::str::contains("predict-cpu:1.5.0"))
        .stdout(predicate::str::contains("train-cpu:1.5.0"));
}

#[test]
fn defaults_respects_caravel_yml() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        temp_dir.path().join("caravel.yml"),
        "image_registry_url: registry.example.com\n",
    )
    .unwrap();

    caravel_cmd()
        .current_dir(temp_dir.path())
        .arg("defaults")
        .assert()
        .success()
        .stdout(predicate::str::contains("registry.example.com"));
}

#[test]
fn route_rejects_split_that_does_not_sum_to_100() {
    // Validation happens before any template or cluster access, so this
    // fails cleanly even with no cluster available.
    let temp_dir = tempfile::tempdir().unwrap();
    caravel_cmd()
        .current_dir(temp_dir.path())
        .args([
            "route",
            "--name",
            "mnist",
            "--split",
            "a=60,b=39",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("99"))
        .stderr(predicate::str::contains("route failed for 'mnist'"));
}

#[test]
fn route_rejects_shadow_missing_from_split() {
    let temp_dir = tempfile::tempdir().unwrap();
    caravel_cmd()
        .current_dir(temp_dir.path())
        .args([
            "route",
            "--name",
            "mnist",
            "--split",
            "a=100",
            "--shadow",
            "b",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("0% weight"));
}

#[test]
fn invalid_model_name_is_rejected_locally() {
    let temp_dir = tempfile::tempdir().unwrap();
    caravel_cmd()
        .current_dir(temp_dir.path())
        .args(["route", "--name", "MNIST", "--split", "a=100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lowercase"));
}

#[test]
fn build_requires_its_arguments() {
    caravel_cmd()
        .args(["build", "--name", "mnist"])
        .assert()
        .failure();
}
