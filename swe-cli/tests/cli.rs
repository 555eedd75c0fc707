use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_missing_default_config() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("swe-cli")
        .unwrap()
        .current_dir(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Error: Config.ini not found in the current directory.",
        ));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_named_config() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("swe-cli")
        .unwrap()
        .current_dir(dir.path())
        .args(["--config", "lake.ini", "-d"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lake.ini not found"));
}

#[test]
fn test_incomplete_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("Config.ini"),
        "[Input]\ngeojson_file = lake.geojson\n",
    )
    .unwrap();
    Command::cargo_bin("swe-cli")
        .unwrap()
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Missing key 'output_file_base' in section [Output]",
        ));
}

#[test]
fn test_help_lists_options() {
    Command::cargo_bin("swe-cli")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--debug"));
}
