use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

#[allow(deprecated)]
fn get_beacon_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("beacon")
}

#[test]
fn test_doctor_reports_missing_target_list() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = Command::new(get_beacon_bin());
    cmd.arg("doctor")
        .arg("--urls")
        .arg(dir.path().join("absent.txt"))
        .arg("--output-dir")
        .arg(dir.path());

    // Chrome availability depends on the host, so only the target-list
    // check is asserted. The command must fail when the list is unreadable.
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("Beacon Doctor"))
        .stdout(predicate::str::contains("absent.txt"))
        .stderr(predicate::str::contains("target list"));
}

#[test]
fn test_doctor_validates_target_list_contents() {
    let dir = tempfile::tempdir().unwrap();
    let urls = dir.path().join("urls.txt");
    std::fs::write(&urls, "# comment\nhttps://example.com\nnot-a-url\n").unwrap();

    let mut cmd = Command::new(get_beacon_bin());
    cmd.arg("doctor")
        .arg("--urls")
        .arg(&urls)
        .arg("--output-dir")
        .arg(dir.path());

    cmd.assert()
        .stdout(predicate::str::contains("1 valid URL(s)"))
        .stdout(predicate::str::contains("1 invalid line(s)"));
}
