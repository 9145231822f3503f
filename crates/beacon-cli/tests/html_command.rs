use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

#[allow(deprecated)]
fn get_beacon_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("beacon")
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_html_writes_dashboard() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("report.html");

    let mut cmd = Command::new(get_beacon_bin());
    cmd.arg("html")
        .arg(fixture("sample_results.csv"))
        .arg("--output")
        .arg(&output);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2 site(s)"))
        .stdout(predicate::str::contains("1 duplicate row(s) ignored"))
        .stdout(predicate::str::contains(
            "3 opportunities, 2 accessibility issues, 3 SEO details",
        ));

    let page = std::fs::read_to_string(&output).unwrap();
    assert!(page.contains("<!DOCTYPE html>"));
    assert!(page.contains("https://example.com"));
    assert!(page.contains("https://slow.example"));
    // Deduplicated: the tanked repeat row never reaches the page.
    assert!(!page.contains("9.9 s"));

    // Insight sections come from the sibling stores.
    assert!(page.contains("Optimization opportunities"));
    assert!(page.contains("Eliminate render-blocking resources"));
    assert!(page.contains("Accessibility issues"));
    assert!(page.contains("Image elements have [alt] attributes"));
    assert!(page.contains("SEO findings"));
    assert!(page.contains("Document has a title element"));
    // Passing SEO audits stay out of the findings table.
    assert!(!page.contains("Document has a meta description"));
}

#[test]
fn test_html_missing_store_fails() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = Command::new(get_beacon_bin());
    cmd.arg("html")
        .arg("no_such_store.csv")
        .arg("--output")
        .arg(dir.path().join("report.html"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no_such_store.csv"));
}
