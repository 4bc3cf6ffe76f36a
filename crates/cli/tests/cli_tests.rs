//! CLI integration tests
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("gleaner")
}

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

#[test]
fn test_cli_file_input() {
    cmd()
        .arg(get_fixture_path("company_page.html"))
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""title": "Acme Widgets | Home""#));
}

#[test]
fn test_cli_stdin_input() {
    let html = std::fs::read_to_string(get_fixture_path("company_page.html")).unwrap();
    cmd()
        .arg("-")
        .write_stdin(html)
        .assert()
        .success()
        .stdout(predicate::str::contains("metaDescription"));
}

#[test]
fn test_cli_json_compact() {
    let output = cmd()
        .args(["--compact", &get_fixture_path("company_page.html")])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim_end().lines().count(), 1);

    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["contactInfo"]["emails"][0], "sales@acme-widgets.test");
    assert_eq!(value["links"][0]["anchorText"], "Home");
}

#[test]
fn test_cli_text_format() {
    cmd()
        .args(["-f", "text", &get_fixture_path("company_page.html")])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Acme Widgets | Home\n==="))
        .stdout(predicate::str::contains("Available sections:"));
}

#[test]
fn test_cli_flat_format() {
    cmd()
        .args(["-f", "flat", &get_fixture_path("company_page.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""tables_0_headers": "Model, Price""#));
}

#[test]
fn test_cli_csv_format() {
    cmd()
        .args(["-f", "csv", &get_fixture_path("company_page.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("contactInfo_emails"))
        .stdout(predicate::str::contains("\"sales@acme-widgets.test, support@acme-widgets.test\""));
}

#[test]
fn test_cli_digest_budget() {
    let output = cmd()
        .args(["-f", "digest", "--digest-budget", "30", &get_fixture_path("company_page.html")])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim_end_matches('\n').chars().count(), 30);
    assert!(stdout.starts_with("Acme has been designing"));
}

#[test]
fn test_cli_output_file() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("record.json");

    cmd()
        .args(["-o", output.to_str().unwrap()])
        .arg(get_fixture_path("company_page.html"))
        .assert()
        .success();

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("socialLinks"));
}

#[test]
fn test_cli_verbose_reports_steps() {
    cmd()
        .args(["-v", &get_fixture_path("company_page.html")])
        .assert()
        .success()
        .stderr(predicate::str::contains("Extracting content"))
        .stderr(predicate::str::contains("Paragraphs"));
}

#[test]
fn test_cli_invalid_format() {
    cmd()
        .args(["-f", "markdown", &get_fixture_path("company_page.html")])
        .assert()
        .failure();
}

#[test]
fn test_cli_invalid_file() {
    cmd().arg("nonexistent.html").assert().failure();
}

#[test]
fn test_cli_empty_content() {
    cmd()
        .arg(get_fixture_path("empty_content.html"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no usable content found"));
}

#[test]
fn test_cli_invalid_url() {
    cmd()
        .arg("ftp://example.com/page")
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not retrieve content (invalid url)"));
}

#[test]
fn test_cli_unreachable_url() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);

    cmd()
        .args(["--retries", "1", &url])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not retrieve content (transport error)"));
}
