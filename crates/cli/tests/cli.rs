// ABOUTME: Integration tests for the tender-harvest CLI binary.
// ABOUTME: Tests source listing, saved-page extraction, custom adapters over HTTP and exit codes.

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::cargo::CommandCargoExt;
use httpmock::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn harvest_cmd() -> Command {
    Command::cargo_bin("tender-harvest").unwrap()
}

fn fixture(name: &str) -> String {
    format!("{}/../harvest/tests/fixtures/{}.html", env!("CARGO_MANIFEST_DIR"), name)
}

fn write_sources(dir: &TempDir, server: &MockServer) -> std::path::PathBuf {
    let path = dir.path().join("sources.json");
    let json = format!(
        r#"[
  {{
    "key": "mock",
    "name": "Mock Tenders",
    "base_url": "{ok}",
    "cards": "li.notice",
    "fields": [
      {{ "name": "title", "selector": "a", "required": true }},
      {{ "name": "link", "selector": "a", "extract": {{ "type": "url", "attr": "href" }} }},
      {{ "name": "deadline", "selector": ".deadline" }}
    ]
  }},
  {{
    "key": "down",
    "base_url": "{down}",
    "cards": "li.notice",
    "fields": [ {{ "name": "title", "selector": "a" }} ]
  }}
]"#,
        ok = server.url("/tenders/"),
        down = server.url("/down/"),
    );
    fs::write(&path, json).unwrap();
    path
}

#[test]
fn list_shows_builtin_sources() {
    harvest_cmd()
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("bdjobs"))
        .stdout(predicate::str::contains("CARE Bangladesh"))
        .stdout(predicate::str::contains("https://pksf.org.bd/category/tender/"));
}

#[test]
fn saved_page_renders_text_listing() {
    harvest_cmd()
        .arg("care")
        .arg("--html")
        .arg(fixture("care"))
        .assert()
        .success()
        .stdout(predicate::str::contains("== CARE Bangladesh =="))
        .stdout(predicate::str::contains(
            "Download url : https://www.carebangladesh.org/uploads/tor-shouhardo-endline.pdf",
        ))
        .stdout(predicate::str::contains("Deadline     : None"))
        .stdout(predicate::str::contains("Total tenders found: 3 (cards: 4)"))
        .stdout(predicate::str::contains("warning: card 3"));
}

#[test]
fn saved_page_relevant_json() {
    let output = harvest_cmd()
        .arg("care")
        .arg("--html")
        .arg(fixture("care"))
        .arg("--relevant")
        .arg("--json")
        .arg("--compact")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["total_records"], 1);
    let record = &value["sources"][0]["result"]["records"][0];
    assert_eq!(record["document_type"], "ToR");
    assert_eq!(record["keywords"], "Endline");
}

#[test]
fn html_requires_exactly_one_key() {
    harvest_cmd()
        .arg("care")
        .arg("pksf")
        .arg("--html")
        .arg(fixture("care"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--html requires exactly one source key"));
}

#[test]
fn no_keys_is_an_error() {
    harvest_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one source key is required"));
}

#[test]
fn unknown_key_fails() {
    harvest_cmd()
        .arg("ungm")
        .arg("--html")
        .arg(fixture("care"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown source"));
}

#[test]
fn custom_sources_fetch_over_http() {
    let server = MockServer::start();
    let page = server.mock(|when, then| {
        when.method(GET).path("/tenders/");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(
                r#"<ul>
  <li class="notice"><a href="/t/1">Midterm Review of Coastal Resilience Project</a><span class="deadline">5 May</span></li>
  <li class="notice"><a href="t/2">Office Supplies</a></li>
</ul>"#,
            );
    });

    let dir = TempDir::new().unwrap();
    let sources = write_sources(&dir, &server);

    let output = harvest_cmd()
        .arg("--sources")
        .arg(&sources)
        .arg("mock")
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    page.assert();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["failed"], 0);
    let records = &value["sources"][0]["result"]["records"];
    assert_eq!(records[0]["link"], server.url("/t/1"));
    assert_eq!(records[1]["link"], server.url("/tenders/t/2"));
    assert_eq!(records[1]["deadline"], serde_json::Value::Null);
}

#[test]
fn failing_source_sets_exit_code_but_reports_others() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/tenders/");
        then.status(200)
            .body(r#"<ul><li class="notice"><a href="/t/1">Only notice</a></li></ul>"#);
    });
    server.mock(|when, then| {
        when.method(GET).path("/down/");
        then.status(503);
    });

    let dir = TempDir::new().unwrap();
    let sources = write_sources(&dir, &server);

    harvest_cmd()
        .arg("--sources")
        .arg(&sources)
        .arg("mock")
        .arg("down")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Title    : Only notice"))
        .stderr(predicate::str::contains("HTTP status 503"));
}
