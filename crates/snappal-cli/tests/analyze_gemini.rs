//! Integration tests for `snappal analyze` against a mock Gemini endpoint.


use std::fs;

use fixtures::{
    GENERATE_PATH, can_bind_localhost, gemini_response, history_entry, history_path,
    read_history, sample_payload, seed_history, snappal, write_png,
};
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_analyze_prints_json_and_saves_history() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let image = write_png(work.path(), "shot.png");
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [{ "inlineData": { "mimeType": "image/png" } }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .respond_with(gemini_response(&sample_payload().to_string()))
        .expect(1)
        .mount(&server)
        .await;

    let output = snappal(home.path())
        .env("GEMINI_API_KEY", "test-key")
        .env("GEMINI_BASE_URL", server.uri())
        .args(["analyze", image.to_str().unwrap(), "--format", "json"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let printed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(printed["id"].as_str().unwrap().starts_with("snap_"));
    assert_eq!(printed["colors"]["primary"].as_array().unwrap().len(), 4);
    assert_eq!(printed["typography"].as_array().unwrap().len(), 2);
    assert_eq!(printed["spacing"]["scale"], json!([4.0, 8.0, 16.0, 24.0]));

    let history = read_history(home.path());
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"], printed["id"]);
}

#[tokio::test]
async fn test_analyze_summary_and_css_out() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let image = write_png(work.path(), "shot.png");
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(gemini_response(&sample_payload().to_string()))
        .expect(2)
        .mount(&server)
        .await;

    snappal(home.path())
        .env("GEMINI_API_KEY", "test-key")
        .env("GEMINI_BASE_URL", server.uri())
        .args(["analyze", image.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Primary palette"))
        .stdout(predicate::str::contains("#2563eb"))
        .stdout(predicate::str::contains("Scale: [4, 8, 16, 24]"))
        .stdout(predicate::str::contains("(image/png, 16 bytes)"));

    let css_path = work.path().join("out").join("tokens.css");
    snappal(home.path())
        .env("GEMINI_API_KEY", "test-key")
        .env("GEMINI_BASE_URL", server.uri())
        .args(["analyze", image.to_str().unwrap(), "--format", "css", "--out"])
        .arg(&css_path)
        .assert()
        .success();

    let css = fs::read_to_string(&css_path).unwrap();
    assert!(css.contains("--color-primary: #2563eb;"));
    assert!(css.contains("--space-16: 16px;"));
    assert_eq!(read_history(home.path()).len(), 2);
}

#[tokio::test]
async fn test_missing_api_key_sends_no_request() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let image = write_png(work.path(), "shot.png");
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(gemini_response("{}"))
        .expect(0)
        .mount(&server)
        .await;

    snappal(home.path())
        .env("GEMINI_BASE_URL", server.uri())
        .args(["analyze", image.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key is missing"));

    assert!(!history_path(home.path()).exists());
}

#[tokio::test]
async fn test_api_key_unfit_for_header_sends_no_request() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let image = write_png(work.path(), "shot.png");
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(gemini_response("{}"))
        .expect(0)
        .mount(&server)
        .await;

    snappal(home.path())
        .env("GEMINI_API_KEY", "abc\ndef")
        .env("GEMINI_BASE_URL", server.uri())
        .args(["analyze", image.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be sent in a header"));

    assert!(!history_path(home.path()).exists());
}

#[tokio::test]
async fn test_upstream_error_leaves_history_untouched() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let image = write_png(work.path(), "shot.png");
    seed_history(home.path(), &[history_entry(1_700_000_000_000)]);
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "code": 500, "message": "Internal error encountered." }
        })))
        .expect(1)
        .mount(&server)
        .await;

    snappal(home.path())
        .env("GEMINI_API_KEY", "test-key")
        .env("GEMINI_BASE_URL", server.uri())
        .args(["analyze", image.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTP 500: Internal error encountered."));

    let history = read_history(home.path());
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"], "snap_1700000000000");
}

#[tokio::test]
async fn test_schema_mismatch_is_parse_error() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let image = write_png(work.path(), "shot.png");
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(gemini_response("{\"colors\": \"lots\"}"))
        .expect(1)
        .mount(&server)
        .await;

    snappal(home.path())
        .env("GEMINI_API_KEY", "test-key")
        .env("GEMINI_BASE_URL", server.uri())
        .args(["analyze", image.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("did not match the analysis schema"));

    assert!(!history_path(home.path()).exists());
}

#[tokio::test]
async fn test_eleventh_analysis_evicts_oldest() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let image = write_png(work.path(), "shot.png");
    let seeded: Vec<_> = (1..=10).rev().map(history_entry).collect();
    seed_history(home.path(), &seeded);
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(gemini_response(&sample_payload().to_string()))
        .expect(1)
        .mount(&server)
        .await;

    snappal(home.path())
        .env("GEMINI_API_KEY", "test-key")
        .env("GEMINI_BASE_URL", server.uri())
        .args(["analyze", image.to_str().unwrap(), "--format", "css"])
        .assert()
        .success();

    let history = read_history(home.path());
    assert_eq!(history.len(), 10);
    assert_ne!(history[0]["id"], "snap_10");
    assert_eq!(history[1]["id"], "snap_10");
    assert_eq!(history[9]["id"], "snap_2");
}

#[test]
fn test_non_image_is_rejected_before_any_request() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let notes = work.path().join("notes.txt");
    fs::write(&notes, "just text").unwrap();

    snappal(home.path())
        .env("GEMINI_API_KEY", "test-key")
        .env("GEMINI_BASE_URL", "http://127.0.0.1:9")
        .args(["analyze", notes.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not an image"));

    assert!(!history_path(home.path()).exists());
}
