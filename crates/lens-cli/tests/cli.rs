use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use serde_json::{Value, json};

const NEW_WEARER: &str = r#"{
    "name": "A",
    "mobile": "1234567890",
    "age": 25,
    "gender": "male",
    "hasPreviousLenses": false,
    "rightEyePower": "-2.5",
    "leftEyePower": "-2.75",
    "wantMultifocal": false
}"#;

fn lens_intake() -> Command {
    Command::cargo_bin("lens-intake").expect("binary")
}

/// Answers a single request with `status` and returns the raw request text.
fn serve_once(status: u16) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let read = stream.read(&mut buf).expect("read");
            raw.extend_from_slice(&buf[..read]);
            let text = String::from_utf8_lossy(&raw);
            if read == 0 || text.contains("\r\n\r\n") && text.contains("wantMultifocal=") {
                break;
            }
        }
        let response =
            format!("HTTP/1.1 {status} Status\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
        stream.write_all(response.as_bytes()).expect("write");
        String::from_utf8_lossy(&raw).to_string()
    });
    (format!("http://{addr}/intake"), handle)
}

#[test]
fn validate_accepts_complete_answers() {
    let dir = TempDir::new().unwrap();
    let answers = dir.child("answers.json");
    answers.write_str(NEW_WEARER).unwrap();

    lens_intake()
        .args(["validate", "--answers"])
        .arg(answers.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Validation result: valid"));
}

#[test]
fn validate_reports_field_errors() {
    let dir = TempDir::new().unwrap();
    let answers = dir.child("answers.json");
    answers
        .write_str(r#"{ "name": "A", "mobile": "12345", "age": "-3" }"#)
        .unwrap();

    lens_intake()
        .args(["validate", "--answers"])
        .arg(answers.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Validation result: invalid"))
        .stdout(predicate::str::contains("mobile - Invalid mobile number"))
        .stdout(predicate::str::contains("age - Age must be positive"))
        .stdout(predicate::str::contains("gender - Gender is required"));
}

#[test]
fn validate_json_output_lists_error_codes() {
    let dir = TempDir::new().unwrap();
    let answers = dir.child("answers.json");
    answers
        .write_str(r#"{ "hasPreviousLenses": "true", "wearingSchedule": "daily", "lensType": "OPTIMA" }"#)
        .unwrap();

    let output = lens_intake()
        .args(["validate", "--format", "json", "--answers"])
        .arg(answers.path())
        .output()
        .unwrap();
    assert!(!output.status.success());
    let result: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["valid"], false);
    assert_eq!(result["errors"]["lensType"]["code"], "enum_mismatch");
    assert!(result["errors"].get("rightEyePower").is_none());
}

#[test]
fn schema_follows_governing_answers() {
    let dir = TempDir::new().unwrap();
    let answers = dir.child("answers.json");
    answers
        .write_str(r#"{ "hasPreviousLenses": "true", "wearingSchedule": "yearly" }"#)
        .unwrap();

    let output = lens_intake()
        .args(["schema", "--answers"])
        .arg(answers.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let schema: Value = serde_json::from_slice(&output.stdout).unwrap();
    let required = schema["required"].as_array().unwrap();
    assert!(required.contains(&json!("lensType")));
    assert!(!required.contains(&json!("rightEyePower")));
    assert_eq!(schema["properties"]["lensType"]["enum"], json!(["OPTIMA"]));
}

#[test]
fn rejects_malformed_schema_file() {
    let dir = TempDir::new().unwrap();
    let schema = dir.child("schema.json");
    schema
        .write_str(
            r#"{ "id": "broken", "title": "Broken", "version": "1", "fields": [
                { "name": "a", "type": "text", "label": "A",
                  "required": { "rule": "when_equals", "field": "missing", "value": "x" } }
            ] }"#,
        )
        .unwrap();

    lens_intake()
        .args(["schema", "--schema"])
        .arg(schema.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing"));
}

#[test]
fn submit_posts_answers_to_configured_endpoint() {
    let (endpoint, server) = serve_once(200);
    let dir = TempDir::new().unwrap();
    let answers = dir.child("answers.json");
    answers.write_str(NEW_WEARER).unwrap();
    let config = dir.child("config.json");
    config
        .write_str(&json!({ "gateway": { "endpoint": endpoint, "timeout_ms": 5000 } }).to_string())
        .unwrap();

    lens_intake()
        .args(["submit", "--config"])
        .arg(config.path())
        .arg("--answers")
        .arg(answers.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Form submitted successfully!"));

    let request = server.join().unwrap();
    assert!(request.starts_with("POST /intake"));
    assert!(request.contains("name=A&mobile=1234567890&age=25&gender=male&hasPreviousLenses=false"));
    assert!(request.contains("rightEyePower=-2.5"));
}

#[test]
fn submit_reports_unreachable_endpoint() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = TempDir::new().unwrap();
    let answers = dir.child("answers.json");
    answers.write_str(NEW_WEARER).unwrap();
    let config = dir.child("config.json");
    config
        .write_str(&json!({ "gateway": { "endpoint": format!("http://{addr}/intake") } }).to_string())
        .unwrap();

    lens_intake()
        .args(["submit", "--config"])
        .arg(config.path())
        .arg("--answers")
        .arg(answers.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to submit form. Please try again."));
}

#[test]
fn submit_refuses_unsupported_endpoint_scheme() {
    let dir = TempDir::new().unwrap();
    let answers = dir.child("answers.json");
    answers.write_str(NEW_WEARER).unwrap();
    let config = dir.child("config.json");
    config
        .write_str(r#"{ "gateway": { "endpoint": "ftp://example.com/intake" } }"#)
        .unwrap();

    lens_intake()
        .args(["submit", "--config"])
        .arg(config.path())
        .arg("--answers")
        .arg(answers.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("ftp"));
}

#[test]
fn schema_definition_describes_file_format() {
    lens_intake()
        .args(["schema", "--definition"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"fields\""));
}
