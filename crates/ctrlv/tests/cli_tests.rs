//! CLI integration tests.
//!
//! These run the built binary against a mock snippet service, with HOME and
//! the working directory pointed at a scratch directory so no real config is
//! picked up.

use serde_json::{json, Value};
use std::process::{Output, Stdio};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn command(home: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ctrlv"));
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("CTRLV_API_URL")
        .env_remove("CTRLV_ORIGIN")
        .env_remove("CTRLV_CONFIG_CONTENT")
        .env_remove("CTRLV_LOG_LEVEL")
        .stdin(Stdio::null());
    cmd
}

async fn run(home: &TempDir, args: &[&str]) -> Output {
    command(home)
        .args(args)
        .output()
        .await
        .expect("failed to run ctrlv")
}

async fn run_with_stdin(home: &TempDir, args: &[&str], input: &str) -> Output {
    let mut child = command(home)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn ctrlv");
    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(input.as_bytes()).await.unwrap();
    drop(stdin);
    child.wait_with_output().await.unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn snippet_body(id: &str, content: &str) -> Value {
    json!({
        "id": id,
        "content": content,
        "language": "python",
        "created_at": "2025-03-06T00:00:00Z",
        "expires_at": "2999-01-01T00:00:00Z",
        "view_count": 1,
        "one_time_view": false,
        "is_encrypted": false,
        "version": 1
    })
}

#[tokio::test]
async fn test_help_command() {
    let home = TempDir::new().unwrap();
    let output = run(&home, &["--help"]).await;

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Share code snippets from the terminal"));
    assert!(out.contains("share"));
    assert!(out.contains("view"));
    assert!(out.contains("--api-url"));
}

#[tokio::test]
async fn test_languages_command() {
    let home = TempDir::new().unwrap();
    let output = run(&home, &["languages"]).await;

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("python"));
    assert!(out.contains("plaintext"));
}

#[tokio::test]
async fn test_config_defaults_and_project_file() {
    let home = TempDir::new().unwrap();
    let output = run(&home, &["config"]).await;
    assert!(output.status.success());
    let config: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(config["api_url"], "http://127.0.0.1:8000");

    std::fs::write(
        home.path().join("ctrlv.jsonc"),
        "{\n  // local service\n  \"origin\": \"https://paste.test\"\n}\n",
    )
    .unwrap();
    let output = run(&home, &["config"]).await;
    assert!(output.status.success());
    let config: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(config["origin"], "https://paste.test");
    assert!(stderr(&output).contains("ctrlv.jsonc"));
}

#[tokio::test]
async fn test_share_from_stdin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/snippets/"))
        .and(body_json(json!({
            "content": "print(1)\n",
            "language": "python",
            "expiration_minutes": 60,
            "one_time_view": false,
            "encrypt_content": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "abc",
            "access_token": "t1",
            "sharing_url": "http://server/s/abc?token=t1",
            "expires_at": "2999-01-01T00:00:00Z",
            "version": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let output = run_with_stdin(
        &home,
        &[
            "--api-url",
            &server.uri(),
            "--origin",
            "https://paste.test",
            "share",
            "-l",
            "python",
            "-e",
            "1h",
        ],
        "print(1)\n",
    )
    .await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "https://paste.test/s/abc?token=t1");
}

#[tokio::test]
async fn test_share_empty_content_fails_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let output = run_with_stdin(&home, &["--api-url", &server.uri(), "share"], "   \n").await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Enter some code first"));
}

#[tokio::test]
async fn test_view_plain_snippet() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/snippets/abc/"))
        .and(query_param("token", "t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(snippet_body("abc", "print(1)\n")))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let output = run(
        &home,
        &["--api-url", &server.uri(), "view", "https://paste.test/s/abc?token=t1"],
    )
    .await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "print(1)\n");
    assert!(stderr(&output).contains("Python · version 1"));
}

#[tokio::test]
async fn test_view_encrypted_with_password_flag() {
    let server = MockServer::start().await;
    let mut placeholder = snippet_body("abc", "");
    placeholder["is_encrypted"] = json!(true);
    placeholder["needs_decryption"] = json!(true);
    Mock::given(method("GET"))
        .and(path("/api/v1/snippets/abc/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(placeholder))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/snippets/abc/"))
        .and(body_json(json!({"action": "decrypt", "password": "key"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(snippet_body("abc", "secret\n")))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let output = run(
        &home,
        &[
            "--api-url",
            &server.uri(),
            "view",
            "abc",
            "--token",
            "t1",
            "--password",
            "key",
        ],
    )
    .await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "secret\n");
    assert!(stderr(&output).contains("Content decrypted successfully"));
}

#[tokio::test]
async fn test_view_rejected_password_flag_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/snippets/abc/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"requires_password": true})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/snippets/abc/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid password"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let output = run(
        &home,
        &["--api-url", &server.uri(), "view", "/s/abc?token=t1", "-p", "nope"],
    )
    .await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid password"));
}

#[tokio::test]
async fn test_view_prompt_cancelled_on_eof() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/snippets/abc/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"requires_password": true})))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let output = run(
        &home,
        &[
            "--api-url",
            &server.uri(),
            "--origin",
            "https://paste.test",
            "view",
            "abc",
            "--token",
            "t1",
        ],
    )
    .await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());
    let err = stderr(&output);
    assert!(err.contains("Password Protected Snippet"));
    assert!(err.contains("Back to https://paste.test/"));
    assert!(!err.contains("version"));
}

#[tokio::test]
async fn test_decrypt_prompt_shows_metadata_first() {
    let server = MockServer::start().await;
    let mut placeholder = snippet_body("abc", "");
    placeholder["content"] = Value::Null;
    placeholder["version"] = json!(3);
    placeholder["is_encrypted"] = json!(true);
    placeholder["needs_decryption"] = json!(true);
    Mock::given(method("GET"))
        .and(path("/api/v1/snippets/abc/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(placeholder))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let output = run(
        &home,
        &["--api-url", &server.uri(), "view", "abc", "--token", "t1"],
    )
    .await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let err = stderr(&output);
    let header = err
        .find("Python · version 3 · Expires in")
        .expect("metadata header missing");
    let prompt = err
        .find("Encrypted Content")
        .expect("decrypt prompt missing");
    assert!(header < prompt);
    assert!(err.contains("Encrypted"));
    assert!(stdout(&output).is_empty());
}

#[tokio::test]
async fn test_view_without_token_fails_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let output = run(&home, &["--api-url", &server.uri(), "view", "abc"]).await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid access token"));
}

#[tokio::test]
async fn test_view_missing_snippet() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/snippets/gone/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let output = run(&home, &["--api-url", &server.uri(), "view", "gone", "--token", "t"]).await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Snippet not found or has expired"));
}

#[tokio::test]
async fn test_diff_command() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/snippets/diff/v1/v2/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "d1",
            "source_snippet": "v1",
            "target_snippet": "v2",
            "diff_content": "--- v1\n+++ v2\n@@ -1 +1 @@\n-a\n+b\n",
            "created_at": "2025-03-06T00:00:00Z"
        })))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let output = run(&home, &["--api-url", &server.uri(), "diff", "v1", "v2"]).await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("+b"));
}
