//! Integration tests for one-shot and interactive chat against a fake backend.

mod support;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use support::{can_bind_localhost, mount_chat_reply, mount_message_store, temp_acai_home};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_exec_prints_reply_and_sources() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let acai_home = temp_acai_home();
    let mock_server = MockServer::start().await;
    mount_message_store(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({"message": "Capital of France?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Paris",
            "sources": [{"filename": "geo.pdf", "page_number": 3}],
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("acai")
        .env("ACAI_HOME", acai_home.path())
        .env("ACAI_API_URL", mock_server.uri())
        .args(["exec", "-p", "  Capital of France?  "])
        .assert()
        .success()
        .stdout(predicate::str::contains("Paris"))
        .stdout(predicate::str::contains("geo.pdf (Page 3)"));

    let saved: Vec<String> = mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/messages")
        .map(|r| String::from_utf8_lossy(&r.body).to_string())
        .collect();
    assert_eq!(saved.len(), 2, "user and assistant messages are persisted");
    assert!(saved[0].contains(r#""sender":"user""#));
    assert!(saved[1].contains(r#""sender":"assistant""#));
}

#[tokio::test]
async fn test_exec_surfaces_backend_detail() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let acai_home = temp_acai_home();
    let mock_server = MockServer::start().await;
    mount_message_store(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "model offline"})),
        )
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("acai")
        .env("ACAI_HOME", acai_home.path())
        .env("ACAI_API_URL", mock_server.uri())
        .args(["exec", "-p", "Hello"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("model offline"));
}

#[tokio::test]
async fn test_api_url_flag_overrides_env() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let acai_home = temp_acai_home();
    let mock_server = MockServer::start().await;
    mount_message_store(&mock_server).await;
    mount_chat_reply(&mock_server, "from flag").await;

    cargo_bin_cmd!("acai")
        .env("ACAI_HOME", acai_home.path())
        .env("ACAI_API_URL", "http://127.0.0.1:9")
        .args(["--api-url", &mock_server.uri(), "exec", "-p", "Hi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("from flag"));
}

#[test]
fn test_exec_rejects_empty_prompt() {
    let acai_home = temp_acai_home();

    cargo_bin_cmd!("acai")
        .env("ACAI_HOME", acai_home.path())
        .env("ACAI_API_URL", "http://127.0.0.1:9")
        .args(["exec", "-p", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Prompt is empty"));
}

#[tokio::test]
async fn test_chat_session_hydrates_sends_and_reacts() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let acai_home = temp_acai_home();
    let mock_server = MockServer::start().await;
    mount_message_store(&mock_server).await;
    mount_chat_reply(&mock_server, "Paris").await;

    Mock::given(method("GET"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 1,
            "content": "Earlier question",
            "sender": "user",
            "timestamp": "2024-05-01T10:00:00.123456",
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("acai")
        .env("ACAI_HOME", acai_home.path())
        .env("ACAI_API_URL", mock_server.uri())
        .arg("chat")
        .write_stdin(concat!(
            "Capital of France?\n",
            "/react 101 like\n",
            "/search paris\n",
            "/list\n",
            "/unreact 101 like\n",
            "/unreact 101 like\n",
            "/edit 100 Capital of Spain?\n",
            "/search\n",
            "/list\n",
            "/clear\n",
            "/list\n",
            "/quit\n",
        ))
        .assert()
        .success()
        .stdout(predicate::str::contains("[1] user: Earlier question"))
        .stdout(predicate::str::contains("Sources:"))
        .stdout(predicate::str::contains("1 of 3 messages match"))
        .stdout(predicate::str::contains("[101] assistant: Paris  (like:1)"))
        .stdout(predicate::str::contains("No like reaction on message 101"))
        .stdout(predicate::str::contains("Updated message 100"))
        .stdout(predicate::str::contains("3 of 3 messages match"))
        .stdout(predicate::str::contains("[100] user: Capital of Spain?"))
        .stdout(predicate::str::contains("Chat cleared."))
        .stdout(predicate::str::contains("No messages."));
}

#[tokio::test]
async fn test_chat_reports_unknown_commands_and_exits_on_eof() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let acai_home = temp_acai_home();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("acai")
        .env("ACAI_HOME", acai_home.path())
        .env("ACAI_API_URL", mock_server.uri())
        .write_stdin("/bogus\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Unknown command '/bogus'"));
}
