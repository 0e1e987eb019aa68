//! Shared helpers for integration tests that stand up a fake backend.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Creates a temp ACAI_HOME directory for test isolation.
pub fn temp_acai_home() -> TempDir {
    TempDir::new().expect("create temp acai home")
}

pub fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// Mounts `POST /messages`, echoing each saved message back with a fresh id.
pub async fn mount_message_store(server: &MockServer) {
    let next_id = Arc::new(AtomicI64::new(100));
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(move |req: &Request| {
            let body: Value = serde_json::from_slice(&req.body).unwrap();
            let id = next_id.fetch_add(1, Ordering::SeqCst);
            ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "content": body["content"],
                "sender": body["sender"],
                "timestamp": body["timestamp"],
            }))
        })
        .mount(server)
        .await;
}

/// Mounts `POST /chat` answering with `response` and one citation.
pub async fn mount_chat_reply(server: &MockServer, response: &str) {
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": response,
            "sources": [{"filename": "geo.pdf", "page_number": 3}],
        })))
        .mount(server)
        .await;
}
