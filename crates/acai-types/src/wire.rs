//! JSON records exchanged with the backend.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::message::{Message, Sender, Source};

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

/// Reply from `POST /chat`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sources: Vec<Citation>,
}

/// Citation record returned alongside a chat reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Citation {
    pub filename: String,
    #[serde(default)]
    pub page_number: Option<u32>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub relevance_score: Option<f64>,
}

impl Citation {
    pub fn into_source(self) -> Source {
        let content = match (self.content, self.page_number) {
            (Some(content), _) if !content.trim().is_empty() => content,
            (_, Some(page)) => format!("Page {page}"),
            _ => String::new(),
        };
        Source {
            title: self.filename,
            content,
            relevance: self.relevance_score.unwrap_or(0.0),
        }
    }
}

/// Body of `POST /messages`.
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage<'a> {
    pub content: &'a str,
    pub sender: Sender,
    /// RFC 3339.
    pub timestamp: String,
}

impl<'a> NewMessage<'a> {
    pub fn new(content: &'a str, sender: Sender, timestamp_ms: i64) -> Self {
        Self {
            content,
            sender,
            timestamp: millis_to_rfc3339(timestamp_ms),
        }
    }
}

/// A message row as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub content: String,
    pub sender: Sender,
    #[serde(deserialize_with = "timestamp_millis")]
    pub timestamp: i64,
}

impl StoredMessage {
    pub fn into_message(self) -> Message {
        Message::persisted(self.id, self.content, self.sender, self.timestamp)
    }
}

/// Reply from `GET /documents/check-duplicate`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DuplicateCheck {
    #[serde(rename = "isDuplicate", alias = "is_duplicate")]
    pub is_duplicate: bool,
}

/// Reply from `GET /health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    /// Extracts a displayable detail message, if the backend sent one.
    ///
    /// Validation errors arrive as a list of `{msg, ...}` objects.
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Array(items) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                (!msgs.is_empty()).then(|| msgs.join("; "))
            }
            _ => None,
        }
    }
}

/// Formats epoch milliseconds as RFC 3339 (UTC).
pub fn millis_to_rfc3339(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .unwrap_or_default()
        .to_rfc3339()
}

/// Parses a backend timestamp string into epoch milliseconds.
///
/// Accepts RFC 3339 and naive ISO 8601 (treated as UTC).
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

fn timestamp_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {n}"))),
        Value::String(s) => parse_timestamp(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{s}'"))),
        other => Err(serde::de::Error::custom(format!(
            "expected timestamp string or number, got {other}"
        ))),
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
