//! Chat message model as seen by the client.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    /// Older backends label assistant rows as `ai`.
    #[serde(alias = "ai")]
    Assistant,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery status of a message. Transient: never sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sending,
    #[default]
    Sent,
    Error,
}

/// Identity of a message in the session.
///
/// Optimistic messages carry a local id until the backend assigns one;
/// reconciliation swaps `Pending` for `Persisted` in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageId {
    Pending { local_id: u64 },
    Persisted { server_id: i64 },
}

impl MessageId {
    /// Returns the backend id if this message has been persisted.
    pub fn server_id(self) -> Option<i64> {
        match self {
            MessageId::Persisted { server_id } => Some(server_id),
            MessageId::Pending { .. } => None,
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(self, MessageId::Pending { .. })
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Pending { local_id } => write!(f, "~{local_id}"),
            MessageId::Persisted { server_id } => write!(f, "{server_id}"),
        }
    }
}

/// Citation attached to an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub content: String,
    pub relevance: f64,
}

/// Reaction types a user can toggle on an assistant message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
    Helpful,
    Thanks,
}

impl ReactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
            ReactionKind::Helpful => "helpful",
            ReactionKind::Thanks => "thanks",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            "helpful" => Ok(Self::Helpful),
            "thanks" => Ok(Self::Thanks),
            _ => Err(format!(
                "Unknown reaction '{value}'. Valid options: like, dislike, helpful, thanks"
            )),
        }
    }
}

/// Per-kind reaction tally on one message.
///
/// `reacted` reflects only this client's toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReaction {
    #[serde(rename = "type")]
    pub kind: ReactionKind,
    pub count: u32,
    pub reacted: bool,
}

/// A chat message held in session state.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub content: String,
    pub sender: Sender,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub status: MessageStatus,
    /// Citations (assistant messages only).
    pub sources: Vec<Source>,
    /// Reactions (assistant messages only).
    pub reactions: Vec<MessageReaction>,
}

impl Message {
    /// Creates an optimistic user message awaiting persistence.
    pub fn pending_user(local_id: u64, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: MessageId::Pending { local_id },
            content: content.into(),
            sender: Sender::User,
            timestamp,
            status: MessageStatus::Sending,
            sources: Vec::new(),
            reactions: Vec::new(),
        }
    }

    /// Creates a message that already has a backend id.
    pub fn persisted(
        server_id: i64,
        content: impl Into<String>,
        sender: Sender,
        timestamp: i64,
    ) -> Self {
        Self {
            id: MessageId::Persisted { server_id },
            content: content.into(),
            sender,
            timestamp,
            status: MessageStatus::Sent,
            sources: Vec::new(),
            reactions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = sources;
        self
    }

    /// Returns true if this message was assigned `server_id` by the backend.
    pub fn has_server_id(&self, server_id: i64) -> bool {
        self.id.server_id() == Some(server_id)
    }

    /// Returns the reaction entry for `kind`, if any.
    pub fn reaction(&self, kind: ReactionKind) -> Option<&MessageReaction> {
        self.reactions.iter().find(|r| r.kind == kind)
    }

    /// Case-insensitive substring match against the message content.
    pub fn matches(&self, query: &str) -> bool {
        query.is_empty() || self.content.to_lowercase().contains(&query.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_accepts_legacy_ai_label() {
        let sender: Sender = serde_json::from_str(r#""ai""#).unwrap();
        assert_eq!(sender, Sender::Assistant);
        assert_eq!(serde_json::to_string(&sender).unwrap(), r#""assistant""#);
    }

    #[test]
    fn test_reaction_kind_parsing() {
        assert_eq!("like".parse::<ReactionKind>().unwrap(), ReactionKind::Like);
        assert_eq!(" Thanks ".parse::<ReactionKind>().unwrap(), ReactionKind::Thanks);
        let err = "love".parse::<ReactionKind>().unwrap_err();
        assert!(err.contains("Valid options"));
    }

    #[test]
    fn test_message_matches_is_case_insensitive() {
        let msg = Message::persisted(1, "Biology notes", Sender::User, 0);
        assert!(msg.matches("bio"));
        assert!(msg.matches("NOTES"));
        assert!(msg.matches(""));
        assert!(!msg.matches("math"));
    }

    #[test]
    fn test_pending_id_has_no_server_id() {
        let msg = Message::pending_user(3, "hi", 0);
        assert!(msg.id.is_pending());
        assert_eq!(msg.id.server_id(), None);
        assert_eq!(msg.status, MessageStatus::Sending);
        assert_eq!(msg.id.to_string(), "~3");
    }
}
