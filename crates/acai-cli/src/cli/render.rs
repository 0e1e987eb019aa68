//! Plain-text rendering of messages and documents.

use acai_types::wire::millis_to_rfc3339;
use acai_types::{Document, Message, MessageStatus, Sender, Source};

/// One-line summary: `[id] sender: first line of content`.
pub fn message_line(message: &Message) -> String {
    let status = match message.status {
        MessageStatus::Sending => " (sending)",
        MessageStatus::Error => " (failed)",
        MessageStatus::Sent => "",
    };
    let first_line = message.content.lines().next().unwrap_or_default();
    let reactions: Vec<String> = message
        .reactions
        .iter()
        .filter(|r| r.count > 0)
        .map(|r| format!("{}:{}", r.kind, r.count))
        .collect();
    let mut line = format!(
        "[{}] {}{}: {}",
        message.id, message.sender, status, first_line
    );
    if !reactions.is_empty() {
        line.push_str(&format!("  ({})", reactions.join(", ")));
    }
    line
}

/// History row for `messages list`.
pub fn history_line(message: &Message) -> String {
    format!(
        "{}  {}  {}  {}",
        message.id,
        millis_to_rfc3339(message.timestamp),
        message.sender,
        message.content.lines().next().unwrap_or_default()
    )
}

/// Full assistant reply followed by its numbered sources.
pub fn reply(message: &Message) -> String {
    let mut out = message.content.clone();
    if message.sender == Sender::Assistant && !message.sources.is_empty() {
        out.push_str("\n\nSources:");
        for (i, source) in message.sources.iter().enumerate() {
            out.push('\n');
            out.push_str(&source_line(i + 1, source));
        }
    }
    out
}

fn source_line(n: usize, source: &Source) -> String {
    format!(
        "  [{n}] {} ({}) relevance {:.2}",
        source.title, source.content, source.relevance
    )
}

pub fn document_line(document: &Document) -> String {
    format!(
        "{}  {}  {}  {}  {}  {} pages",
        document.id,
        document.filename,
        document.file_type,
        document.status,
        document.created_at,
        document.total_pages
    )
}

#[cfg(test)]
mod tests {
    use acai_types::{MessageReaction, ReactionKind};

    use super::*;

    #[test]
    fn test_message_line_shows_status_and_reactions() {
        let mut msg = Message::persisted(4, "Paris\nis the capital", Sender::Assistant, 0);
        msg.reactions.push(MessageReaction {
            kind: ReactionKind::Like,
            count: 2,
            reacted: true,
        });
        assert_eq!(message_line(&msg), "[4] assistant: Paris  (like:2)");

        let pending = Message::pending_user(0, "Hi", 0);
        assert_eq!(message_line(&pending), "[~0] user (sending): Hi");
    }

    #[test]
    fn test_reply_lists_sources() {
        let msg = Message::persisted(2, "Paris", Sender::Assistant, 0).with_sources(vec![Source {
            title: "geo.pdf".to_string(),
            content: "Page 3".to_string(),
            relevance: 0.5,
        }]);
        assert_eq!(
            reply(&msg),
            "Paris\n\nSources:\n  [1] geo.pdf (Page 3) relevance 0.50"
        );
    }

    #[test]
    fn test_history_line_formats_timestamp() {
        let msg = Message::persisted(9, "hello", Sender::User, 0);
        assert_eq!(history_line(&msg), "9  1970-01-01T00:00:00+00:00  user  hello");
    }
}
