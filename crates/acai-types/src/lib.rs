//! Shared data types for the ACAI client (chat messages, documents, wire records).

pub mod document;
pub mod message;
pub mod wire;

pub use document::{Document, DocumentPage};
pub use message::{
    Message, MessageId, MessageReaction, MessageStatus, ReactionKind, Sender, Source,
};
