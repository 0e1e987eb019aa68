//! Chat session state and its transitions.
//!
//! `ChatSessionState` is plain data. All changes go through
//! [`ChatSessionState::apply`], which keeps `filtered_messages` in sync with
//! `messages` and `search_query`.

use acai_types::{Message, MessageId, MessageReaction, MessageStatus, ReactionKind, Sender};

/// Client-visible chat state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatSessionState {
    messages: Vec<Message>,
    is_loading: bool,
    is_typing: bool,
    error: Option<String>,
    edit_message_id: Option<i64>,
    search_query: String,
    filtered_messages: Vec<Message>,
}

/// A single state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatMutation {
    /// Start a send: raise loading/typing, clear the error, append the optimistic message.
    BeginSend(Message),
    /// Swap a pending id for the backend-assigned one.
    Reconcile {
        local_id: u64,
        server_id: i64,
        timestamp: i64,
    },
    /// Flag a pending message whose save failed.
    MarkFailed { local_id: u64 },
    /// Flag every still-sending message as failed (send stopped or replaced).
    AbortPending,
    Append(Message),
    /// Lower loading/typing; set the error when one is given.
    Finish { error: Option<String> },
    SetLoading(bool),
    SetError(Option<String>),
    SetMessages(Vec<Message>),
    UpdateMessage { id: i64, content: String },
    SetEditMessageId(Option<i64>),
    AddReaction { id: i64, kind: ReactionKind },
    RemoveReaction { id: i64, kind: ReactionKind },
    SetSearchQuery(String),
    Clear,
}

impl ChatSessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages in chronological (insertion) order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_typing(&self) -> bool {
        self.is_typing
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn edit_message_id(&self) -> Option<i64> {
        self.edit_message_id
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// `messages` filtered by `search_query` (case-insensitive substring).
    pub fn filtered_messages(&self) -> &[Message] {
        &self.filtered_messages
    }

    /// Looks up a persisted message by backend id.
    pub fn message(&self, server_id: i64) -> Option<&Message> {
        self.messages.iter().find(|m| m.has_server_id(server_id))
    }

    /// Applies a mutation. Returns false when it left state unchanged.
    pub fn apply(&mut self, mutation: ChatMutation) -> bool {
        let changed = match mutation {
            ChatMutation::BeginSend(message) => {
                self.is_loading = true;
                self.is_typing = true;
                self.error = None;
                self.messages.push(message);
                true
            }
            ChatMutation::Reconcile {
                local_id,
                server_id,
                timestamp,
            } => match self.pending_mut(local_id) {
                Some(message) => {
                    message.id = MessageId::Persisted { server_id };
                    message.timestamp = timestamp;
                    message.status = MessageStatus::Sent;
                    true
                }
                None => false,
            },
            ChatMutation::MarkFailed { local_id } => match self.pending_mut(local_id) {
                Some(message) => {
                    message.status = MessageStatus::Error;
                    true
                }
                None => false,
            },
            ChatMutation::AbortPending => {
                let mut changed = false;
                for message in self
                    .messages
                    .iter_mut()
                    .filter(|m| m.status == MessageStatus::Sending)
                {
                    message.status = MessageStatus::Error;
                    changed = true;
                }
                changed
            }
            ChatMutation::Append(message) => {
                self.messages.push(message);
                true
            }
            ChatMutation::Finish { error } => {
                self.is_loading = false;
                self.is_typing = false;
                if error.is_some() {
                    self.error = error;
                }
                true
            }
            ChatMutation::SetLoading(loading) => {
                self.is_loading = loading;
                true
            }
            ChatMutation::SetError(error) => {
                self.error = error;
                true
            }
            ChatMutation::SetMessages(messages) => {
                self.messages = messages;
                true
            }
            ChatMutation::UpdateMessage { id, content } => self.update_content(id, &content),
            ChatMutation::SetEditMessageId(id) => {
                self.edit_message_id = id;
                true
            }
            ChatMutation::AddReaction { id, kind } => self.add_reaction(id, kind),
            ChatMutation::RemoveReaction { id, kind } => self.remove_reaction(id, kind),
            ChatMutation::SetSearchQuery(query) => {
                let changed = self.search_query != query;
                self.search_query = query;
                changed
            }
            ChatMutation::Clear => {
                *self = Self::default();
                true
            }
        };
        if changed {
            self.refilter();
        }
        changed
    }

    fn pending_mut(&mut self, local_id: u64) -> Option<&mut Message> {
        self.messages
            .iter_mut()
            .find(|m| m.id == MessageId::Pending { local_id })
    }

    fn persisted_mut(&mut self, server_id: i64) -> Option<&mut Message> {
        self.messages
            .iter_mut()
            .find(|m| m.has_server_id(server_id))
    }

    fn update_content(&mut self, id: i64, content: &str) -> bool {
        let new_content = content.trim();
        if new_content.is_empty() {
            return false;
        }
        let Some(message) = self.persisted_mut(id) else {
            return false;
        };
        if message.content.trim() == new_content {
            return false;
        }
        message.content = new_content.to_string();
        true
    }

    fn add_reaction(&mut self, id: i64, kind: ReactionKind) -> bool {
        let Some(message) = self.persisted_mut(id) else {
            return false;
        };
        if message.sender != Sender::Assistant {
            return false;
        }
        match message.reactions.iter_mut().find(|r| r.kind == kind) {
            Some(reaction) if reaction.reacted => false,
            Some(reaction) => {
                reaction.reacted = true;
                reaction.count = reaction.count.saturating_add(1);
                true
            }
            None => {
                message.reactions.push(MessageReaction {
                    kind,
                    count: 1,
                    reacted: true,
                });
                true
            }
        }
    }

    fn remove_reaction(&mut self, id: i64, kind: ReactionKind) -> bool {
        let Some(reaction) = self
            .persisted_mut(id)
            .and_then(|m| m.reactions.iter_mut().find(|r| r.kind == kind))
        else {
            return false;
        };
        if !reaction.reacted {
            return false;
        }
        reaction.reacted = false;
        reaction.count = reaction.count.saturating_sub(1);
        true
    }

    fn refilter(&mut self) {
        self.filtered_messages = if self.search_query.is_empty() {
            self.messages.clone()
        } else {
            self.messages
                .iter()
                .filter(|m| m.matches(&self.search_query))
                .cloned()
                .collect()
        };
    }
}
