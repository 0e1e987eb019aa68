//! Chat session manager.
//!
//! `ChatSession` is the single authority over chat state. UI layers hold a
//! reference and call its operations; backend work runs inside
//! `send_message`/`hydrate` and is tagged with a task generation so stopped or
//! replaced work never lands in state.
//!
//! ## Send pipeline
//!
//! ```text
//! save user message -> POST /chat -> save assistant message
//! ```
//!
//! Each step is raced against the task's cancellation token. After each step
//! the result is applied under the state lock only if the task is still the
//! active one.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use acai_types::wire::{Citation, NewMessage};
use acai_types::{Message, ReactionKind, Sender};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::{ChatMutation, ChatSessionState};
use super::task::{TaskKind, TaskSeq, TaskStarted, TaskState};
use crate::api::{ApiError, ChatBackend};
use crate::config::ChatConfig;

/// Coarse lifecycle of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Nothing in flight.
    #[default]
    Idle,
    /// Initial message load in flight.
    Hydrating,
    /// A send is in flight.
    Sending,
    /// The last send was stopped by the user; ready for a new send.
    Aborted,
}

#[derive(Debug, Default)]
struct Inner {
    state: ChatSessionState,
    phase: SessionPhase,
    task: TaskState,
    seq: TaskSeq,
    next_local_id: u64,
}

impl Inner {
    fn start(&mut self, kind: TaskKind) -> TaskStarted {
        if let Some(previous) = self.task.cancel_active() {
            info!(?previous, "cancelling in-flight task");
            if previous == TaskKind::Send {
                self.state.apply(ChatMutation::AbortPending);
            }
        }
        let started = TaskStarted {
            id: self.seq.next_id(),
            kind,
            cancel: CancellationToken::new(),
        };
        self.task.on_started(&started);
        started
    }

    /// Ends a send with `error`; the caller has verified the task is active.
    fn fail_send(&mut self, started: &TaskStarted, error: &ApiError) {
        warn!(task = started.id.0, kind = %error.kind, "send failed: {error}");
        self.state.apply(ChatMutation::Finish {
            error: Some(error.to_string()),
        });
        self.task.finish_if_active(started.id);
        self.phase = SessionPhase::Idle;
    }
}

/// Chat session bound to a backend.
pub struct ChatSession<B> {
    backend: B,
    cancel_notice: String,
    inner: Mutex<Inner>,
}

impl<B: ChatBackend> ChatSession<B> {
    pub fn new(backend: B, config: &ChatConfig) -> Self {
        Self {
            backend,
            cancel_notice: config.cancel_notice.clone(),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> ChatSessionState {
        self.lock().state.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads persisted messages from the backend, replacing local messages.
    ///
    /// Skipped while a send is in flight. Failures land in `error`.
    pub async fn hydrate(&self) {
        let started = {
            let mut inner = self.lock();
            if inner.task.running_kind() == Some(TaskKind::Send) {
                debug!("hydrate skipped: send in flight");
                return;
            }
            let started = inner.start(TaskKind::Hydrate);
            inner.state.apply(ChatMutation::SetLoading(true));
            inner.phase = SessionPhase::Hydrating;
            started
        };

        let Some(result) = until_cancelled(&started.cancel, self.backend.fetch_messages()).await
        else {
            return;
        };

        let mut inner = self.lock();
        if !inner.task.finish_if_active(started.id) {
            debug!(task = started.id.0, "discarding stale hydrate result");
            return;
        }
        match result {
            Ok(rows) => {
                info!(count = rows.len(), "hydrated messages");
                let messages = rows.into_iter().map(|row| row.into_message()).collect();
                inner.state.apply(ChatMutation::SetMessages(messages));
            }
            Err(error) => {
                warn!(kind = %error.kind, "hydrate failed: {error}");
                inner.state.apply(ChatMutation::SetError(Some(error.to_string())));
            }
        }
        inner.state.apply(ChatMutation::SetLoading(false));
        inner.phase = SessionPhase::Idle;
    }

    /// Sends `content` as a user message and appends the assistant reply.
    ///
    /// Whitespace-only content is ignored without touching state or the
    /// backend. A send already in flight is cancelled and its results are
    /// discarded. Never fails: errors are stored in the session state.
    pub async fn send_message(&self, content: &str) {
        let content = content.trim();
        if content.is_empty() {
            debug!("ignoring empty message");
            return;
        }

        let now = Utc::now().timestamp_millis();
        let (started, local_id) = {
            let mut inner = self.lock();
            let started = inner.start(TaskKind::Send);
            let local_id = inner.next_local_id;
            inner.next_local_id += 1;
            inner.state.apply(ChatMutation::BeginSend(Message::pending_user(
                local_id, content, now,
            )));
            inner.phase = SessionPhase::Sending;
            info!(task = started.id.0, "send started");
            (started, local_id)
        };

        // 1. Persist the user message.
        let request = NewMessage::new(content, Sender::User, now);
        let Some(saved) = until_cancelled(&started.cancel, self.backend.save_message(request)).await
        else {
            return;
        };
        {
            let mut inner = self.lock();
            if !inner.task.is_active(started.id) {
                return;
            }
            match saved {
                Ok(row) => {
                    inner.state.apply(ChatMutation::Reconcile {
                        local_id,
                        server_id: row.id,
                        timestamp: row.timestamp,
                    });
                }
                Err(error) => {
                    inner.state.apply(ChatMutation::MarkFailed { local_id });
                    inner.fail_send(&started, &error);
                    return;
                }
            }
        }

        // 2. Ask for the assistant reply.
        let Some(reply) = until_cancelled(&started.cancel, self.backend.send_chat(content)).await
        else {
            return;
        };
        let reply = {
            let mut inner = self.lock();
            if !inner.task.is_active(started.id) {
                return;
            }
            match reply {
                Ok(reply) => reply,
                Err(error) => {
                    inner.fail_send(&started, &error);
                    return;
                }
            }
        };

        // 3. Persist the assistant message.
        let sources = reply
            .sources
            .into_iter()
            .map(Citation::into_source)
            .collect();
        let request = NewMessage::new(
            &reply.response,
            Sender::Assistant,
            Utc::now().timestamp_millis(),
        );
        let Some(saved) = until_cancelled(&started.cancel, self.backend.save_message(request)).await
        else {
            return;
        };
        let mut inner = self.lock();
        if !inner.task.is_active(started.id) {
            return;
        }
        match saved {
            Ok(row) => {
                let message = row.into_message().with_sources(sources);
                inner.state.apply(ChatMutation::Append(message));
                inner.state.apply(ChatMutation::Finish { error: None });
                inner.task.finish_if_active(started.id);
                inner.phase = SessionPhase::Idle;
                info!(task = started.id.0, "send completed");
            }
            Err(error) => inner.fail_send(&started, &error),
        }
    }

    /// Stops the in-flight send, if any.
    ///
    /// State reflects the stop immediately; the transport is only signalled.
    pub fn stop_generating(&self) {
        let mut inner = self.lock();
        if inner.phase != SessionPhase::Sending {
            return;
        }
        inner.task.cancel_active();
        inner.state.apply(ChatMutation::AbortPending);
        inner.state.apply(ChatMutation::Finish {
            error: Some(self.cancel_notice.clone()),
        });
        inner.phase = SessionPhase::Aborted;
        info!("generation stopped");
    }

    /// Replaces the content of persisted message `id`.
    ///
    /// Blank content is rejected and stored content is trimmed. Returns false
    /// when nothing changed (unknown id, blank or identical content).
    pub fn update_message(&self, id: i64, new_content: &str) -> bool {
        let changed = self.lock().state.apply(ChatMutation::UpdateMessage {
            id,
            content: new_content.to_string(),
        });
        debug!(id, changed, "update message");
        changed
    }

    pub fn set_edit_message_id(&self, id: Option<i64>) {
        self.lock().state.apply(ChatMutation::SetEditMessageId(id));
    }

    /// Resets the session to its initial state, cancelling any in-flight work.
    pub fn clear_chat(&self) {
        let mut inner = self.lock();
        inner.task.cancel_active();
        inner.state.apply(ChatMutation::Clear);
        inner.phase = SessionPhase::Idle;
        info!("chat cleared");
    }

    pub fn add_reaction(&self, id: i64, kind: ReactionKind) -> bool {
        self.lock()
            .state
            .apply(ChatMutation::AddReaction { id, kind })
    }

    pub fn remove_reaction(&self, id: i64, kind: ReactionKind) -> bool {
        self.lock()
            .state
            .apply(ChatMutation::RemoveReaction { id, kind })
    }

    pub fn set_search_query(&self, query: &str) {
        self.lock()
            .state
            .apply(ChatMutation::SetSearchQuery(query.to_string()));
    }
}

/// Runs `fut` unless `token` fires first.
async fn until_cancelled<F: Future>(token: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        () = token.cancelled() => None,
        out = fut => Some(out),
    }
}
