//! Generation tracking for the session's in-flight backend work.
//!
//! Every hydrate or send takes a fresh [`TaskId`] and a cancellation token.
//! Completions only touch state if their id is still the active one, so a
//! replaced or stopped task's late results are dropped.

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

#[derive(Debug, Default)]
pub struct TaskSeq {
    next: u64,
}

impl TaskSeq {
    pub fn next_id(&mut self) -> TaskId {
        let id = TaskId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Hydrate,
    Send,
}

#[derive(Debug, Clone)]
pub struct TaskStarted {
    pub id: TaskId,
    pub kind: TaskKind,
    pub cancel: CancellationToken,
}

/// The single active task slot.
#[derive(Debug, Default, Clone)]
pub struct TaskState {
    pub active: Option<TaskId>,
    pub kind: Option<TaskKind>,
    pub cancel: Option<CancellationToken>,
}

impl TaskState {
    pub fn is_active(&self, id: TaskId) -> bool {
        self.active == Some(id)
    }

    pub fn running_kind(&self) -> Option<TaskKind> {
        self.active.and(self.kind)
    }

    pub fn on_started(&mut self, started: &TaskStarted) {
        self.active = Some(started.id);
        self.kind = Some(started.kind);
        self.cancel = Some(started.cancel.clone());
    }

    pub fn finish_if_active(&mut self, id: TaskId) -> bool {
        let ok = self.active == Some(id);
        if ok {
            self.clear();
        }
        ok
    }

    /// Signals the active task's token and frees the slot.
    ///
    /// Returns the kind of task that was cancelled, if any.
    pub fn cancel_active(&mut self) -> Option<TaskKind> {
        let kind = self.running_kind();
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        self.clear();
        kind
    }

    pub fn clear(&mut self) {
        self.active = None;
        self.kind = None;
        self.cancel = None;
    }
}
