//! Chat session: state, task tracking, and the manager that drives the backend.

mod session;
mod state;
mod task;

pub use session::{ChatSession, SessionPhase};
pub use state::{ChatMutation, ChatSessionState};
pub use task::{TaskId, TaskKind};
