//! Ctrl+C handling for interactive and one-shot sends.

use acai_core::api::ChatBackend;
use acai_core::chat::ChatSession;

#[derive(Debug)]
pub struct InterruptedError;

impl std::fmt::Display for InterruptedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interrupted")
    }
}

impl std::error::Error for InterruptedError {}

/// Resolves on the next Ctrl+C.
///
/// Never resolves if the signal handler cannot be installed.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Ctrl+C handler unavailable: {e}");
        std::future::pending::<()>().await;
    }
}

/// Runs one send; Ctrl+C stops generation instead of killing the process.
///
/// Returns true if the send was stopped.
pub async fn send_interruptible<B: ChatBackend>(session: &ChatSession<B>, content: &str) -> bool {
    let send = session.send_message(content);
    tokio::pin!(send);
    tokio::select! {
        () = &mut send => false,
        () = ctrl_c() => {
            session.stop_generating();
            send.await;
            true
        }
    }
}
