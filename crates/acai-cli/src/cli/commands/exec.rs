//! Exec command handler.

use acai_core::api::ApiClient;
use acai_core::chat::ChatSession;
use acai_core::config::Config;
use acai_types::Sender;
use anyhow::{Context, Result};

use crate::cli::interrupt::{self, InterruptedError};
use crate::cli::render;

pub async fn run(client: ApiClient, config: &Config, prompt: &str) -> Result<()> {
    if prompt.trim().is_empty() {
        anyhow::bail!("Prompt is empty");
    }

    let session = ChatSession::new(client, &config.chat);
    if interrupt::send_interruptible(&session, prompt).await {
        return Err(InterruptedError.into());
    }

    let state = session.snapshot();
    if let Some(error) = state.error() {
        anyhow::bail!("{error}");
    }
    let reply = state
        .messages()
        .iter()
        .rev()
        .find(|m| m.sender == Sender::Assistant)
        .context("No reply received")?;
    println!("{}", render::reply(reply));
    Ok(())
}
