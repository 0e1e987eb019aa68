//! Message history command handlers.

use acai_core::api::{ApiClient, ChatBackend};
use anyhow::{Context, Result};

use crate::cli::render;

pub async fn list(client: &ApiClient) -> Result<()> {
    let rows = client.fetch_messages().await.context("list messages")?;
    if rows.is_empty() {
        println!("No messages found.");
    } else {
        for row in rows {
            println!("{}", render::history_line(&row.into_message()));
        }
    }
    Ok(())
}
