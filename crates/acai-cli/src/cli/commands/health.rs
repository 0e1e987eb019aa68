//! Health command handler.

use acai_core::api::ApiClient;
use anyhow::{Context, Result};

pub async fn run(client: &ApiClient) -> Result<()> {
    let health = client
        .health()
        .await
        .with_context(|| format!("check backend at {}", client.base_url()))?;
    println!("{}: {}", client.base_url(), health.status);
    Ok(())
}
