//! CLI entry and dispatch.

use std::path::PathBuf;

use acai_core::api::ApiClient;
use acai_core::config;
use acai_core::documents::{SortBy, SortOrder};
use acai_core::logging;
use anyhow::{Context, Result};
use clap::Parser;

mod commands;
pub mod interrupt;
mod render;

#[derive(Parser)]
#[command(name = "acai")]
#[command(version)]
#[command(about = "Chat with your documents from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Backend base URL (overrides config and ACAI_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Start an interactive chat session (default)
    Chat,
    /// Sends one message and prints the reply
    Exec {
        /// The message to send
        #[arg(short, long)]
        prompt: String,
    },
    /// Inspect persisted chat messages
    Messages {
        #[command(subcommand)]
        command: MessageCommands,
    },
    /// Manage uploaded documents
    Documents {
        #[command(subcommand)]
        command: DocumentCommands,
    },
    /// Check that the backend is reachable
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum MessageCommands {
    /// Lists persisted messages
    List,
}

#[derive(clap::Subcommand)]
enum DocumentCommands {
    /// Lists documents
    List(ListArgs),
    /// Uploads a PDF, DOC, DOCX or TXT file
    Upload {
        #[arg(value_name = "PATH")]
        path: PathBuf,
        /// Upload even if a document with the same name exists
        #[arg(long)]
        force: bool,
    },
    /// Deletes a document
    Delete {
        #[arg(value_name = "DOCUMENT_ID")]
        id: String,
    },
    /// Shows the extracted pages of a document
    Pages {
        #[arg(value_name = "DOCUMENT_ID")]
        id: String,
        /// Only show pages containing this text
        #[arg(long)]
        search: Option<String>,
        /// Print one page with a source reference appended
        #[arg(long, value_name = "PAGE")]
        cite: Option<u32>,
    },
}

/// Filters and ordering for `documents list`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only documents of this type (e.g. .pdf)
    #[arg(long = "type", value_name = "TYPE")]
    pub file_type: Option<String>,
    /// Only documents with this status
    #[arg(long)]
    pub status: Option<String>,
    /// Only documents created on this date prefix (e.g. 2024-05)
    #[arg(long)]
    pub date: Option<String>,
    /// Filename contains (case-insensitive)
    #[arg(long)]
    pub search: Option<String>,
    /// Sort field (created_at, filename)
    #[arg(long, default_value = "created_at")]
    pub sort: SortBy,
    /// Sort order (asc, desc)
    #[arg(long, default_value = "desc")]
    pub order: SortOrder,
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = config::Config::load().context("load config")?;
    // File logging is best effort; commands still run without it.
    let _log_guard = match logging::init(&config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: file logging disabled: {e:#}");
            None
        }
    };

    let Cli { command, api_url } = cli;

    let connect = || -> Result<ApiClient> {
        match api_url.as_deref() {
            Some(url) => ApiClient::new(url.trim(), config.request_timeout()),
            None => ApiClient::from_config(&config),
        }
    };

    // default to chat mode
    let Some(command) = command else {
        return commands::chat::run(connect()?, &config).await;
    };

    match command {
        Commands::Chat => commands::chat::run(connect()?, &config).await,
        Commands::Exec { prompt } => commands::exec::run(connect()?, &config, &prompt).await,
        Commands::Messages { command } => match command {
            MessageCommands::List => commands::messages::list(&connect()?).await,
        },
        Commands::Documents { command } => {
            let client = connect()?;
            match command {
                DocumentCommands::List(args) => commands::documents::list(&client, &args).await,
                DocumentCommands::Upload { path, force } => {
                    commands::documents::upload(&client, &path, force).await
                }
                DocumentCommands::Delete { id } => {
                    commands::documents::delete(&client, &id).await
                }
                DocumentCommands::Pages { id, search, cite } => {
                    commands::documents::pages(&client, &id, search.as_deref(), cite).await
                }
            }
        }
        Commands::Health => commands::health::run(&connect()?).await,
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
