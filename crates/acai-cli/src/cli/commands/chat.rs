//! Interactive chat command handler.
//!
//! Plain lines are sent as messages; lines starting with `/` are commands.
//! Ctrl+C while a reply is pending stops generation; at the prompt it exits.

use std::io::Write;

use acai_core::api::{ApiClient, ChatBackend};
use acai_core::chat::ChatSession;
use acai_core::config::Config;
use acai_types::{ReactionKind, Sender};
use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::interrupt::{self, InterruptedError};
use crate::cli::render;

const HELP: &str = "\
Commands:
  /list                  show messages (filtered by /search)
  /search [text]         filter messages; no text clears the filter
  /edit <id> <text>      replace the content of a message
  /react <id> <kind>     react to a reply (like, dislike, helpful, thanks)
  /unreact <id> <kind>   remove your reaction
  /clear                 clear the conversation
  /help                  show this help
  /quit                  exit";

/// A parsed line of input.
#[derive(Debug, PartialEq)]
enum Input {
    Send(String),
    List,
    Search(String),
    Edit { id: i64, content: String },
    React { id: i64, kind: ReactionKind },
    Unreact { id: i64, kind: ReactionKind },
    Clear,
    Help,
    Quit,
    Empty,
}

fn parse_input(line: &str) -> Result<Input> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Empty);
    }
    let Some(command) = line.strip_prefix('/') else {
        return Ok(Input::Send(line.to_string()));
    };

    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(name, rest)| (name, rest.trim()));
    match name {
        "list" => Ok(Input::List),
        "search" => Ok(Input::Search(rest.to_string())),
        "edit" => {
            let (id, content) = rest
                .split_once(char::is_whitespace)
                .context("Usage: /edit <id> <text>")?;
            Ok(Input::Edit {
                id: parse_id(id)?,
                content: content.trim().to_string(),
            })
        }
        "react" | "unreact" => {
            let (id, kind) = rest
                .split_once(char::is_whitespace)
                .with_context(|| format!("Usage: /{name} <id> <kind>"))?;
            let id = parse_id(id)?;
            let kind = kind.parse::<ReactionKind>().map_err(anyhow::Error::msg)?;
            Ok(if name == "react" {
                Input::React { id, kind }
            } else {
                Input::Unreact { id, kind }
            })
        }
        "clear" => Ok(Input::Clear),
        "help" => Ok(Input::Help),
        "quit" | "exit" => Ok(Input::Quit),
        _ => anyhow::bail!("Unknown command '/{name}'. Type /help for commands."),
    }
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .with_context(|| format!("Invalid message id '{raw}'"))
}

pub async fn run(client: ApiClient, config: &Config) -> Result<()> {
    let session = ChatSession::new(client, &config.chat);
    session.hydrate().await;
    let state = session.snapshot();
    if let Some(error) = state.error() {
        eprintln!("Could not load history: {error}");
    }
    for message in state.messages() {
        println!("{}", render::message_line(message));
    }
    println!("Connected to {}. Type /help for commands.", session.backend().base_url());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().context("flush stdout")?;

        let line = tokio::select! {
            line = lines.next_line() => line.context("read input")?,
            () = interrupt::ctrl_c() => return Err(InterruptedError.into()),
        };
        // EOF
        let Some(line) = line else {
            println!();
            return Ok(());
        };

        let input = match parse_input(&line) {
            Ok(input) => input,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        if input == Input::Quit {
            return Ok(());
        }
        handle(&session, input).await;
    }
}

async fn handle<B: ChatBackend>(session: &ChatSession<B>, input: Input) {
    match input {
        Input::Send(content) => send(session, &content).await,
        Input::List => {
            let state = session.snapshot();
            if state.filtered_messages().is_empty() {
                println!("No messages.");
            }
            for message in state.filtered_messages() {
                println!("{}", render::message_line(message));
            }
        }
        Input::Search(query) => {
            session.set_search_query(&query);
            let state = session.snapshot();
            println!(
                "{} of {} messages match",
                state.filtered_messages().len(),
                state.messages().len()
            );
        }
        Input::Edit { id, content } => {
            session.set_edit_message_id(Some(id));
            let changed = session.update_message(id, &content);
            session.set_edit_message_id(None);
            if changed {
                println!("Updated message {id}");
            } else {
                println!("No change to message {id}");
            }
        }
        Input::React { id, kind } => {
            if !session.add_reaction(id, kind) {
                println!("Cannot add {kind} to message {id}");
            }
        }
        Input::Unreact { id, kind } => {
            if !session.remove_reaction(id, kind) {
                println!("No {kind} reaction on message {id}");
            }
        }
        Input::Clear => {
            session.clear_chat();
            println!("Chat cleared.");
        }
        Input::Help => println!("{HELP}"),
        Input::Quit | Input::Empty => {}
    }
}

async fn send<B: ChatBackend>(session: &ChatSession<B>, content: &str) {
    let before = session.snapshot().messages().len();
    if interrupt::send_interruptible(session, content).await {
        println!();
    }

    let state = session.snapshot();
    for message in state.messages().iter().skip(before) {
        if message.sender == Sender::Assistant {
            println!("{}", render::reply(message));
        }
    }
    if let Some(error) = state.error() {
        eprintln!("{error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_is_sent_trimmed() {
        assert_eq!(
            parse_input("  hello there \n").unwrap(),
            Input::Send("hello there".to_string())
        );
        assert_eq!(parse_input("   ").unwrap(), Input::Empty);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_input("/list").unwrap(), Input::List);
        assert_eq!(parse_input("/search").unwrap(), Input::Search(String::new()));
        assert_eq!(
            parse_input("/search  cell biology").unwrap(),
            Input::Search("cell biology".to_string())
        );
        assert_eq!(
            parse_input("/edit 12 new text here").unwrap(),
            Input::Edit {
                id: 12,
                content: "new text here".to_string()
            }
        );
        assert_eq!(
            parse_input("/react 3 helpful").unwrap(),
            Input::React {
                id: 3,
                kind: ReactionKind::Helpful
            }
        );
        assert_eq!(
            parse_input("/unreact 3 like").unwrap(),
            Input::Unreact {
                id: 3,
                kind: ReactionKind::Like
            }
        );
        assert_eq!(parse_input("/quit").unwrap(), Input::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_input("/edit 12").is_err());
        assert!(parse_input("/edit abc text").is_err());
        let err = parse_input("/react 3 love").unwrap_err();
        assert!(err.to_string().contains("Valid options"));
        let err = parse_input("/bogus").unwrap_err();
        assert!(err.to_string().contains("Unknown command"));
    }
}
