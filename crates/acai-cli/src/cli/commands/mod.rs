//! CLI command handlers.

pub mod chat;
pub mod config;
pub mod documents;
pub mod exec;
pub mod health;
pub mod messages;
