//! Core ACAI library (config, logging, backend API client, chat session, documents).

pub mod api;
pub mod chat;
pub mod config;
pub mod documents;
pub mod logging;
