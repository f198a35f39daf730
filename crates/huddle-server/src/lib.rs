//! # huddle-server
//!
//! Small REST backend for huddle group chat: one group, its message history,
//! and meeting proposals raised from messages that read like a request to
//! meet. Accounts authenticate with static bearer tokens from the config.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod intent;
pub mod store;

pub use api::{build_router, serve, AppState};
pub use config::ServerConfig;
