//! Client configuration loaded from environment variables.
//!
//! Every setting has a default so the terminal client starts against a
//! locally running development server with zero configuration.

use std::time::Duration;

use huddle_shared::constants::POLL_INTERVAL;
use huddle_shared::User;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the chat backend.
    /// Env: `HUDDLE_SERVER_URL`
    /// Default: `http://127.0.0.1:8080`
    pub server_url: String,

    /// Bearer token sent with every request.
    /// Env: `HUDDLE_TOKEN`
    /// Default: `alice-token` (matches the development server's first user).
    pub token: Option<String>,

    /// The authenticated user this session acts as.
    /// Env: `HUDDLE_USER_ID` + `HUDDLE_USERNAME`
    /// Default: `1` / `alice`
    pub current_user: Option<User>,

    /// Delay between two message-list fetches.
    /// Env: `HUDDLE_POLL_INTERVAL_SECS`
    /// Default: 5 seconds
    pub poll_interval: Duration,

    /// Whether the scheduler posts a "Meeting scheduled at ..." chat message
    /// after a successful schedule.
    /// Env: `HUDDLE_CONFIRMATION_MESSAGE` (true/false)
    /// Default: `true`
    pub post_confirmation_message: bool,

    /// Per-request timeout.
    /// Env: `HUDDLE_REQUEST_TIMEOUT_SECS`
    /// Default: 10 seconds
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".to_string(),
            token: Some("alice-token".to_string()),
            current_user: Some(User::new(1, "alice")),
            poll_interval: POLL_INTERVAL,
            post_confirmation_message: true,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("HUDDLE_SERVER_URL") {
            config.server_url = url.trim_end_matches('/').to_string();
        }

        if let Some(token) = lookup("HUDDLE_TOKEN") {
            config.token = if token.is_empty() { None } else { Some(token) };
        }

        match (lookup("HUDDLE_USER_ID"), lookup("HUDDLE_USERNAME")) {
            (Some(id), Some(username)) => match id.parse::<i64>() {
                Ok(id) => config.current_user = Some(User::new(id, username)),
                Err(_) => {
                    tracing::warn!(value = %id, "Invalid HUDDLE_USER_ID, running without a current user");
                    config.current_user = None;
                }
            },
            (None, None) => {}
            _ => {
                tracing::warn!("HUDDLE_USER_ID and HUDDLE_USERNAME must be set together, using default user");
            }
        }

        if let Some(val) = lookup("HUDDLE_POLL_INTERVAL_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.poll_interval = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid HUDDLE_POLL_INTERVAL_SECS, using default"),
            }
        }

        if let Some(val) = lookup("HUDDLE_CONFIRMATION_MESSAGE") {
            config.post_confirmation_message = val != "false" && val != "0";
        }

        if let Some(val) = lookup("HUDDLE_REQUEST_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid HUDDLE_REQUEST_TIMEOUT_SECS, using default"),
            }
        }

        config
    }
}
