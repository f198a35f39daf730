//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;

use huddle_shared::constants::{DEFAULT_HTTP_PORT, MESSAGE_HISTORY_LIMIT};
use huddle_shared::User;

/// A user allowed to talk to this server, with the bearer token that
/// authenticates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub user: User,
    pub token: String,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Name of the single chat group every account belongs to.
    /// Env: `GROUP_NAME`
    /// Default: `"General"`
    pub group_name: String,

    /// Accounts as `id:username:token` entries separated by commas.
    /// Env: `USERS`
    /// Default: `1:alice:alice-token,2:bob:bob-token` (development only).
    pub accounts: Vec<Account>,

    /// Number of messages returned by `GET /chat/messages/`.
    /// Env: `MESSAGE_HISTORY_LIMIT`
    /// Default: `50`
    pub message_history_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            group_name: "General".to_string(),
            accounts: vec![
                Account {
                    user: User::new(1, "alice"),
                    token: "alice-token".to_string(),
                },
                Account {
                    user: User::new(2, "bob"),
                    token: "bob-token".to_string(),
                },
            ],
            message_history_limit: MESSAGE_HISTORY_LIMIT,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(
                    value = %addr,
                    "Invalid HTTP_ADDR, using default"
                );
            }
        }

        if let Ok(name) = std::env::var("GROUP_NAME") {
            if !name.trim().is_empty() {
                config.group_name = name;
            }
        }

        if let Ok(users) = std::env::var("USERS") {
            match parse_accounts(&users) {
                Ok(accounts) => config.accounts = accounts,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Invalid USERS, using default development accounts"
                    );
                }
            }
        }

        if let Ok(val) = std::env::var("MESSAGE_HISTORY_LIMIT") {
            if let Ok(n) = val.parse::<usize>() {
                config.message_history_limit = n;
            }
        }

        config
    }

    pub fn account_for_token(&self, token: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.token == token)
    }
}

/// Parse `id:username:token[,id:username:token...]`.
fn parse_accounts(raw: &str) -> Result<Vec<Account>, String> {
    let mut accounts: Vec<Account> = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let mut fields = entry.splitn(3, ':');
        let (Some(id), Some(username), Some(token)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(format!("expected id:username:token, got {entry:?}"));
        };

        let id = id
            .parse::<i64>()
            .map_err(|_| format!("invalid user id {id:?}"))?;
        if username.is_empty() || token.is_empty() {
            return Err(format!("empty username or token in {entry:?}"));
        }
        if accounts.iter().any(|a| a.user.id.0 == id || a.token == token) {
            return Err(format!("duplicate id or token in {entry:?}"));
        }

        accounts.push(Account {
            user: User::new(id, username),
            token: token.to_string(),
        });
    }

    if accounts.is_empty() {
        return Err("no accounts".to_string());
    }
    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.message_history_limit, 50);
        assert_eq!(
            config.account_for_token("bob-token").map(|a| a.user.username.as_str()),
            Some("bob")
        );
        assert!(config.account_for_token("nope").is_none());
    }

    #[test]
    fn test_parse_accounts() {
        let accounts = parse_accounts("1:a:tok-a, 2:b:tok:with:colons").unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[1].user, User::new(2, "b"));
        assert_eq!(accounts[1].token, "tok:with:colons");
    }

    #[test]
    fn test_parse_accounts_rejects_bad_entries() {
        assert!(parse_accounts("").is_err());
        assert!(parse_accounts("x:a:tok").is_err());
        assert!(parse_accounts("1:a").is_err());
        assert!(parse_accounts("1:a:t,1:b:u").is_err());
    }
}
