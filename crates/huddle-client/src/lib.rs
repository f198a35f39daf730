pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod events;
pub mod message_view;
pub mod scheduler;
pub mod state;
pub mod terminal;

use tracing_subscriber::{fmt, EnvFilter};

pub use api::{ChatApi, HttpApi};
pub use auth::AuthContext;
pub use chat::{ChatConfig, ChatInterface, ChatView};
pub use config::ClientConfig;
pub use error::{ClientError, SchedulerError};

/// Install the global tracing subscriber. `RUST_LOG` wins over the default
/// filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("huddle_client=info,warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
