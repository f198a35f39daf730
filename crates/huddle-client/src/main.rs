use huddle_client::{terminal, ClientConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    huddle_client::init_tracing();

    let config = ClientConfig::from_env();
    tracing::info!(server = %config.server_url, "Starting Huddle terminal client");

    terminal::run(config).await
}
