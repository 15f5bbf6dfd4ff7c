//! Dudo Game Server
//!
//! Authoritative server for the dice-bluffing game. Owns all shared game
//! state and is the single source of truth for every connected client.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dudo::network::server::{DudoServer, ServerConfig};
use dudo::VERSION;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; RUST_LOG overrides the default level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = ServerConfig::default();
    if let Some(port) = std::env::args().nth(1) {
        let port: u16 = port.parse().context("listening port must be a number")?;
        config.bind_addr.set_port(port);
    }

    info!("Dudo Server v{}", VERSION);
    info!("Starting on {}", config.bind_addr);

    let server = DudoServer::new(config);
    server.run().await.context("server startup failed")?;

    Ok(())
}
