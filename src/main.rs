//! Noughts Game Server
//!
//! Entry point: configuration, logging, shutdown signal, serve loop.

use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use noughts::{Config, Server, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let config = Config::from_env();
    info!("Noughts Server v{}", VERSION);
    info!("Database file: {}", config.db_file().display());
    info!("Port: {}", config.port);

    let server = Server::new(config);

    // ctrl-c requests a graceful stop; the serve loop and both background
    // tasks listen on the same channel.
    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = shutdown.send(());
        }
    });

    server.run().await
}
