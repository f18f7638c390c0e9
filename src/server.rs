//! Server Runtime
//!
//! Wires the components together: the HTTP listener, the recurring
//! sweep/purge tasks, and one shutdown path that stops all of them.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::info;

use crate::api;
use crate::auth::{LoginCodeRegistry, RateLimiter, PURGE_INTERVAL, SWEEP_INTERVAL};
use crate::config::Config;
use crate::state::AppState;

/// The assembled server: component set plus shutdown channel.
pub struct Server {
    state: AppState,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Build a server from configuration.
    pub fn new(config: Config) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            state: AppState::new(config),
            shutdown_tx,
        }
    }

    /// Handle for requesting shutdown from another task.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// The shared component set, for embedding and tests.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run until shutdown is requested.
    ///
    /// The code sweeper and limiter purge run for the whole server
    /// lifetime, whether or not requests are in flight; both stop when the
    /// shutdown channel fires.
    pub async fn run(&self) -> anyhow::Result<()> {
        // One round-trip rewrites the backing file in the current schema
        // before any request sees it.
        self.state.store.normalize().await?;

        let sweeper = LoginCodeRegistry::spawn_sweeper(
            self.state.codes.clone(),
            SWEEP_INTERVAL,
            self.shutdown_tx.subscribe(),
        );
        let purger = RateLimiter::spawn_purger(
            self.state.limiter.clone(),
            PURGE_INTERVAL,
            self.shutdown_tx.subscribe(),
        );

        let listener = TcpListener::bind(self.state.config.bind_addr()).await?;
        info!("Listening on {}", listener.local_addr()?);

        let app = api::router(self.state.clone());
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await?;

        sweeper.abort();
        purger.abort();
        info!("Server stopped");
        Ok(())
    }
}
