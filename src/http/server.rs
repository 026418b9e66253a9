//! Per-listener HTTP server.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::bootstrap::{SharedSimulatorState, Shutdown};
use crate::config::ListenerConfig;

use super::handlers::{build_router, ListenerState};

/// One configured delivery path, not yet bound.
pub struct HttpListener {
    config: ListenerConfig,
    state: SharedSimulatorState,
    shutdown: Arc<Shutdown>,
}

impl HttpListener {
    pub fn new(
        config: ListenerConfig,
        state: SharedSimulatorState,
        shutdown: Arc<Shutdown>,
    ) -> Self {
        Self {
            config,
            state,
            shutdown,
        }
    }

    /// Bind the socket. Separated from serving so the caller can decide
    /// what a failed bind means (the privileged legacy port is optional).
    pub async fn bind(self) -> std::io::Result<BoundListener> {
        let listener = TcpListener::bind(self.config.address).await?;

        let state = Arc::new(ListenerState {
            name: self.config.name.clone(),
            shared: self.state,
        });
        let router = build_router(self.config.profile, state);

        Ok(BoundListener {
            name: self.config.name,
            listener,
            router,
            shutdown: self.shutdown,
        })
    }
}

/// A bound listener ready to serve.
pub struct BoundListener {
    name: String,
    listener: TcpListener,
    router: Router,
    shutdown: Arc<Shutdown>,
}

impl BoundListener {
    /// Serve until the shutdown signal fires.
    pub async fn serve(self) -> std::io::Result<()> {
        let mut shutdown_rx = self.shutdown.subscribe();
        let name = self.name;

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
                info!(listener = %name, "listener shutting down");
            })
            .await
    }

    /// The locally bound address (useful when binding to port 0).
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }
}
