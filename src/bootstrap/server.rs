use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::http::HttpListener;

use super::shutdown::Shutdown;
use super::state::SimulatorState;

/// Main smscd server.
///
/// Spawns one HTTP listener task per configured delivery path and runs
/// until a shutdown signal. A listener that cannot bind (the legacy
/// port-80 path typically needs elevated privileges) is skipped with a
/// warning rather than failing the whole simulator.
pub struct Server {
    config: Arc<Config>,
    shutdown: Arc<Shutdown>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: Shutdown::new(),
        }
    }

    /// Run the server until shutdown
    pub async fn run(self) -> Result<()> {
        info!(
            listeners = self.config.listeners.len(),
            store = %self.config.store.path.display(),
            capacity = self.config.store.capacity,
            "starting smscd server"
        );

        let state = Arc::new(SimulatorState::new(self.config.clone()));

        let mut tasks = JoinSet::new();
        let mut started = 0usize;

        for listener_config in &self.config.listeners {
            let listener = HttpListener::new(
                listener_config.clone(),
                state.clone(),
                self.shutdown.clone(),
            );

            match listener.bind().await {
                Ok(bound) => {
                    info!(
                        name = %listener_config.name,
                        address = %listener_config.address,
                        profile = listener_config.profile.name(),
                        "listener started"
                    );
                    started += 1;
                    tasks.spawn(async move {
                        if let Err(e) = bound.serve().await {
                            error!(error = %e, "listener failed");
                        }
                    });
                }
                Err(e) => {
                    // Privileged or occupied ports keep the rest running.
                    warn!(
                        name = %listener_config.name,
                        address = %listener_config.address,
                        error = %e,
                        "cannot start listener, skipping"
                    );
                }
            }
        }

        if started == 0 {
            anyhow::bail!("no listener could be started");
        }

        info!(started, "smscd server started");

        self.wait_for_shutdown().await;
        info!("shutdown signal received, stopping listeners");
        self.shutdown.trigger();

        while tasks.join_next().await.is_some() {}

        info!("smscd server stopped");
        Ok(())
    }

    /// Wait for shutdown signal (SIGINT or SIGTERM)
    async fn wait_for_shutdown(&self) {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("received SIGINT (Ctrl+C)");
            }
            _ = terminate => {
                info!("received SIGTERM");
            }
        }
    }
}
