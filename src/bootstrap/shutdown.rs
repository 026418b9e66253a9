use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Graceful shutdown signal shared by all listener tasks.
///
/// Listeners subscribe to the watch channel and stop accepting when the
/// signal fires; in-flight requests are allowed to finish by axum's
/// graceful shutdown.
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Arc<Self> {
        let (tx, _) = watch::channel(false);
        Arc::new(Self { tx })
    }

    /// Signal all subscribers to stop.
    pub fn trigger(&self) {
        info!("shutdown triggered");
        let _ = self.tx.send(true);
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Whether shutdown has been triggered.
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}
