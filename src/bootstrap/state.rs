//! Shared simulator state.
//!
//! Constructed once at process start and injected into every listener;
//! the ledger (and through it, the shared store file) is the only piece
//! of state touched by more than one task.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::ledger::{Ledger, LedgerStore};

/// Shared simulator state, cloned cheaply into each listener.
#[derive(Clone)]
pub struct SimulatorState {
    /// Process-local ledger view over the shared store
    pub ledger: Arc<Mutex<Ledger>>,
    /// Configuration
    pub config: Arc<Config>,
}

/// Shared handle passed to request handlers.
pub type SharedSimulatorState = Arc<SimulatorState>;

impl SimulatorState {
    /// Create simulator state from configuration, opening the ledger.
    pub fn new(config: Arc<Config>) -> Self {
        let store = LedgerStore::new(config.store.path.clone(), config.store.capacity);
        let ledger = Ledger::open(store);

        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            config,
        }
    }
}
