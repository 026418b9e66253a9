//! Process bootstrap: shared state, listeners, graceful shutdown.

mod server;
mod shutdown;
mod state;

pub use server::Server;
pub use shutdown::Shutdown;
pub use state::{SharedSimulatorState, SimulatorState};
