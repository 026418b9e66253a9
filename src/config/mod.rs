//! Configuration loading and validation.

mod loader;
mod types;

pub use types::{Config, EndpointProfile, ListenerConfig, Settings, StoreConfig};
