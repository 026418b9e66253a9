//! HTTP listeners and request handlers.
//!
//! A single router parameterized by the listener's [`EndpointProfile`]
//! replaces per-listener handler types: every delivery path shares the
//! same handler functions and differs only in which routes are mounted.
//!
//! [`EndpointProfile`]: crate::config::EndpointProfile

mod handlers;
mod server;

pub use handlers::{build_router, ListenerState};
pub use server::{BoundListener, HttpListener};
