//! SMSC simulator library.
//!
//! Emulates a carrier SMS Message Center for integration testing. Multiple
//! independent HTTP listeners accept submissions, record them into a shared
//! bounded ledger persisted to a flat JSON file, and serve message history
//! and delivery statistics.

pub mod bootstrap;
pub mod config;
pub mod http;
pub mod ingest;
pub mod ledger;
pub mod telemetry;
