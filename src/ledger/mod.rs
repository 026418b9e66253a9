//! The shared message ledger.
//!
//! The ledger is the single source of truth across listener processes:
//! a bounded, ordered, deduplicated sequence of message records backed by
//! a flat JSON file.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                       Ledger                          │
//! │  process-local view + id counter + uptime baseline    │
//! └───────────────────────────────────────────────────────┘
//!           │ record_and_persist / reconcile
//!           ▼
//! ┌───────────────────────────────────────────────────────┐
//! │                     LedgerStore                       │
//! │  flat JSON file, FIFO cap, atomic replace-on-write    │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! Writes go through the local view first and are persisted synchronously;
//! a failed write degrades to process-local visibility instead of losing
//! the record. Reads reconcile the local view against the store so records
//! written by sibling processes become visible.

mod merger;
mod record;
mod stats;
mod store;

pub use merger::Ledger;
pub use record::{DeliveryStatus, Direction, MessageRecord, SubmissionPayload};
pub use stats::{compute, LedgerStats};
pub use store::{LedgerStore, StoreError};
