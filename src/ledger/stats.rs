//! Statistics derived from a reconciled ledger view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{DeliveryStatus, MessageRecord};

/// Aggregate delivery statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_messages: usize,
    pub successful_messages: usize,
    pub failed_messages: usize,
    pub uptime_seconds: i64,
    /// total / max(uptime in minutes, 1), rounded to 2 decimal places
    pub messages_per_minute: f64,
    /// Most recent record, if any
    pub last_processed: Option<MessageRecord>,
    pub last_message_time: Option<String>,
    pub start_time: String,
}

/// Compute statistics from a reconciled view.
///
/// Pure and O(n) in the view size; n is capped by the ledger capacity.
/// Counters are always a full scan of the view, so they cannot drift.
pub fn compute(view: &[MessageRecord], started_at: DateTime<Utc>) -> LedgerStats {
    let total = view.len();
    let successful = view
        .iter()
        .filter(|r| r.status == DeliveryStatus::Success)
        .count();
    let failed = total - successful;

    let uptime = Utc::now().signed_duration_since(started_at);
    let uptime_seconds = uptime.num_seconds().max(0);
    let uptime_minutes = uptime_seconds as f64 / 60.0;

    let per_minute = total as f64 / uptime_minutes.max(1.0);
    let messages_per_minute = (per_minute * 100.0).round() / 100.0;

    let last_processed = view.last().cloned();
    let last_message_time = last_processed.as_ref().map(|r| r.timestamp.clone());

    LedgerStats {
        total_messages: total,
        successful_messages: successful,
        failed_messages: failed,
        uptime_seconds,
        messages_per_minute,
        last_processed,
        last_message_time,
        start_time: started_at.to_rfc3339(),
    }
}
