//! Reconciliation between a process-local view and the shared store.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::record::MessageRecord;
use super::store::LedgerStore;

/// One process's view of the ledger, kept in sync with the shared store.
///
/// Ordering is weakly consistent across processes: the local order is
/// preserved, newly discovered store records follow in store order, and
/// records become visible to siblings after their next reconcile. Within
/// one process, records appear in submission order.
pub struct Ledger {
    store: LedgerStore,
    records: Vec<MessageRecord>,
    next_id: u64,
    started_at: DateTime<Utc>,
}

impl Ledger {
    /// Open a ledger over the given store.
    ///
    /// The local view starts from whatever the store currently holds, and
    /// the id counter is seeded past the highest persisted id so fresh
    /// records do not collide with records from earlier in this ledger
    /// generation.
    pub fn open(store: LedgerStore) -> Self {
        let records = store.read_or_empty();
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;

        info!(
            path = %store.path().display(),
            recovered = records.len(),
            next_id,
            "ledger opened"
        );

        Self {
            store,
            records,
            next_id,
            started_at: Utc::now(),
        }
    }

    /// Allocate the next record id.
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// When this process's statistics window started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The current local view, without reconciling.
    pub fn view(&self) -> &[MessageRecord] {
        &self.records
    }

    /// Append a record to the local view, apply the cap, and persist.
    ///
    /// If persistence fails the record stays in the local view: visibility
    /// degrades to process-local instead of the message being lost, and the
    /// submission still counts as accepted.
    pub fn record_and_persist(&mut self, record: MessageRecord) -> MessageRecord {
        self.records.push(record.clone());
        self.apply_cap();

        if let Err(e) = self.store.append(record.clone()) {
            warn!(
                id = record.id,
                error = %e,
                "failed to persist record, visible to this process only"
            );
        } else {
            debug!(id = record.id, source = %record.source, "record persisted");
        }

        record
    }

    /// Merge records written by sibling processes into the local view.
    ///
    /// Store records whose id is already present locally are skipped; the
    /// rest are appended in the order they appear in the store. The FIFO
    /// cap is re-applied to the merged result. A corrupt or missing store
    /// merges as empty.
    pub fn reconcile(&mut self) -> &[MessageRecord] {
        let stored = self.store.read_or_empty();
        let known: HashSet<u64> = self.records.iter().map(|r| r.id).collect();

        let mut discovered = 0usize;
        for record in stored {
            if !known.contains(&record.id) {
                self.records.push(record);
                discovered += 1;
            }
        }

        if discovered > 0 {
            debug!(discovered, "merged records from sibling processes");
        }

        self.apply_cap();
        &self.records
    }

    /// Empty the ledger and reset the id counter, clearing the store too.
    ///
    /// Idempotent. A store failure is downgraded: the local view is cleared
    /// regardless and the store self-heals on the next successful write.
    pub fn clear(&mut self) {
        self.records.clear();
        self.next_id = 1;

        if let Err(e) = self.store.replace_all(&[]) {
            warn!(error = %e, "failed to clear shared ledger file");
        }

        info!("ledger cleared");
    }

    /// Clear the ledger and restart the statistics window.
    pub fn reset_stats(&mut self) {
        self.clear();
        self.started_at = Utc::now();
        info!("statistics reset");
    }

    fn apply_cap(&mut self) {
        let capacity = self.store.capacity();
        if self.records.len() > capacity {
            let excess = self.records.len() - capacity;
            self.records.drain(..excess);
        }
    }
}
