//! Core entities for the block scheduler.

use shared_types::{encoded_size, Transaction, TransactionId, TransactionReceipt};
use std::sync::Arc;

/// A transaction waiting to be scheduled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTransaction {
    /// Transaction id.
    pub id: TransactionId,
    /// The transaction.
    pub trx: Arc<Transaction>,
    /// Encoded transaction size in bytes.
    pub packed_size: usize,
}

impl PendingTransaction {
    /// Wrap a transaction, computing its id and size once.
    pub fn new(trx: Arc<Transaction>) -> Self {
        Self {
            id: trx.id(),
            packed_size: trx.packed_size(),
            trx,
        }
    }

    /// Bytes this transaction adds to a block: the body plus its receipt.
    pub fn billable_size(&self) -> usize {
        let receipt = TransactionReceipt { id: self.id };
        self.packed_size.saturating_add(encoded_size(&receipt))
    }
}

/// Transactions that execute sequentially.
pub type ScheduledThread = Vec<PendingTransaction>;

/// Threads that may execute concurrently.
pub type ScheduledCycle = Vec<ScheduledThread>;

/// Scheduler output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockSchedule {
    /// Cycles in execution order.
    pub cycles: Vec<ScheduledCycle>,
    /// Transactions that did not fit; still pending.
    pub leftovers: Vec<PendingTransaction>,
}

impl BlockSchedule {
    /// Scheduled transactions in execution order.
    pub fn transactions(&self) -> impl Iterator<Item = &PendingTransaction> {
        self.cycles.iter().flatten().flatten()
    }

    /// Number of scheduled transactions.
    pub fn scheduled_count(&self) -> usize {
        self.transactions().count()
    }

    /// Total billable bytes of the scheduled transactions.
    pub fn scheduled_size(&self) -> usize {
        self.transactions().map(PendingTransaction::billable_size).sum()
    }

    /// Cycle index holding transaction `id`, if scheduled.
    pub fn cycle_of(&self, id: &TransactionId) -> Option<usize> {
        self.cycles
            .iter()
            .position(|cycle| cycle.iter().flatten().any(|t| t.id == *id))
    }
}
