//! Single-thread partitioner: one cycle, one thread, input order.

use super::size_skipper::SizeSkipper;
use crate::domain::entities::{BlockSchedule, PendingTransaction};
use tracing::debug;

/// Place every transaction that fits into a single thread.
pub fn in_single_thread(
    transactions: Vec<PendingTransaction>,
    max_block_size: usize,
) -> BlockSchedule {
    let mut skipper = SizeSkipper::new(max_block_size);
    let mut thread = Vec::new();
    let mut leftovers = Vec::new();

    for trx in transactions {
        if skipper.should_skip(&trx) {
            leftovers.push(trx);
        } else {
            skipper.admit(&trx);
            thread.push(trx);
        }
    }

    debug!(scheduled = thread.len(), leftovers = leftovers.len(), "Scheduled single thread");

    let cycles = if thread.is_empty() {
        Vec::new()
    } else {
        vec![vec![thread]]
    };
    BlockSchedule { cycles, leftovers }
}
