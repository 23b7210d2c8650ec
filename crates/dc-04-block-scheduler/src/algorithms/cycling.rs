//! By-cycling-conflicts partitioner.
//!
//! One transaction per thread. A transaction whose touch-points were already
//! used in the current cycle waits for the next cycle.

use super::size_skipper::SizeSkipper;
use super::touch_table::TouchTable;
use crate::domain::entities::{BlockSchedule, PendingTransaction, ScheduledCycle};
use tracing::debug;

/// Partition `transactions` into cycles of single-transaction threads.
pub fn by_cycling_conflicts(
    transactions: Vec<PendingTransaction>,
    max_block_size: usize,
) -> BlockSchedule {
    let mut skipper = SizeSkipper::new(max_block_size);
    let mut used = TouchTable::for_batch(transactions.len());
    let mut queue = transactions;
    let mut cycles: Vec<ScheduledCycle> = Vec::new();

    while !queue.is_empty() {
        used.clear();
        let mut cycle: ScheduledCycle = Vec::new();
        let mut postponed = Vec::new();

        for trx in queue {
            if skipper.should_skip(&trx) {
                postponed.push(trx);
                continue;
            }

            let buckets: Vec<usize> = trx.trx.touch_points().map(|l| used.bucket(l)).collect();
            if buckets.iter().any(|b| used.get(*b).is_some()) {
                postponed.push(trx);
                continue;
            }

            let thread = cycle.len();
            for bucket in buckets {
                used.set(bucket, thread);
            }
            skipper.admit(&trx);
            cycle.push(vec![trx]);
        }

        queue = postponed;
        if cycle.is_empty() {
            break;
        }

        debug!(
            cycle = cycles.len(),
            admitted = cycle.len(),
            postponed = queue.len(),
            "Scheduled cycle"
        );
        cycles.push(cycle);
    }

    BlockSchedule {
        cycles,
        leftovers: queue,
    }
}
