//! By-threading-conflicts partitioner.
//!
//! A transaction joins the thread that already owns any of its
//! touch-points, or opens a new thread when none is owned. It is postponed
//! to the next cycle when its touch-points are owned by two different
//! threads, when the owning thread is full, or when it does not fit the
//! remaining block size.

use super::size_skipper::SizeSkipper;
use super::touch_table::TouchTable;
use crate::domain::entities::{BlockSchedule, PendingTransaction, ScheduledCycle};
use tracing::debug;

/// Where a transaction goes in the current cycle.
enum Placement {
    Join(usize),
    Open,
    Postpone,
}

fn place(
    table: &TouchTable,
    buckets: &[usize],
    cycle: &ScheduledCycle,
    max_per_thread: usize,
) -> Placement {
    let mut required: Option<usize> = None;
    for thread in buckets.iter().filter_map(|b| table.get(*b)) {
        match required {
            None => required = Some(thread),
            Some(owner) if owner != thread => return Placement::Postpone,
            Some(_) => {}
        }
    }

    match required {
        None => Placement::Open,
        Some(thread) if cycle.get(thread).map_or(0, Vec::len) >= max_per_thread => {
            Placement::Postpone
        }
        Some(thread) => Placement::Join(thread),
    }
}

/// Partition `transactions` into cycles of threads holding at most
/// `max_per_thread` transactions each.
pub fn by_threading_conflicts(
    transactions: Vec<PendingTransaction>,
    max_block_size: usize,
    max_per_thread: usize,
) -> BlockSchedule {
    let mut skipper = SizeSkipper::new(max_block_size);
    let mut assigned = TouchTable::for_batch(transactions.len());
    let mut queue = transactions;
    let mut cycles: Vec<ScheduledCycle> = Vec::new();

    while !queue.is_empty() {
        assigned.clear();
        let mut cycle: ScheduledCycle = Vec::new();
        let mut postponed = Vec::new();

        for trx in queue {
            if skipper.should_skip(&trx) {
                postponed.push(trx);
                continue;
            }

            let buckets: Vec<usize> = trx.trx.touch_points().map(|l| assigned.bucket(l)).collect();
            let thread = match place(&assigned, &buckets, &cycle, max_per_thread) {
                Placement::Postpone => {
                    postponed.push(trx);
                    continue;
                }
                Placement::Join(thread) => thread,
                Placement::Open => {
                    cycle.push(Vec::new());
                    cycle.len() - 1
                }
            };

            for bucket in buckets {
                assigned.set(bucket, thread);
            }
            skipper.admit(&trx);
            if let Some(slot) = cycle.get_mut(thread) {
                slot.push(trx);
            }
        }

        queue = postponed;
        if cycle.is_empty() {
            break;
        }

        debug!(
            cycle = cycles.len(),
            threads = cycle.len(),
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
