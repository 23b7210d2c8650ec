//! Schedule invariants.
//!
//! Checked by the property tests and, in debug builds, after every
//! scheduling run.

use super::entities::{BlockSchedule, PendingTransaction};
use shared_types::{ShardLock, TransactionId};
use std::collections::HashMap;

/// Threads of one cycle touch disjoint `(account, scope)` sets.
pub fn invariant_disjoint_threads(schedule: &BlockSchedule) -> bool {
    for cycle in &schedule.cycles {
        let mut owner: HashMap<ShardLock, usize> = HashMap::new();
        for (thread_index, thread) in cycle.iter().enumerate() {
            for trx in thread {
                for lock in trx.trx.touch_points() {
                    let first = *owner.entry(*lock).or_insert(thread_index);
                    if first != thread_index {
                        return false;
                    }
                }
            }
        }
    }
    true
}

/// Every input appears exactly once, scheduled or left over.
pub fn invariant_complete(inputs: &[TransactionId], schedule: &BlockSchedule) -> bool {
    let mut expected: HashMap<TransactionId, usize> = HashMap::new();
    for id in inputs {
        *expected.entry(*id).or_default() += 1;
    }

    let mut seen: HashMap<TransactionId, usize> = HashMap::new();
    for trx in schedule.transactions().chain(schedule.leftovers.iter()) {
        *seen.entry(trx.id).or_default() += 1;
    }
    expected == seen
}

/// Scheduled bytes fit within `budget`.
pub fn invariant_size_budget(schedule: &BlockSchedule, budget: usize) -> bool {
    schedule.scheduled_size() <= budget
}

/// No thread holds more than `cap` transactions.
pub fn invariant_thread_capacity(schedule: &BlockSchedule, cap: usize) -> bool {
    schedule
        .cycles
        .iter()
        .flatten()
        .all(|thread| thread.len() <= cap)
}

/// No empty cycles or threads.
pub fn invariant_no_empty_units(schedule: &BlockSchedule) -> bool {
    schedule
        .cycles
        .iter()
        .all(|cycle| !cycle.is_empty() && cycle.iter().all(|thread| !thread.is_empty()))
}

/// Transactions in the same thread keep their relative input order.
pub fn invariant_thread_order(inputs: &[TransactionId], schedule: &BlockSchedule) -> bool {
    let position: HashMap<&TransactionId, usize> =
        inputs.iter().enumerate().map(|(i, id)| (id, i)).collect();
    let index_of = |trx: &PendingTransaction| position.get(&trx.id).copied();

    schedule.cycles.iter().flatten().all(|thread| {
        thread
            .windows(2)
            .all(|pair| matches!((index_of(&pair[0]), index_of(&pair[1])), (Some(a), Some(b)) if a < b))
    })
}
