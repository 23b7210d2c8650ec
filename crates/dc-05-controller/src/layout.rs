//! # Block Body Layout
//!
//! The scheduler partitions a batch into cycles of conflict-free threads
//! without looking at regions. A block body is region-major, so each thread
//! is split by region: region `r` gets, for every scheduler cycle, the
//! thread fragments holding its transactions. Executing the plan region by
//! region gives the same order a validating node uses when it replays the
//! body.
//!
//! The `onblock` transaction forms cycle 0 of region 0 on its own.

use dc_04_block_scheduler::{BlockSchedule, PendingTransaction};
use shared_types::{ShardLock, ShardSummary, Transaction, TransactionReceipt};
use std::collections::{BTreeMap, BTreeSet};

/// Transactions of one shard, in execution order.
pub(crate) type ShardPlan = Vec<PendingTransaction>;

/// Shards of one cycle.
pub(crate) type CyclePlan = Vec<ShardPlan>;

/// Execution plan for one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RegionPlan {
    pub region: u16,
    pub cycles: Vec<CyclePlan>,
}

/// Region-major plan for a pending block.
pub(crate) fn plan_regions(onblock: PendingTransaction, schedule: &BlockSchedule) -> Vec<RegionPlan> {
    let mut regions: BTreeMap<u16, Vec<CyclePlan>> = BTreeMap::new();
    regions.insert(0, vec![vec![vec![onblock]]]);

    for cycle in &schedule.cycles {
        let mut by_region: BTreeMap<u16, CyclePlan> = BTreeMap::new();
        for thread in cycle {
            let mut fragments: BTreeMap<u16, ShardPlan> = BTreeMap::new();
            for trx in thread {
                fragments.entry(trx.trx.region).or_default().push(trx.clone());
            }
            for (region, fragment) in fragments {
                by_region.entry(region).or_default().push(fragment);
            }
        }
        for (region, shards) in by_region {
            regions.entry(region).or_default().push(shards);
        }
    }

    regions
        .into_iter()
        .map(|(region, cycles)| RegionPlan { region, cycles })
        .collect()
}

/// Lock sets and receipts for the transactions a shard executed.
///
/// A scope both read and written is only listed as a write lock.
pub(crate) fn shard_summary<'a, I>(transactions: I) -> ShardSummary
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut reads = BTreeSet::new();
    let mut writes = BTreeSet::new();
    let mut receipts = Vec::new();

    for trx in transactions {
        reads.extend(trx.read_scope.iter().copied());
        writes.extend(trx.write_scope.iter().copied());
        receipts.push(TransactionReceipt { id: trx.id() });
    }

    ShardSummary {
        read_locks: reads.difference(&writes).copied().collect(),
        write_locks: writes.into_iter().collect(),
        transactions: receipts,
    }
}

/// First scope `trx` declares that `shard` does not hold.
pub(crate) fn undeclared_scope(shard: &ShardSummary, trx: &Transaction) -> Option<ShardLock> {
    let holds_write = |lock: &ShardLock| shard.write_locks.binary_search(lock).is_ok();
    let holds_read = |lock: &ShardLock| holds_write(lock) || shard.read_locks.binary_search(lock).is_ok();

    trx.write_scope
        .iter()
        .find(|lock| !holds_write(lock))
        .or_else(|| trx.read_scope.iter().find(|lock| !holds_read(lock)))
        .copied()
}
