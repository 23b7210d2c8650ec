//! # Structural Checks
//!
//! Context-free checks shared by block construction and transaction intake.

use crate::error::{BlockStateError, BlockStateResult, ConflictKind};
use shared_types::{BlockTimestamp, RegionSummary, ShardLock, Transaction};
use std::collections::HashMap;

/// Check expiration and authorization shape of one transaction.
pub fn validate_transaction(trx: &Transaction, block_time: BlockTimestamp) -> BlockStateResult<()> {
    if !trx.expiration.is_after(block_time) {
        return Err(BlockStateError::TransactionExpired {
            id: trx.id(),
            expiration: trx.expiration,
            block_time,
        });
    }
    if !trx.actions.iter().any(|a| !a.authorization.is_empty()) {
        return Err(BlockStateError::MissingAuthorization { id: trx.id() });
    }
    if trx
        .context_free_actions
        .iter()
        .any(|a| !a.authorization.is_empty())
    {
        return Err(BlockStateError::ContextFreeAuthorization { id: trx.id() });
    }
    Ok(())
}

/// Whether `locks` is strictly increasing (sorted, no duplicates).
pub fn validate_lock_order(locks: &[ShardLock]) -> bool {
    locks.windows(2).all(|pair| pair[0] < pair[1])
}

/// Region ordering, per-shard lock order and per-cycle lock conflicts.
pub fn validate_regions(regions: &[RegionSummary]) -> BlockStateResult<()> {
    if regions.is_empty() {
        return Err(BlockStateError::NoRegions);
    }
    for pair in regions.windows(2) {
        if pair[0].region >= pair[1].region {
            return Err(BlockStateError::RegionsNotIncreasing {
                previous: pair[0].region,
                region: pair[1].region,
            });
        }
    }

    for r in regions {
        for (cycle_index, cycle) in r.cycles_summary.iter().enumerate() {
            // Lock -> index of the first shard holding it, per lock kind.
            let mut readers: HashMap<ShardLock, usize> = HashMap::new();
            let mut writers: HashMap<ShardLock, usize> = HashMap::new();

            for (shard_index, shard) in cycle.iter().enumerate() {
                if !validate_lock_order(&shard.read_locks) || !validate_lock_order(&shard.write_locks)
                {
                    return Err(BlockStateError::LocksNotSorted {
                        region: r.region,
                        cycle: cycle_index,
                        shard: shard_index,
                    });
                }

                let conflict = |lock: ShardLock, kind| BlockStateError::ConcurrencyConflict {
                    region: r.region,
                    cycle: cycle_index,
                    lock,
                    kind,
                };

                let foreign = |owners: &HashMap<ShardLock, usize>, lock: &ShardLock| {
                    owners.get(lock).is_some_and(|&owner| owner != shard_index)
                };

                for lock in &shard.read_locks {
                    if foreign(&writers, lock) {
                        return Err(conflict(*lock, ConflictKind::ReadWrite));
                    }
                    readers.entry(*lock).or_insert(shard_index);
                }
                for lock in &shard.write_locks {
                    if writers.contains_key(lock) {
                        return Err(conflict(*lock, ConflictKind::WriteWrite));
                    }
                    if foreign(&readers, lock) {
                        return Err(conflict(*lock, ConflictKind::ReadWrite));
                    }
                    writers.insert(*lock, shard_index);
                }
            }
        }
    }
    Ok(())
}
