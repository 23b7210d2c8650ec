//! Touch-point bucket table.
//!
//! Fixed-size open table from a touch-point's bucket to the thread it was
//! assigned in the current cycle. Unrelated touch-points that share a bucket
//! behave as one, which can only serialize transactions that could have run
//! in parallel.

use shared_crypto::touch_point_hash;
use shared_types::ShardLock;

/// Minimum number of buckets.
pub const MIN_TABLE_SIZE: usize = 4096;

/// Bucket count for a batch of `transaction_count` transactions.
pub fn table_size(transaction_count: usize) -> usize {
    MIN_TABLE_SIZE.max((transaction_count / 8).next_power_of_two())
}

/// Bucket → assigned thread.
#[derive(Clone, Debug)]
pub struct TouchTable {
    slots: Vec<Option<usize>>,
    mask: u64,
}

impl TouchTable {
    /// Table with `size` buckets; `size` must be a power of two.
    pub fn new(size: usize) -> Self {
        let size = size.max(1).next_power_of_two();
        Self {
            slots: vec![None; size],
            mask: size as u64 - 1,
        }
    }

    /// Table sized for `transaction_count` transactions.
    pub fn for_batch(transaction_count: usize) -> Self {
        Self::new(table_size(transaction_count))
    }

    /// Bucket of `lock`.
    pub fn bucket(&self, lock: &ShardLock) -> usize {
        (touch_point_hash(lock.key_bytes()) & self.mask) as usize
    }

    /// Thread assigned to `bucket`.
    pub fn get(&self, bucket: usize) -> Option<usize> {
        self.slots.get(bucket).copied().flatten()
    }

    /// Assign `bucket` to `thread`.
    pub fn set(&mut self, bucket: usize, thread: usize) {
        if let Some(slot) = self.slots.get_mut(bucket) {
            *slot = Some(thread);
        }
    }

    /// Forget every assignment.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the table has no buckets (never true).
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
