//! Size Skipper
//!
//! Tracks the bytes left in a block. A transaction that does not fit is
//! skipped for now (postponed), never dropped.

use crate::domain::entities::PendingTransaction;
use shared_types::{encoded_size, RegionSummary, SignedBlockHeader};

/// Bytes a block spends before its first transaction: the signed header and
/// one region with one cycle and one shard.
pub fn block_overhead() -> usize {
    let header = encoded_size(&SignedBlockHeader::default());
    let region = encoded_size(&RegionSummary {
        region: 0,
        cycles_summary: vec![vec![Default::default()]],
    });
    // Length prefix of the input transaction list.
    header + region + 8
}

/// Remaining block byte budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeSkipper {
    remaining: usize,
}

impl SizeSkipper {
    /// Budget for a block of at most `max_block_size` bytes.
    pub fn new(max_block_size: usize) -> Self {
        Self {
            remaining: max_block_size.saturating_sub(block_overhead()),
        }
    }

    /// Whether `trx` must be skipped because it does not fit.
    pub fn should_skip(&self, trx: &PendingTransaction) -> bool {
        trx.billable_size() > self.remaining
    }

    /// Charge an admitted transaction against the budget.
    pub fn admit(&mut self, trx: &PendingTransaction) {
        self.remaining = self.remaining.saturating_sub(trx.billable_size());
    }

    /// Bytes still available.
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}
