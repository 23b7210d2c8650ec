//! Error types for block state construction.

use shared_types::{BlockId, BlockTimestamp, ShardLock, TimePointSec, TransactionId};
use std::fmt;
use thiserror::Error;

/// How two shards of a cycle collide on a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// Both shards write the lock.
    WriteWrite,
    /// One shard reads what another writes.
    ReadWrite,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteWrite => write!(f, "write/write"),
            Self::ReadWrite => write!(f, "read/write"),
        }
    }
}

/// Block state construction errors. All are fatal for the block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockStateError {
    /// Transaction expired at or before the block timestamp.
    #[error("Transaction {id} expired at {expiration:?}, block time {block_time}")]
    TransactionExpired {
        /// Transaction id.
        id: TransactionId,
        /// Its expiration.
        expiration: TimePointSec,
        /// Block timestamp.
        block_time: BlockTimestamp,
    },

    /// No action carries an authorization.
    #[error("Transaction {id} has no authorized action")]
    MissingAuthorization {
        /// Transaction id.
        id: TransactionId,
    },

    /// A context-free action carries an authorization.
    #[error("Transaction {id} has an authorized context-free action")]
    ContextFreeAuthorization {
        /// Transaction id.
        id: TransactionId,
    },

    /// Block body has no regions.
    #[error("Block has no regions")]
    NoRegions,

    /// Region ids are not strictly increasing.
    #[error("Region {region} follows region {previous}")]
    RegionsNotIncreasing {
        /// Preceding region id.
        previous: u16,
        /// Offending region id.
        region: u16,
    },

    /// A shard's lock list is unsorted or has duplicates.
    #[error("Shard locks not sorted and unique (region {region}, cycle {cycle}, shard {shard})")]
    LocksNotSorted {
        /// Region id.
        region: u16,
        /// Cycle index.
        cycle: usize,
        /// Shard index.
        shard: usize,
    },

    /// Two shards of a cycle conflict on a lock.
    #[error("Concurrency conflict ({kind}) on {lock} in region {region}, cycle {cycle}")]
    ConcurrencyConflict {
        /// Region id.
        region: u16,
        /// Cycle index.
        cycle: usize,
        /// Contended lock.
        lock: ShardLock,
        /// Kind of conflict.
        kind: ConflictKind,
    },

    /// Block contains no transactions.
    #[error("Block contains no transactions")]
    EmptyBlock,

    /// A receipt references a transaction missing from the body.
    #[error("Receipt references unknown transaction {id}")]
    MissingInputTransaction {
        /// Referenced id.
        id: TransactionId,
    },

    /// Block header differs from the header state.
    #[error("Block {actual} does not match header state {expected}")]
    HeaderMismatch {
        /// Header state id.
        expected: BlockId,
        /// Block id.
        actual: BlockId,
    },
}

/// Result type for block state operations.
pub type BlockStateResult<T> = Result<T, BlockStateError>;
