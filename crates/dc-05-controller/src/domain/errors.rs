//! Error types for the controller and its collaborators.

use dc_02_block_header_state::HeaderStateError;
use dc_03_block_state::BlockStateError;
use dc_04_block_scheduler::SchedulerError;
use shared_crypto::CryptoError;
use shared_types::{
    BlockId, BlockNum, BlockTimestamp, EncodingError, Name, PublicKey, ShardLock, TimePointSec,
    TransactionId, TypeError,
};
use thiserror::Error;

/// State database errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateDbError {
    /// `undo` or `squash` without an open session.
    #[error("No undo session is open")]
    NoUndoSession,

    /// The revision can only be set while no session is open.
    #[error("Cannot set revision while {open} undo sessions are open")]
    SessionsOpen { open: usize },
}

/// Result type for state database operations.
pub type StateDbResult<T> = Result<T, StateDbError>;

/// Block log errors.
#[derive(Debug, Error)]
pub enum BlockLogError {
    /// Underlying file I/O failed.
    #[error("Block log I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A logged block could not be encoded or decoded.
    #[error("Block log encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Blocks must be appended in order.
    #[error("Block log expected block {expected}, got {actual}")]
    NonSequential { expected: BlockNum, actual: BlockNum },
}

/// Result type for block log operations.
pub type BlockLogResult<T> = Result<T, BlockLogError>;

/// Action execution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// The action lacks the authorization its handler requires.
    #[error("Missing authorization of {actor}")]
    MissingAuthorization { actor: Name },

    /// A table read outside the transaction's declared scopes.
    #[error("Read of {lock} not declared by the transaction")]
    ReadNotDeclared { lock: ShardLock },

    /// A table write outside the transaction's declared write scope.
    #[error("Write of {lock} not declared by the transaction")]
    WriteNotDeclared { lock: ShardLock },

    /// Context-free actions cannot touch tables.
    #[error("Context-free action {account}::{action} accessed state")]
    ContextFreeStateAccess { account: Name, action: Name },

    /// Action payload could not be decoded.
    #[error("Invalid data for {account}::{action}: {reason}")]
    InvalidActionData {
        account: Name,
        action: Name,
        reason: String,
    },

    /// A handler rejected the action.
    #[error("Action {account}::{action} failed: {reason}")]
    ActionFailed {
        account: Name,
        action: Name,
        reason: String,
    },

    /// State database failure.
    #[error(transparent)]
    StateDb(#[from] StateDbError),
}

/// Result type for action execution.
pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Fork database errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForkDbError {
    /// The block's parent is not in the fork database.
    #[error("Unlinkable block {id:?}: previous {previous:?} unknown")]
    UnlinkableBlock { id: BlockId, previous: BlockId },

    /// The block is already present.
    #[error("Block {id:?} already in fork database")]
    DuplicateBlock { id: BlockId },

    /// No block with this id.
    #[error("Unknown block {id:?}")]
    UnknownBlock { id: BlockId },

    /// The root of the fork database cannot be removed.
    #[error("Cannot remove the fork database root {id:?}")]
    RemoveRoot { id: BlockId },

    /// Confirmation rejected by the header state.
    #[error(transparent)]
    HeaderState(#[from] HeaderStateError),
}

/// Result type for fork database operations.
pub type ForkDbResult<T> = Result<T, ForkDbError>;

/// Failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed block or transaction; the unit is discarded.
    Structural,
    /// Disagreement with the deterministic schedule or a bad signature.
    Consensus,
    /// A capacity limit was hit.
    ResourceExhausted,
    /// A programming invariant was violated.
    Invariant,
    /// A transaction failed while executing.
    Execution,
    /// State database or block log failure.
    Storage,
}

/// Controller errors.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Invalid chain configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    HeaderState(#[from] HeaderStateError),

    #[error(transparent)]
    BlockState(#[from] BlockStateError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    ForkDb(#[from] ForkDbError),

    #[error(transparent)]
    StateDb(#[from] StateDbError),

    #[error(transparent)]
    BlockLog(#[from] BlockLogError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("Transaction {id:?} expired at {expiration:?} (head time {head_time:?})")]
    TransactionExpired {
        id: TransactionId,
        expiration: TimePointSec,
        head_time: BlockTimestamp,
    },

    #[error("Transaction {id:?} expiration {expiration:?} beyond the lifetime limit {max:?}")]
    ExpirationTooFar {
        id: TransactionId,
        expiration: TimePointSec,
        max: TimePointSec,
    },

    #[error("Duplicate transaction {id:?}")]
    DuplicateTransaction { id: TransactionId },

    #[error("Pending transaction queue full ({limit} transactions)")]
    CapacityExceeded { limit: usize },

    #[error("Transaction {id:?} failed: {source}")]
    TransactionFailed {
        id: TransactionId,
        #[source]
        source: ExecutionError,
    },

    #[error("Transaction {id:?} touches {lock} outside its shard's locks")]
    UndeclaredScope { id: TransactionId, lock: ShardLock },

    #[error("Block {block_num} {root} Merkle root mismatch")]
    MerkleRootMismatch {
        block_num: BlockNum,
        root: &'static str,
    },

    #[error("Block {block_num} header proposes schedule {declared:?}, execution proposed {executed:?}")]
    ProposedScheduleMismatch {
        block_num: BlockNum,
        declared: Option<u32>,
        executed: Option<u32>,
    },

    #[error("Block {block_num} does not start with its onblock transaction")]
    InvalidOnblock { block_num: BlockNum },

    #[error("Signing key {actual} does not match scheduled key {expected}")]
    WrongSigningKey {
        expected: PublicKey,
        actual: PublicKey,
    },

    #[error("No pending block")]
    NoPendingBlock,

    #[error("A pending block is already open")]
    PendingBlockExists,

    #[error("Block log genesis {actual:?} does not match configured genesis {expected:?}")]
    GenesisMismatch { expected: BlockId, actual: BlockId },

    #[error("State revision {revision} is ahead of the block log head {log_head}")]
    StateAheadOfLog { revision: u64, log_head: BlockNum },

    #[error("Block {block_num} missing from block log")]
    MissingLoggedBlock { block_num: BlockNum },
}

impl ControllerError {
    /// Where this error falls in the failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::HeaderState(err) => header_state_kind(err),
            Self::ForkDb(ForkDbError::HeaderState(err)) => header_state_kind(err),
            Self::ForkDb(ForkDbError::RemoveRoot { .. }) => ErrorKind::Invariant,
            Self::ForkDb(_)
            | Self::BlockState(_)
            | Self::Type(_)
            | Self::Encoding(_)
            | Self::TransactionExpired { .. }
            | Self::ExpirationTooFar { .. }
            | Self::DuplicateTransaction { .. }
            | Self::UndeclaredScope { .. }
            | Self::MerkleRootMismatch { .. } => ErrorKind::Structural,
            Self::Crypto(_)
            | Self::WrongSigningKey { .. }
            | Self::ProposedScheduleMismatch { .. }
            | Self::InvalidOnblock { .. } => ErrorKind::Consensus,
            Self::CapacityExceeded { .. } => ErrorKind::ResourceExhausted,
            Self::TransactionFailed { .. } => ErrorKind::Execution,
            Self::StateDb(_) | Self::BlockLog(_) | Self::MissingLoggedBlock { .. } => {
                ErrorKind::Storage
            }
            Self::InvalidConfig(_)
            | Self::Scheduler(_)
            | Self::NoPendingBlock
            | Self::PendingBlockExists
            | Self::GenesisMismatch { .. }
            | Self::StateAheadOfLog { .. } => ErrorKind::Invariant,
        }
    }
}

fn header_state_kind(err: &HeaderStateError) -> ErrorKind {
    match err {
        HeaderStateError::Schedule(_)
        | HeaderStateError::InvalidParams(_)
        | HeaderStateError::BlockNumOverflow => ErrorKind::Invariant,
        HeaderStateError::InvalidSchedule(_) => ErrorKind::Structural,
        _ => ErrorKind::Consensus,
    }
}

/// Result type for controller operations.
pub type ControllerResult<T> = Result<T, ControllerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ControllerError::CapacityExceeded { limit: 1 }.kind(),
            ErrorKind::ResourceExhausted
        );
        assert_eq!(
            ControllerError::HeaderState(HeaderStateError::BlockMrootMismatch).kind(),
            ErrorKind::Consensus
        );
        assert_eq!(
            ControllerError::HeaderState(HeaderStateError::BlockNumOverflow).kind(),
            ErrorKind::Invariant
        );
        assert_eq!(
            ControllerError::BlockState(BlockStateError::EmptyBlock).kind(),
            ErrorKind::Structural
        );
        assert_eq!(
            ControllerError::InvalidOnblock { block_num: 2 }.kind(),
            ErrorKind::Consensus
        );
        assert_eq!(
            ControllerError::StateDb(StateDbError::NoUndoSession).kind(),
            ErrorKind::Storage
        );
    }
}
