//! Error types for header state transitions.

use dc_01_producer_schedule::ScheduleError;
use shared_crypto::{CryptoError, PublicKey};
use shared_types::{BlockId, BlockTimestamp, Name, TypeError};
use thiserror::Error;

/// Header state errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderStateError {
    /// Rotation engine failure (slot overflow, empty schedule).
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Signing or recovery failed.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Proposed producer schedule is malformed.
    #[error("Invalid producer schedule: {0}")]
    InvalidSchedule(#[from] TypeError),

    /// Consensus parameters are unusable.
    #[error("Invalid consensus parameters: {0}")]
    InvalidParams(String),

    /// Block timestamp does not advance.
    #[error("Timestamp {proposed} is not after current {current}")]
    TimestampNotIncreasing {
        /// Current header timestamp.
        current: BlockTimestamp,
        /// Proposed timestamp.
        proposed: BlockTimestamp,
    },

    /// Header does not link to this state.
    #[error("Header links to {actual}, expected {expected}")]
    UnlinkableHeader {
        /// This state's id.
        expected: BlockId,
        /// Header's `previous`.
        actual: BlockId,
    },

    /// Producer is not the one scheduled for the slot.
    #[error("Wrong producer: expected {expected}, got {actual}")]
    WrongProducer {
        /// Scheduled producer.
        expected: Name,
        /// Header producer.
        actual: Name,
    },

    /// Schedule version differs from the active schedule.
    #[error("Wrong schedule version: expected {expected}, got {actual}")]
    WrongScheduleVersion {
        /// Active schedule version.
        expected: u32,
        /// Header version.
        actual: u32,
    },

    /// Header's block Merkle root does not match the accumulator.
    #[error("Block Merkle root mismatch")]
    BlockMrootMismatch,

    /// Proposed schedule version is not active + 1.
    #[error("Wrong pending schedule version: expected {expected}, got {actual}")]
    WrongPendingVersion {
        /// Active version + 1.
        expected: u32,
        /// Proposed version.
        actual: u32,
    },

    /// A pending schedule is already waiting for irreversibility.
    #[error("Pending schedule version {version} already exists")]
    PendingScheduleExists {
        /// Version of the existing pending schedule.
        version: u32,
    },

    /// Signature does not recover to the scheduled producer's key.
    #[error("Block signed by {actual}, expected {expected}")]
    WrongSigningKey {
        /// Scheduled producer's key.
        expected: PublicKey,
        /// Recovered key.
        actual: PublicKey,
    },

    /// Producer already confirmed this block.
    #[error("Block already confirmed by {producer}")]
    DuplicateConfirmation {
        /// Confirming producer.
        producer: Name,
    },

    /// Confirming producer is not in the active schedule.
    #[error("Producer {producer} is not in the active schedule")]
    UnknownProducer {
        /// Confirming producer.
        producer: Name,
    },

    /// Confirmation refers to another block.
    #[error("Confirmation for {actual}, expected {expected}")]
    ConfirmationBlockMismatch {
        /// This state's id.
        expected: BlockId,
        /// Confirmation's block id.
        actual: BlockId,
    },

    /// Confirmation signature does not recover to the producer's key.
    #[error("Confirmation signature from {producer} does not match its key")]
    ConfirmationKeyMismatch {
        /// Confirming producer.
        producer: Name,
    },

    /// Block number counter exhausted.
    #[error("Block number overflow")]
    BlockNumOverflow,
}

/// Result type for header state operations.
pub type HeaderStateResult<T> = Result<T, HeaderStateError>;
