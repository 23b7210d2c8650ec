//! Error types for the rotation engine.

use thiserror::Error;

/// Rotation engine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// Advancing the slot counter would overflow it.
    #[error("Block timestamp overflow: slot {base} + {offset}")]
    SlotOverflow {
        /// Starting slot.
        base: u32,
        /// Requested offset.
        offset: u32,
    },

    /// No producers to rotate through.
    #[error("Producer schedule is empty")]
    EmptySchedule,

    /// Repetitions per producer must be positive.
    #[error("Producer repetitions must be at least 1")]
    ZeroRepetitions,
}

/// Result type for rotation operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;
