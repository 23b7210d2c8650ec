//! Error types for the block scheduler.

use thiserror::Error;

/// Scheduler errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Configuration is unusable.
    #[error("Invalid scheduler configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
