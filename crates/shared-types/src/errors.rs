//! # Error Types
//!
//! Errors raised while constructing or decoding shared entities.

use crate::names::Name;
use thiserror::Error;

/// Errors raised by shared entity constructors and validators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Name contains characters outside `[a-z1-5.]` or is too long.
    #[error("Invalid name '{0}': expected at most 12 characters from [a-z1-5.]")]
    InvalidName(String),

    /// Producer schedule has no producers.
    #[error("Producer schedule is empty")]
    EmptySchedule,

    /// Producer schedule contains the empty name.
    #[error("Producer schedule contains an empty producer name")]
    EmptyProducerName,

    /// Producer appears twice in a schedule.
    #[error("Duplicate producer in schedule: {0}")]
    DuplicateProducer(Name),

    /// Producer registered with the null signing key.
    #[error("Producer {0} has a null signing key")]
    NullSigningKey(Name),
}

/// Errors raised by the canonical binary encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// Serialization failed.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Bytes do not decode into the requested type.
    #[error("Decoding failed: {0}")]
    Decode(String),
}
