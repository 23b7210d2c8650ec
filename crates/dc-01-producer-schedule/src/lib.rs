//! # dc-01-producer-schedule
//!
//! Producer rotation engine: maps block slots to the producer that must sign
//! them.
//!
//! ## Overview
//!
//! - **Slot arithmetic**: `get_slot_time` / `get_slot_at_time` relative to a
//!   header's timestamp, with overflow reported instead of wrapped.
//! - **Round-robin**: each producer signs `producer_repetitions` consecutive
//!   slots, then the next producer in schedule order takes over.
//!
//! ```text
//! slot:     0 1 .. 11 | 12 13 .. 23 | 24 ..
//! producer: p0 p0  p0 | p1 p1   p1  | p2 ..      (repetitions = 12)
//! ```
//!
//! Everything here is a pure function of its inputs: the same schedule and
//! slot give the same producer on every node.

pub mod error;
pub mod rotation;

pub use error::{ScheduleError, ScheduleResult};
pub use rotation::{
    get_slot_at_time, get_slot_time, scheduled_producer_index, ProducerRotation,
    DEFAULT_PRODUCER_REPETITIONS,
};
