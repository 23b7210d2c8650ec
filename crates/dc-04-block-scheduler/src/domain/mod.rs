//! Domain module for the block scheduler.
//!
//! Contains entities, errors and the schedule invariants.

pub mod entities;
pub mod errors;
pub mod invariants;

pub use entities::*;
pub use errors::*;
