//! # DC-04: Block Scheduler
//!
//! Partitions a batch of pending transactions into cycles of threads such
//! that transactions in different threads of the same cycle touch disjoint
//! `(account, scope)` sets and can execute in parallel.
//!
//! ## Architecture
//!
//! - **Domain**: `PendingTransaction`, `BlockSchedule`, invariants
//! - **Algorithms**: cycling, threading and single-thread partitioners, the
//!   byte-size skipper and the touch-point bucket table
//! - **Service**: `BlockScheduler` dispatching on the configured algorithm
//!
//! ## Guarantees
//!
//! - Every input transaction ends up either scheduled exactly once or in the
//!   leftovers, never dropped.
//! - The scheduled transactions fit the block size budget.
//! - Bucket collisions only ever add conflicts, never remove them.
//! - Scheduling stops after the first pass that admits nothing.

pub mod algorithms;
pub mod config;
pub mod domain;
pub mod service;

#[cfg(test)]
mod test_utils;

pub use config::{SchedulerConfig, SchedulingAlgorithm};
pub use domain::entities::{BlockSchedule, PendingTransaction, ScheduledCycle, ScheduledThread};
pub use domain::errors::{SchedulerError, SchedulerResult};
pub use service::BlockScheduler;
