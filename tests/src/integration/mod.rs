//! # Integration Tests
//!
//! Several controllers over one genesis, exchanging blocks the way peers
//! would.

pub mod fork_switching;
pub mod production;
pub mod restart_replay;
pub mod schedule_promotion;
pub mod scheduling;
