//! Algorithms module for the block scheduler.
//!
//! Contains:
//! - Size skipper (block byte budget)
//! - Touch-point bucket table
//! - `by_cycling_conflicts`, `by_threading_conflicts`, `in_single_thread`

pub mod cycling;
pub mod single_thread;
pub mod size_skipper;
pub mod threading;
pub mod touch_table;

pub use cycling::by_cycling_conflicts;
pub use single_thread::in_single_thread;
pub use size_skipper::{block_overhead, SizeSkipper};
pub use threading::by_threading_conflicts;
pub use touch_table::{table_size, TouchTable};
