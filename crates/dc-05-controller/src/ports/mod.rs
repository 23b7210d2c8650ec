//! # Driven Ports
//!
//! Collaborators the controller depends on. Adapters in `crate::adapters`
//! provide in-memory and file-backed implementations.

pub mod block_log;
pub mod state_db;

pub use block_log::BlockLog;
pub use state_db::{PrimaryKey, StateDatabase, TableId};
