//! Adapters for the controller's driven ports.

pub mod file_block_log;
pub mod memory_block_log;
pub mod memory_state_db;

pub use file_block_log::FileBlockLog;
pub use memory_block_log::MemoryBlockLog;
pub use memory_state_db::MemoryStateDb;
