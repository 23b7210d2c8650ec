//! # dc-03-block-state
//!
//! A header state plus the block body it describes.
//!
//! ## Validation Sequence
//!
//! Construction fails fast, before any state is touched:
//!
//! 1. Every input transaction: expiration after the block timestamp, at
//!    least one authorized action, no authorized context-free action.
//! 2. At least one region; region ids strictly increasing.
//! 3. Per shard, read and write locks strictly sorted; per cycle, no lock is
//!    written by two shards or read by one and written by another.
//! 4. At least one transaction receipt, each backed by an input transaction.
//!
//! A block that fails any check is rejected as a whole.

pub mod block_state;
pub mod error;
pub mod validation;

pub use block_state::BlockState;
pub use error::{BlockStateError, BlockStateResult, ConflictKind};
pub use validation::{validate_lock_order, validate_regions, validate_transaction};
