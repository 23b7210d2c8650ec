//! Block log port: the append-only record of irreversible blocks.

use crate::domain::errors::BlockLogResult;
use shared_types::{BlockNum, SignedBlock};
use std::sync::Arc;

/// Append-only sequence of irreversible blocks, numbered from 1.
pub trait BlockLog: Send + Sync {
    /// Append the block after the current head.
    fn append(&mut self, block: &SignedBlock) -> BlockLogResult<()>;

    /// Last appended block.
    fn head(&self) -> Option<Arc<SignedBlock>>;

    /// Block with number `block_num`.
    fn read_block_by_num(&self, block_num: BlockNum) -> BlockLogResult<Option<SignedBlock>>;

    /// Number of the last appended block (0 when empty).
    fn head_num(&self) -> BlockNum {
        self.head().map_or(0, |b| b.block_num())
    }

    /// Whether nothing has been appended.
    fn is_empty(&self) -> bool {
        self.head().is_none()
    }
}
