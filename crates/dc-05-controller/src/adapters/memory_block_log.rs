//! In-memory block log.

use crate::domain::errors::{BlockLogError, BlockLogResult};
use crate::ports::block_log::BlockLog;
use shared_types::{BlockNum, SignedBlock};
use std::sync::Arc;

/// Vector-backed [`BlockLog`].
#[derive(Debug, Default)]
pub struct MemoryBlockLog {
    blocks: Vec<Arc<SignedBlock>>,
}

impl MemoryBlockLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockLog for MemoryBlockLog {
    fn append(&mut self, block: &SignedBlock) -> BlockLogResult<()> {
        let expected = self.head_num() + 1;
        if block.block_num() != expected {
            return Err(BlockLogError::NonSequential {
                expected,
                actual: block.block_num(),
            });
        }
        self.blocks.push(Arc::new(block.clone()));
        Ok(())
    }

    fn head(&self) -> Option<Arc<SignedBlock>> {
        self.blocks.last().cloned()
    }

    fn read_block_by_num(&self, block_num: BlockNum) -> BlockLogResult<Option<SignedBlock>> {
        let index = (block_num as usize).checked_sub(1);
        Ok(index
            .and_then(|i| self.blocks.get(i))
            .map(|b| b.as_ref().clone()))
    }
}
