//! # Block State
//!
//! A validated block body together with the header state it produces, and
//! the trace skeleton execution writes into.

use crate::error::{BlockStateError, BlockStateResult};
use crate::validation::{validate_regions, validate_transaction};
use dc_02_block_header_state::BlockHeaderState;
use shared_types::{
    BlockId, BlockNum, BlockTrace, CycleTrace, RegionTrace, ShardTrace, SignedBlock, Transaction,
    TransactionId, TransactionTrace,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// A block and its header state.
#[derive(Debug, Clone)]
pub struct BlockState {
    /// Header state after this block.
    pub header_state: BlockHeaderState,
    /// The block body, shared with the fork database and block log.
    pub block: Arc<SignedBlock>,
    /// Execution results, one slot per receipt.
    pub trace: BlockTrace,
    /// Whether the block has been executed against the state database.
    pub validated: bool,
}

impl BlockState {
    /// Validate `block` against `header_state` and build the trace skeleton.
    pub fn new(header_state: BlockHeaderState, block: Arc<SignedBlock>) -> BlockStateResult<Self> {
        if block.header != header_state.header {
            return Err(BlockStateError::HeaderMismatch {
                expected: header_state.id,
                actual: block.id(),
            });
        }

        let block_time = header_state.timestamp();
        for trx in &block.input_transactions {
            validate_transaction(trx, block_time)?;
        }

        validate_regions(&block.regions)?;

        if block.transaction_count() == 0 {
            return Err(BlockStateError::EmptyBlock);
        }
        let inputs: HashSet<TransactionId> =
            block.input_transactions.iter().map(Transaction::id).collect();
        if let Some(missing) = block.receipts().find(|r| !inputs.contains(&r.id)) {
            return Err(BlockStateError::MissingInputTransaction { id: missing.id });
        }

        debug!(
            block_num = header_state.block_num,
            regions = block.regions.len(),
            transactions = block.transaction_count(),
            "Block state constructed"
        );

        let mut state = Self {
            header_state,
            block,
            trace: BlockTrace::default(),
            validated: false,
        };
        state.reset_trace();
        Ok(state)
    }

    /// State of the first block of a chain.
    ///
    /// Block 1 carries no transactions, so the body checks do not apply; it
    /// is valid by definition.
    pub fn genesis(header_state: BlockHeaderState) -> Self {
        let block = Arc::new(SignedBlock::new(header_state.header.clone()));
        Self {
            header_state,
            block,
            trace: BlockTrace::default(),
            validated: true,
        }
    }

    /// Block id.
    pub fn id(&self) -> BlockId {
        self.header_state.id
    }

    /// Block number.
    pub fn block_num(&self) -> BlockNum {
        self.header_state.block_num
    }

    /// Previous block id.
    pub fn previous(&self) -> BlockId {
        self.header_state.header.header.previous
    }

    /// Replace the trace with an empty skeleton matching the block body.
    pub fn reset_trace(&mut self) {
        self.trace = BlockTrace {
            region_traces: self
                .block
                .regions
                .iter()
                .map(|r| RegionTrace {
                    cycle_traces: r
                        .cycles_summary
                        .iter()
                        .map(|cycle| CycleTrace {
                            shard_traces: cycle
                                .iter()
                                .map(|shard| ShardTrace {
                                    transaction_traces: shard
                                        .transactions
                                        .iter()
                                        .map(|receipt| TransactionTrace::pending(receipt.id))
                                        .collect(),
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        };
    }

    /// Input transaction with id `id`.
    pub fn find_transaction(&self, id: &TransactionId) -> Option<&Transaction> {
        self.block.input_transactions.iter().find(|t| t.id() == *id)
    }
}
