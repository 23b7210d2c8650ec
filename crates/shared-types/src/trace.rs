//! # Execution Traces
//!
//! Traces mirror the block body one-to-one: one region trace per region, one
//! cycle trace per cycle, one shard trace per shard, one transaction trace per
//! receipt. The block state builds the empty skeleton; execution fills it.

use crate::names::Name;
use crate::transaction::{Action, TransactionId};
use serde::{Deserialize, Serialize};

/// Outcome of executing one transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceStatus {
    /// Not executed yet.
    #[default]
    Pending,
    /// Every action succeeded.
    Executed,
    /// Execution failed; changes were undone.
    Failed(String),
}

/// Result of one action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTrace {
    /// Handler account.
    pub receiver: Name,
    /// The action as executed.
    pub act: Action,
    /// Handler output.
    pub console: String,
}

/// Result of one transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionTrace {
    /// Transaction id.
    pub id: TransactionId,
    /// Outcome.
    pub status: TraceStatus,
    /// Per-action results.
    pub action_traces: Vec<ActionTrace>,
}

impl TransactionTrace {
    /// Pending trace for `id`.
    pub fn pending(id: TransactionId) -> Self {
        Self {
            id,
            status: TraceStatus::Pending,
            action_traces: Vec::new(),
        }
    }
}

/// Traces of one shard, in execution order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardTrace {
    /// Transaction traces.
    pub transaction_traces: Vec<TransactionTrace>,
}

/// Traces of one cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleTrace {
    /// Shard traces.
    pub shard_traces: Vec<ShardTrace>,
}

/// Traces of one region.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionTrace {
    /// Cycle traces.
    pub cycle_traces: Vec<CycleTrace>,
}

/// Traces of a whole block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTrace {
    /// Region traces.
    pub region_traces: Vec<RegionTrace>,
}

impl BlockTrace {
    /// Every transaction trace in execution order.
    pub fn transaction_traces(&self) -> impl Iterator<Item = &TransactionTrace> {
        self.region_traces
            .iter()
            .flat_map(|r| r.cycle_traces.iter())
            .flat_map(|c| c.shard_traces.iter())
            .flat_map(|s| s.transaction_traces.iter())
    }
}
