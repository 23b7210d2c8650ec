//! # Chain Signals
//!
//! The seven lifecycle notifications the controller emits.

use serde::{Deserialize, Serialize};
use shared_types::{BlockId, BlockNum, Name, TransactionId};

/// A lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainSignal {
    /// Accepted into the pending queue.
    TransactionAdded {
        /// Transaction id.
        id: TransactionId,
    },

    /// Executed successfully inside a block.
    TransactionValidated {
        /// Transaction id.
        id: TransactionId,
        /// Block it executed in.
        block_num: BlockNum,
    },

    /// Its block was signed locally or applied from a peer.
    TransactionConfirmed {
        /// Transaction id.
        id: TransactionId,
        /// Containing block.
        block_id: BlockId,
    },

    /// Failed intake checks or execution.
    TransactionRejected {
        /// Transaction id.
        id: TransactionId,
        /// Why it was rejected.
        reason: String,
    },

    /// Inserted into the fork database.
    BlockLinked {
        /// Block id.
        block_id: BlockId,
        /// Producer that signed it.
        producer: Name,
    },

    /// Executed and its state changes applied.
    BlockValidated {
        /// Block id.
        block_id: BlockId,
    },

    /// Became irreversible.
    BlockConfirmed {
        /// Block id.
        block_id: BlockId,
    },
}

impl ChainSignal {
    /// Kind of this signal (for filtering).
    #[must_use]
    pub fn kind(&self) -> SignalKind {
        match self {
            Self::TransactionAdded { .. } => SignalKind::TransactionAdded,
            Self::TransactionValidated { .. } => SignalKind::TransactionValidated,
            Self::TransactionConfirmed { .. } => SignalKind::TransactionConfirmed,
            Self::TransactionRejected { .. } => SignalKind::TransactionRejected,
            Self::BlockLinked { .. } => SignalKind::BlockLinked,
            Self::BlockValidated { .. } => SignalKind::BlockValidated,
            Self::BlockConfirmed { .. } => SignalKind::BlockConfirmed,
        }
    }

    /// Block number the signal refers to, if it refers to a block.
    #[must_use]
    pub fn block_num(&self) -> Option<BlockNum> {
        match self {
            Self::TransactionValidated { block_num, .. } => Some(*block_num),
            Self::TransactionConfirmed { block_id, .. }
            | Self::BlockLinked { block_id, .. }
            | Self::BlockValidated { block_id }
            | Self::BlockConfirmed { block_id } => Some(block_id.block_num()),
            Self::TransactionAdded { .. } | Self::TransactionRejected { .. } => None,
        }
    }
}

/// Signal kinds for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// See [`ChainSignal::TransactionAdded`].
    TransactionAdded,
    /// See [`ChainSignal::TransactionValidated`].
    TransactionValidated,
    /// See [`ChainSignal::TransactionConfirmed`].
    TransactionConfirmed,
    /// See [`ChainSignal::TransactionRejected`].
    TransactionRejected,
    /// See [`ChainSignal::BlockLinked`].
    BlockLinked,
    /// See [`ChainSignal::BlockValidated`].
    BlockValidated,
    /// See [`ChainSignal::BlockConfirmed`].
    BlockConfirmed,
}

impl SignalKind {
    /// Whether this kind concerns a block rather than a transaction.
    #[must_use]
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Self::BlockLinked | Self::BlockValidated | Self::BlockConfirmed
        )
    }
}

/// Filter for subscribing to specific signals.
#[derive(Debug, Clone, Default)]
pub struct SignalFilter {
    /// Kinds to include. Empty means all kinds.
    pub kinds: Vec<SignalKind>,
}

impl SignalFilter {
    /// Accept every signal.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Accept only the listed kinds.
    #[must_use]
    pub fn kinds(kinds: Vec<SignalKind>) -> Self {
        Self { kinds }
    }

    /// Accept only block signals.
    #[must_use]
    pub fn blocks() -> Self {
        Self::kinds(vec![
            SignalKind::BlockLinked,
            SignalKind::BlockValidated,
            SignalKind::BlockConfirmed,
        ])
    }

    /// Whether `signal` passes this filter.
    #[must_use]
    pub fn matches(&self, signal: &ChainSignal) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&signal.kind())
    }
}
