//! Consensus parameters carried by every header state.

use crate::error::{HeaderStateError, HeaderStateResult};
use dc_01_producer_schedule::{ProducerRotation, DEFAULT_PRODUCER_REPETITIONS};
use serde::{Deserialize, Serialize};

/// Default share of producers (percent) that must have built on a block
/// before it is irreversible.
pub const DEFAULT_IRREVERSIBLE_THRESHOLD_PERCENT: u32 = 66;

/// Parameters every node must agree on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusParams {
    /// Consecutive slots per producer.
    pub producer_repetitions: u32,
    /// Irreversibility quorum in percent (0..=100).
    pub irreversible_threshold_percent: u32,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            producer_repetitions: DEFAULT_PRODUCER_REPETITIONS,
            irreversible_threshold_percent: DEFAULT_IRREVERSIBLE_THRESHOLD_PERCENT,
        }
    }
}

impl ConsensusParams {
    /// Reject parameters that make rotation or the quorum undefined.
    pub fn validate(&self) -> HeaderStateResult<()> {
        if self.producer_repetitions == 0 {
            return Err(HeaderStateError::InvalidParams(
                "producer_repetitions must be at least 1".into(),
            ));
        }
        if self.irreversible_threshold_percent > 100 {
            return Err(HeaderStateError::InvalidParams(format!(
                "irreversible_threshold_percent {} exceeds 100",
                self.irreversible_threshold_percent
            )));
        }
        Ok(())
    }

    /// Rotation engine for these parameters.
    pub fn rotation(&self) -> HeaderStateResult<ProducerRotation> {
        Ok(ProducerRotation::new(self.producer_repetitions)?)
    }
}
