//! Chain configuration.

use crate::domain::errors::{ControllerError, ControllerResult};
use dc_01_producer_schedule::DEFAULT_PRODUCER_REPETITIONS;
use dc_02_block_header_state::config::DEFAULT_IRREVERSIBLE_THRESHOLD_PERCENT;
use dc_02_block_header_state::ConsensusParams;
use dc_04_block_scheduler::{SchedulerConfig, SchedulingAlgorithm};
use serde::{Deserialize, Serialize};

/// Chain-wide limits and consensus parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Consecutive slots per producer.
    pub producer_repetitions: u32,
    /// Irreversibility quorum in percent.
    pub irreversible_threshold_percent: u32,
    /// Maximum encoded block size in bytes.
    pub max_block_size: usize,
    /// Furthest a transaction's expiration may lie past head time.
    pub max_transaction_lifetime_secs: u32,
    /// Pending queue capacity.
    pub max_pending_transactions: usize,
    /// Scheduler partitioning strategy.
    pub scheduling_algorithm: SchedulingAlgorithm,
    /// Transaction cap per scheduler thread.
    pub max_transactions_per_thread: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            producer_repetitions: DEFAULT_PRODUCER_REPETITIONS,
            irreversible_threshold_percent: DEFAULT_IRREVERSIBLE_THRESHOLD_PERCENT,
            max_block_size: 1024 * 1024,
            max_transaction_lifetime_secs: 3600,
            max_pending_transactions: 10_000,
            scheduling_algorithm: SchedulingAlgorithm::default(),
            max_transactions_per_thread: 4,
        }
    }
}

impl ChainConfig {
    /// Reject unusable values.
    pub fn validate(&self) -> ControllerResult<()> {
        self.consensus_params().validate()?;
        self.scheduler_config().validate()?;
        if self.max_transaction_lifetime_secs == 0 {
            return Err(ControllerError::InvalidConfig(
                "max_transaction_lifetime_secs must be positive".into(),
            ));
        }
        if self.max_pending_transactions == 0 {
            return Err(ControllerError::InvalidConfig(
                "max_pending_transactions must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn consensus_params(&self) -> ConsensusParams {
        ConsensusParams {
            producer_repetitions: self.producer_repetitions,
            irreversible_threshold_percent: self.irreversible_threshold_percent,
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            algorithm: self.scheduling_algorithm,
            max_block_size: self.max_block_size,
            max_transactions_per_thread: self.max_transactions_per_thread,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ChainConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.consensus_params(), ConsensusParams::default());
        assert_eq!(config.scheduler_config(), SchedulerConfig::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = [
            ChainConfig {
                producer_repetitions: 0,
                ..Default::default()
            },
            ChainConfig {
                irreversible_threshold_percent: 101,
                ..Default::default()
            },
            ChainConfig {
                max_block_size: 0,
                ..Default::default()
            },
            ChainConfig {
                max_transactions_per_thread: 0,
                ..Default::default()
            },
            ChainConfig {
                max_transaction_lifetime_secs: 0,
                ..Default::default()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{config:?} should be rejected");
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ChainConfig =
            serde_json::from_str(r#"{"producer_repetitions": 6, "scheduling_algorithm": "in_single_thread"}"#)
                .unwrap();
        assert_eq!(config.producer_repetitions, 6);
        assert_eq!(config.scheduling_algorithm, SchedulingAlgorithm::InSingleThread);
        assert_eq!(config.max_block_size, 1024 * 1024);
    }
}
