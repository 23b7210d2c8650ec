//! Configuration for the block scheduler.

use crate::domain::errors::{SchedulerError, SchedulerResult};
use serde::{Deserialize, Serialize};

/// Partitioning strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingAlgorithm {
    /// Several threads per cycle, capped transactions per thread.
    #[default]
    ByThreadingConflicts,
    /// One transaction per thread; conflicts move to the next cycle.
    ByCyclingConflicts,
    /// One cycle, one thread.
    InSingleThread,
}

/// Scheduler configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Partitioning strategy.
    pub algorithm: SchedulingAlgorithm,
    /// Maximum encoded block size in bytes, header included.
    pub max_block_size: usize,
    /// Transaction cap per thread for `ByThreadingConflicts`.
    pub max_transactions_per_thread: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            algorithm: SchedulingAlgorithm::default(),
            max_block_size: 1024 * 1024,
            max_transactions_per_thread: 4,
        }
    }
}

impl SchedulerConfig {
    /// Reject unusable limits.
    pub fn validate(&self) -> SchedulerResult<()> {
        if self.max_transactions_per_thread == 0 {
            return Err(SchedulerError::InvalidConfig(
                "max_transactions_per_thread must be at least 1".into(),
            ));
        }
        if self.max_block_size == 0 {
            return Err(SchedulerError::InvalidConfig(
                "max_block_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.algorithm, SchedulingAlgorithm::ByThreadingConflicts);
        assert_eq!(config.max_block_size, 1_048_576);
        assert_eq!(config.max_transactions_per_thread, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_algorithm_names() {
        let json = serde_json::to_string(&SchedulingAlgorithm::ByCyclingConflicts).unwrap();
        assert_eq!(json, "\"by_cycling_conflicts\"");
    }

    #[test]
    fn test_invalid_config() {
        let config = SchedulerConfig {
            max_transactions_per_thread: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
