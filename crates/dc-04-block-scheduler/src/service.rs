//! Block scheduler service.

use crate::algorithms::{
    block_overhead, by_cycling_conflicts, by_threading_conflicts, in_single_thread,
};
use crate::config::{SchedulerConfig, SchedulingAlgorithm};
use crate::domain::entities::{BlockSchedule, PendingTransaction};
use crate::domain::errors::SchedulerResult;
#[cfg(debug_assertions)]
use crate::domain::invariants::*;
use tracing::{debug, instrument};

/// Partitions pending transactions according to a [`SchedulerConfig`].
#[derive(Clone, Debug, Default)]
pub struct BlockScheduler {
    config: SchedulerConfig,
}

impl BlockScheduler {
    /// Create a scheduler, rejecting an invalid configuration.
    pub fn new(config: SchedulerConfig) -> SchedulerResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Byte budget available to transactions in one block.
    pub fn transaction_budget(&self) -> usize {
        self.config.max_block_size.saturating_sub(block_overhead())
    }

    /// Partition `transactions` into cycles and threads.
    ///
    /// Transactions that could not be placed are returned in
    /// [`BlockSchedule::leftovers`], in their input order.
    #[instrument(skip_all, fields(count = transactions.len(), algorithm = ?self.config.algorithm))]
    pub fn schedule(&self, transactions: Vec<PendingTransaction>) -> BlockSchedule {
        #[cfg(debug_assertions)]
        let inputs: Vec<_> = transactions.iter().map(|t| t.id).collect();

        let max_block_size = self.config.max_block_size;
        let schedule = match self.config.algorithm {
            SchedulingAlgorithm::ByThreadingConflicts => by_threading_conflicts(
                transactions,
                max_block_size,
                self.config.max_transactions_per_thread,
            ),
            SchedulingAlgorithm::ByCyclingConflicts => {
                by_cycling_conflicts(transactions, max_block_size)
            }
            SchedulingAlgorithm::InSingleThread => in_single_thread(transactions, max_block_size),
        };

        #[cfg(debug_assertions)]
        {
            debug_assert!(invariant_complete(&inputs, &schedule));
            debug_assert!(invariant_size_budget(&schedule, self.transaction_budget()));
            debug_assert!(invariant_no_empty_units(&schedule));
            debug_assert!(invariant_thread_order(&inputs, &schedule));
            if self.config.algorithm != SchedulingAlgorithm::InSingleThread {
                debug_assert!(invariant_disjoint_threads(&schedule));
            }
        }

        debug!(
            cycles = schedule.cycles.len(),
            scheduled = schedule.scheduled_count(),
            leftovers = schedule.leftovers.len(),
            "Block scheduled"
        );
        schedule
    }
}
