//! # Controller
//!
//! Owns the chain: the fork database of reversible blocks, the state
//! database, the block log and the pending block being produced.
//!
//! ## Pending Block Lifecycle
//!
//! ```text
//!            start_pending_block            sign_block
//!  (idle) ───────────────────────▶ (open) ───────────────▶ fork db / head
//!     ▲                              │
//!     └──────abort_pending_block─────┘
//! ```
//!
//! ## State Revisions
//!
//! Every applied block owns one undo session, so the state revision equals
//! the applied head's block number. Popping a block undoes its session;
//! irreversibility commits sessions up to the LIB.

use crate::config::ChainConfig;
use crate::domain::errors::{ControllerError, ControllerResult, ForkDbError};
use crate::domain::fork_database::ForkDatabase;
use crate::domain::genesis::{GenesisConfig, GenesisState};
use crate::execution::system::{onblock_transaction, ONBLOCK, SYSTEM};
use crate::execution::{ActionDispatcher, BlockContext, TransactionOutcome};
use crate::layout::{plan_regions, shard_summary, undeclared_scope};
use crate::ports::{BlockLog, PrimaryKey, StateDatabase, TableId};
use dc_02_block_header_state::{BlockHeaderState, HeaderStateError};
use dc_03_block_state::{validate_transaction, BlockState, BlockStateError};
use dc_04_block_scheduler::{BlockScheduler, PendingTransaction};
use shared_bus::{ChainSignal, SignalPublisher};
use shared_crypto::{Digest, PrivateKey, PublicKey};
use shared_types::{
    BlockHeader, BlockId, BlockNum, BlockTimestamp, BlockTrace, CycleTrace, HeaderConfirmation, Name, ProducerKey,
    ProducerSchedule, RegionSummary, RegionTrace, ShardTrace, SignedBlock, TimePointSec,
    TraceStatus, Transaction, TransactionId, TransactionTrace,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Collaborators a controller is opened with.
pub struct ControllerDeps {
    pub state_db: Box<dyn StateDatabase>,
    pub block_log: Box<dyn BlockLog>,
    pub bus: Arc<dyn SignalPublisher>,
    pub dispatcher: ActionDispatcher,
}

/// Block being produced locally.
struct PendingBlock {
    header_state: BlockHeaderState,
    regions: Vec<RegionSummary>,
    input_transactions: Vec<Transaction>,
    trace: BlockTrace,
    /// Scheduled transactions that executed, for re-queueing on abort.
    executed: Vec<PendingTransaction>,
}

/// Chain controller.
pub struct Controller {
    config: ChainConfig,
    genesis: GenesisState,
    fork_db: ForkDatabase,
    /// Last applied block; the state database reflects it.
    head: Arc<BlockState>,
    state_db: Box<dyn StateDatabase>,
    block_log: Box<dyn BlockLog>,
    dispatcher: ActionDispatcher,
    scheduler: BlockScheduler,
    bus: Arc<dyn SignalPublisher>,
    pending: Option<PendingBlock>,
    queue: VecDeque<PendingTransaction>,
    queued: HashSet<TransactionId>,
    /// Transactions in applied blocks that have not expired yet.
    included: HashMap<TransactionId, TimePointSec>,
}

impl Controller {
    /// Open the chain.
    ///
    /// An empty block log starts a new chain from `genesis_config`.
    /// Otherwise uncommitted state changes are rolled back, logged blocks
    /// the state database has not seen are replayed, and the fork database
    /// is rooted at the log head.
    #[instrument(skip_all)]
    pub fn open(
        config: ChainConfig,
        genesis_config: &GenesisConfig,
        deps: ControllerDeps,
    ) -> ControllerResult<Self> {
        config.validate()?;
        let genesis = genesis_config.build()?;
        let genesis_state = BlockState::genesis(BlockHeaderState::genesis(
            config.consensus_params(),
            genesis.initial_schedule.clone(),
            genesis.initial_timestamp,
            genesis.chain_id,
        )?);
        let scheduler = BlockScheduler::new(config.scheduler_config())?;

        let ControllerDeps {
            mut state_db,
            block_log,
            bus,
            dispatcher,
        } = deps;
        state_db.undo_all();

        let head = Arc::new(genesis_state.clone());
        let mut controller = Self {
            config,
            genesis,
            fork_db: ForkDatabase::new(genesis_state),
            head,
            state_db,
            block_log,
            dispatcher,
            scheduler,
            bus,
            pending: None,
            queue: VecDeque::new(),
            queued: HashSet::new(),
            included: HashMap::new(),
        };

        if controller.block_log.is_empty() {
            controller.initialize_genesis()?;
        } else {
            controller.replay_block_log()?;
        }

        info!(
            head = controller.head_block_num(),
            lib = controller.last_irreversible_block_num(),
            chain_id = %controller.genesis.chain_id,
            "Controller opened"
        );
        Ok(controller)
    }

    fn initialize_genesis(&mut self) -> ControllerResult<()> {
        info!(
            producers = self.genesis.initial_schedule.len(),
            "Initializing chain from genesis"
        );
        if self.state_db.revision() == 0 {
            self.genesis.seed(self.state_db.as_mut());
            self.state_db.set_revision(1)?;
        }
        self.block_log.append(&self.head.block)?;
        Ok(())
    }

    fn replay_block_log(&mut self) -> ControllerResult<()> {
        let logged = self
            .block_log
            .read_block_by_num(1)?
            .ok_or(ControllerError::MissingLoggedBlock { block_num: 1 })?;
        if logged.id() != self.head.id() {
            return Err(ControllerError::GenesisMismatch {
                expected: self.head.id(),
                actual: logged.id(),
            });
        }

        let log_head = self.block_log.head_num();
        if self.state_db.revision() == 0 {
            self.genesis.seed(self.state_db.as_mut());
            self.state_db.set_revision(1)?;
        }
        let revision = self.state_db.revision();
        if revision > u64::from(log_head) {
            return Err(ControllerError::StateAheadOfLog { revision, log_head });
        }

        info!(log_head, revision, "Replaying block log");
        for block_num in 2..=log_head {
            let block = self
                .block_log
                .read_block_by_num(block_num)?
                .ok_or(ControllerError::MissingLoggedBlock { block_num })?;
            let header_state = self.head.header_state.next(&block.header)?;
            let mut state = BlockState::new(header_state, Arc::new(block))?;

            if u64::from(block_num) > revision {
                state.trace = self.execute_block(&state)?;
                self.state_db.commit(u64::from(block_num));
            }
            state.validated = true;
            self.record_included(&state.block);
            self.head = Arc::new(state);
        }

        self.fork_db = ForkDatabase::new((*self.head).clone());
        self.purge_expired_included();
        Ok(())
    }

    // =========================================================================
    // Transaction intake
    // =========================================================================

    /// Queue a transaction for the next pending block.
    ///
    /// Rejects expired transactions, expirations beyond the lifetime limit,
    /// duplicates, a full queue and structurally invalid transactions.
    pub fn push_transaction(&mut self, trx: Transaction) -> ControllerResult<TransactionId> {
        let id = trx.id();
        match self.check_intake(&trx, id) {
            Ok(()) => {
                self.queued.insert(id);
                self.queue.push_back(PendingTransaction::new(Arc::new(trx)));
                debug!(trx_id = %id, queued = self.queue.len(), "Transaction queued");
                self.bus.publish(ChainSignal::TransactionAdded { id });
                Ok(id)
            }
            Err(err) => {
                warn!(trx_id = %id, error = %err, "Transaction rejected");
                self.bus.publish(ChainSignal::TransactionRejected {
                    id,
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn check_intake(&self, trx: &Transaction, id: TransactionId) -> ControllerResult<()> {
        let head_time = self.head.header_state.timestamp();
        if !trx.expiration.is_after(head_time) {
            return Err(ControllerError::TransactionExpired {
                id,
                expiration: trx.expiration,
                head_time,
            });
        }
        let max = TimePointSec::from_block_timestamp(head_time, self.config.max_transaction_lifetime_secs);
        if trx.expiration > max {
            return Err(ControllerError::ExpirationTooFar {
                id,
                expiration: trx.expiration,
                max,
            });
        }
        if self.is_known(&id) {
            return Err(ControllerError::DuplicateTransaction { id });
        }
        if self.queue.len() >= self.config.max_pending_transactions {
            return Err(ControllerError::CapacityExceeded {
                limit: self.config.max_pending_transactions,
            });
        }
        validate_transaction(trx, head_time)?;
        Ok(())
    }

    fn is_known(&self, id: &TransactionId) -> bool {
        self.queued.contains(id)
            || self.included.contains_key(id)
            || self
                .pending
                .as_ref()
                .is_some_and(|p| p.executed.iter().any(|t| t.id == *id))
    }

    // =========================================================================
    // Block production
    // =========================================================================

    /// Open a pending block on top of the head, in the slot of `when` (or the
    /// next slot).
    ///
    /// Runs `onblock`, schedules the queued transactions and executes them.
    /// Transactions that do not fit stay queued; failed ones are rejected.
    #[instrument(skip(self))]
    pub fn start_pending_block(&mut self, when: Option<BlockTimestamp>) -> ControllerResult<&BlockHeaderState> {
        if self.pending.is_some() {
            return Err(ControllerError::PendingBlockExists);
        }

        let mut header_state = self.head.header_state.generate_next(when)?;
        let block = BlockContext {
            block_num: header_state.block_num,
            timestamp: header_state.timestamp(),
            producer: header_state.producer(),
        };

        let onblock = PendingTransaction::new(Arc::new(onblock_transaction(&header_state.header.header)));
        self.state_db.start_undo_session();

        self.drop_expired_queued(block.timestamp);
        let batch: Vec<PendingTransaction> = self.queue.drain(..).collect();
        self.queued.clear();
        let schedule = self.scheduler.schedule(batch);
        for leftover in schedule.leftovers.iter().rev() {
            self.queued.insert(leftover.id);
            self.queue.push_front(leftover.clone());
        }

        let mut regions = Vec::new();
        let mut trace = BlockTrace::default();
        let mut input_transactions = Vec::new();
        let mut executed = Vec::new();

        for plan in plan_regions(onblock.clone(), &schedule) {
            let mut summary = RegionSummary {
                region: plan.region,
                cycles_summary: Vec::new(),
            };
            let mut region_trace = RegionTrace::default();

            for cycle in plan.cycles {
                let mut cycle_summary = Vec::new();
                let mut cycle_trace = CycleTrace::default();

                for shard in cycle {
                    let mut succeeded: Vec<&PendingTransaction> = Vec::new();
                    let mut shard_trace = ShardTrace::default();

                    for ptrx in &shard {
                        match self.execute_pending(&ptrx.trx, ptrx.id, &mut header_state, block) {
                            Ok(trx_trace) => {
                                succeeded.push(ptrx);
                                shard_trace.transaction_traces.push(trx_trace);
                            }
                            Err(err) if ptrx.id == onblock.id => {
                                self.state_db.undo()?;
                                self.requeue_front(schedule.transactions().cloned().collect());
                                return Err(err);
                            }
                            Err(err) => self.reject(ptrx.id, &err),
                        }
                    }

                    if succeeded.is_empty() {
                        continue;
                    }
                    cycle_summary.push(shard_summary(succeeded.iter().map(|p| p.trx.as_ref())));
                    cycle_trace.shard_traces.push(shard_trace);
                    for ptrx in succeeded {
                        input_transactions.push(ptrx.trx.as_ref().clone());
                        if ptrx.id != onblock.id {
                            self.bus.publish(ChainSignal::TransactionValidated {
                                id: ptrx.id,
                                block_num: block.block_num,
                            });
                            executed.push(ptrx.clone());
                        }
                    }
                }

                if !cycle_summary.is_empty() {
                    summary.cycles_summary.push(cycle_summary);
                    region_trace.cycle_traces.push(cycle_trace);
                }
            }

            if !summary.cycles_summary.is_empty() {
                regions.push(summary);
                trace.region_traces.push(region_trace);
            }
        }

        info!(
            block_num = block.block_num,
            producer = %block.producer,
            transactions = executed.len(),
            postponed = schedule.leftovers.len(),
            "Pending block started"
        );

        let pending = self.pending.insert(PendingBlock {
            header_state,
            regions,
            input_transactions,
            trace,
            executed,
        });
        Ok(&pending.header_state)
    }

    /// Execute one transaction of the pending block in its own session.
    ///
    /// A `setprods` proposal is installed on the pending header state; if
    /// that is not possible the transaction fails.
    fn execute_pending(
        &mut self,
        trx: &Transaction,
        id: TransactionId,
        header_state: &mut BlockHeaderState,
        block: BlockContext,
    ) -> ControllerResult<TransactionTrace> {
        self.state_db.start_undo_session();
        let result = self
            .dispatcher
            .execute_transaction(self.state_db.as_mut(), trx, block)
            .map_err(|source| ControllerError::TransactionFailed { id, source })
            .and_then(|outcome| {
                if let Some(producers) = &outcome.proposed_producers {
                    let version = header_state.active_schedule.version.wrapping_add(1);
                    header_state.set_new_producers(ProducerSchedule::new(version, producers.clone()))?;
                }
                Ok(outcome)
            });

        match result {
            Ok(outcome) => {
                self.state_db.squash()?;
                Ok(executed_trace(id, outcome))
            }
            Err(err) => {
                self.state_db.undo()?;
                Err(err)
            }
        }
    }

    /// Sign the pending block, add it to the fork database and make it the
    /// head.
    ///
    /// `key` must be the scheduled producer's key; on mismatch the pending
    /// block stays open.
    #[instrument(skip_all)]
    pub fn sign_block(&mut self, key: &PrivateKey) -> ControllerResult<Arc<BlockState>> {
        let pending = self.pending.as_ref().ok_or(ControllerError::NoPendingBlock)?;
        let expected = pending.header_state.block_signing_key;
        let actual = key.public_key();
        if actual != expected {
            return Err(ControllerError::WrongSigningKey { expected, actual });
        }
        let Some(pending) = self.pending.take() else {
            return Err(ControllerError::NoPendingBlock);
        };
        let PendingBlock {
            header_state,
            regions,
            input_transactions,
            trace,
            executed,
        } = pending;

        let block = SignedBlock {
            header: header_state.header.clone(),
            regions,
            input_transactions,
        };
        let state = match self.seal_block(header_state, block, trace, key) {
            Ok(state) => state,
            Err(err) => {
                self.state_db.undo()?;
                self.requeue_front(executed);
                warn!(error = %err, "Pending block could not be sealed");
                return Err(err);
            }
        };
        self.record_included(&state.block);
        self.head = Arc::clone(&state);

        info!(
            block_num = state.block_num(),
            producer = %state.header_state.producer(),
            transactions = executed.len(),
            lib = state.header_state.last_irreversible_blocknum(),
            "Produced block"
        );
        self.bus.publish(ChainSignal::BlockLinked {
            block_id: state.id(),
            producer: state.header_state.producer(),
        });
        self.announce_transactions(&state, false);
        self.bus.publish(ChainSignal::BlockValidated { block_id: state.id() });

        self.maybe_switch_forks()?;
        self.advance_irreversibility()?;
        Ok(state)
    }

    /// Fill in the body roots, sign and link the block under the head.
    fn seal_block(
        &mut self,
        mut header_state: BlockHeaderState,
        mut block: SignedBlock,
        trace: BlockTrace,
        key: &PrivateKey,
    ) -> ControllerResult<Arc<BlockState>> {
        header_state.set_body_roots(
            block.calculate_transaction_mroot(),
            block.calculate_action_mroot(),
        );
        header_state.sign_with_key(key)?;
        block.header = header_state.header.clone();

        let mut state = BlockState::new(header_state, Arc::new(block))?;
        state.trace = trace;
        state.validated = true;
        Ok(self.fork_db.add(state)?)
    }

    /// Discard the pending block and its state changes.
    ///
    /// Its transactions go back to the front of the queue. Returns how many.
    pub fn abort_pending_block(&mut self) -> ControllerResult<usize> {
        let Some(pending) = self.pending.take() else {
            return Ok(0);
        };
        self.state_db.undo()?;
        let count = pending.executed.len();
        self.requeue_front(pending.executed);
        debug!(block_num = pending.header_state.block_num, requeued = count, "Pending block aborted");
        Ok(count)
    }

    // =========================================================================
    // Blocks from peers
    // =========================================================================

    /// Validate and link a block received from a peer, switching forks if it
    /// extends the best branch.
    #[instrument(skip_all, fields(block_num = block.block_num()))]
    pub fn push_block(&mut self, block: SignedBlock) -> ControllerResult<Arc<BlockState>> {
        self.abort_pending_block()?;

        let id = block.id();
        let previous = block.header.header.previous;
        let parent = self
            .fork_db
            .get(&previous)
            .ok_or(ForkDbError::UnlinkableBlock { id, previous })?;

        let header_state = parent.header_state.next(&block.header)?;
        let state = BlockState::new(header_state, Arc::new(block))?;
        let state = self.fork_db.add(state)?;
        debug!(block_num = state.block_num(), producer = %state.header_state.producer(), "Block linked");
        self.bus.publish(ChainSignal::BlockLinked {
            block_id: id,
            producer: state.header_state.producer(),
        });

        self.maybe_switch_forks()?;
        self.advance_irreversibility()?;
        Ok(self.fork_db.get(&id).unwrap_or(state))
    }

    /// Record a producer confirmation of a reversible block.
    pub fn add_confirmation(&mut self, conf: HeaderConfirmation) -> ControllerResult<()> {
        self.abort_pending_block()?;
        self.fork_db.add_confirmation(conf)?;
        self.maybe_switch_forks()?;
        self.advance_irreversibility()
    }

    /// Bring the applied head to the fork database head.
    fn maybe_switch_forks(&mut self) -> ControllerResult<()> {
        // Confirmations replace states in place; pick up the current copy.
        if let Some(current) = self.fork_db.get(&self.head.id()) {
            self.head = current;
        }
        let new_head = self.fork_db.head();
        if new_head.id() == self.head.id() {
            return Ok(());
        }

        if new_head.previous() == self.head.id() {
            return match self.apply_block(&new_head) {
                Ok(applied) => {
                    self.head = applied;
                    Ok(())
                }
                Err(err) => {
                    warn!(block_num = new_head.block_num(), error = %err, "Block failed to apply");
                    self.fork_db.remove(&new_head.id())?;
                    Err(err)
                }
            };
        }

        let (new_branch, old_branch) = self
            .fork_db
            .fetch_branch_from(&new_head.id(), &self.head.id())?;
        info!(
            old_head = self.head.block_num(),
            new_head = new_head.block_num(),
            popped = old_branch.len(),
            "Switching forks"
        );

        let mut popped = Vec::new();
        for state in &old_branch {
            self.pop_block(state)?;
            popped.extend(state.block.input_transactions.iter().cloned());
        }

        for (applied, state) in new_branch.iter().rev().enumerate() {
            if let Err(err) = self.apply_block(state).map(|s| self.head = s) {
                warn!(block_num = state.block_num(), error = %err, "Fork switch failed, restoring");
                self.fork_db.remove(&state.id())?;
                for done in new_branch.iter().rev().take(applied).rev() {
                    self.pop_block(done)?;
                }
                for old in old_branch.iter().rev() {
                    let restored = self.apply_block(old)?;
                    self.head = restored;
                }
                return Err(err);
            }
        }

        self.requeue_popped(popped);
        Ok(())
    }

    /// Execute a linked block on top of the applied head.
    fn apply_block(&mut self, state: &Arc<BlockState>) -> ControllerResult<Arc<BlockState>> {
        let trace = self.execute_block(state)?;
        let applied = self.fork_db.mark_applied(&state.id(), trace)?;
        self.record_included(&applied.block);
        for trx in &applied.block.input_transactions {
            let id = trx.id();
            if self.queued.remove(&id) {
                self.queue.retain(|p| p.id != id);
            }
        }

        self.announce_transactions(&applied, true);
        self.bus.publish(ChainSignal::BlockValidated { block_id: applied.id() });
        info!(
            block_num = applied.block_num(),
            producer = %applied.header_state.producer(),
            transactions = applied.block.transaction_count(),
            "Applied block"
        );
        Ok(applied)
    }

    /// Run a block's transactions in body order inside a new undo session.
    ///
    /// On success the session stays open and the trace is returned. Any
    /// failure undoes the whole block.
    fn execute_block(&mut self, state: &BlockState) -> ControllerResult<BlockTrace> {
        let revision = self.state_db.start_undo_session();
        debug_assert_eq!(revision, u64::from(state.block_num()));

        match self.run_block_body(state) {
            Ok(trace) => Ok(trace),
            Err(err) => {
                self.state_db.undo()?;
                Err(err)
            }
        }
    }

    fn run_block_body(&mut self, state: &BlockState) -> ControllerResult<BlockTrace> {
        let block = &state.block;
        let header = &block.header.header;
        let block_num = state.block_num();

        if block.calculate_transaction_mroot() != header.transaction_mroot {
            return Err(ControllerError::MerkleRootMismatch {
                block_num,
                root: "transaction",
            });
        }
        if block.calculate_action_mroot() != header.action_mroot {
            return Err(ControllerError::MerkleRootMismatch {
                block_num,
                root: "action",
            });
        }

        // The producer ran onblock on the template header, before the body
        // roots and any schedule proposal were filled in.
        let onblock_id = onblock_transaction(&BlockHeader {
            transaction_mroot: Digest::ZERO,
            action_mroot: Digest::ZERO,
            new_producers: None,
            ..header.clone()
        })
        .id();
        let first_receipt = block
            .regions
            .first()
            .filter(|r| r.region == 0)
            .and_then(|r| r.cycles_summary.first())
            .and_then(|c| c.first())
            .and_then(|s| s.transactions.first());
        if first_receipt.map(|r| r.id) != Some(onblock_id) {
            return Err(ControllerError::InvalidOnblock { block_num });
        }

        let ctx = BlockContext {
            block_num,
            timestamp: header.timestamp,
            producer: header.producer,
        };
        let mut trace = state.trace.clone();
        let mut onblock_seen = false;
        let mut proposed: Option<ProducerSchedule> = None;

        for (region, region_trace) in block.regions.iter().zip(trace.region_traces.iter_mut()) {
            for (cycle, cycle_trace) in region
                .cycles_summary
                .iter()
                .zip(region_trace.cycle_traces.iter_mut())
            {
                for (shard, shard_trace) in cycle.iter().zip(cycle_trace.shard_traces.iter_mut()) {
                    for (receipt, trx_trace) in shard
                        .transactions
                        .iter()
                        .zip(shard_trace.transaction_traces.iter_mut())
                    {
                        let trx = state
                            .find_transaction(&receipt.id)
                            .ok_or(BlockStateError::MissingInputTransaction { id: receipt.id })?;
                        if let Some(lock) = undeclared_scope(shard, trx) {
                            return Err(ControllerError::UndeclaredScope { id: receipt.id, lock });
                        }
                        if is_onblock(trx) {
                            if onblock_seen || receipt.id != onblock_id {
                                return Err(ControllerError::InvalidOnblock { block_num });
                            }
                            onblock_seen = true;
                        }
                        let mut outcome = self
                            .dispatcher
                            .execute_transaction(self.state_db.as_mut(), trx, ctx)
                            .map_err(|source| ControllerError::TransactionFailed {
                                id: receipt.id,
                                source,
                            })?;
                        if let Some(producers) = outcome.proposed_producers.take() {
                            // A second proposal would have failed on the producer.
                            if proposed.is_some() {
                                return Err(schedule_mismatch(block_num, header, proposed.as_ref()));
                            }
                            let version = state.header_state.active_schedule.version.wrapping_add(1);
                            proposed = Some(ProducerSchedule::new(version, producers));
                        }
                        *trx_trace = executed_trace(receipt.id, outcome);
                    }
                }
            }
        }

        if proposed != header.new_producers {
            return Err(schedule_mismatch(block_num, header, proposed.as_ref()));
        }
        Ok(trace)
    }

    /// Undo the applied head, which must be `state`.
    fn pop_block(&mut self, state: &Arc<BlockState>) -> ControllerResult<()> {
        debug_assert_eq!(state.id(), self.head.id());
        self.state_db.undo()?;
        for trx in &state.block.input_transactions {
            self.included.remove(&trx.id());
        }
        let previous = state.previous();
        self.head = self
            .fork_db
            .get(&previous)
            .ok_or(ForkDbError::UnknownBlock { id: previous })?;
        debug!(block_num = state.block_num(), "Popped block");
        Ok(())
    }

    // =========================================================================
    // Irreversibility
    // =========================================================================

    /// Log, commit and prune everything at or below the head's LIB.
    fn advance_irreversibility(&mut self) -> ControllerResult<()> {
        let lib = self.head.header_state.last_irreversible_blocknum();
        let root = self.fork_db.root();
        if lib <= root.block_num() {
            return Ok(());
        }

        let branch = self.fork_db.branch_from_root(&self.head.id())?;
        let log_head = self.block_log.head_num();
        let mut new_root = None;
        for state in branch.iter().take_while(|s| s.block_num() <= lib) {
            if state.block_num() > log_head {
                self.block_log.append(&state.block)?;
            }
            self.bus.publish(ChainSignal::BlockConfirmed { block_id: state.id() });
            new_root = Some(state.id());
        }

        let Some(new_root) = new_root else {
            return Ok(());
        };
        self.state_db.commit(u64::from(lib));
        let pruned = self.fork_db.prune(&new_root)?;
        self.purge_expired_included();

        info!(lib, pruned, "Irreversible block advanced");
        Ok(())
    }

    // =========================================================================
    // Queue bookkeeping
    // =========================================================================

    fn reject(&self, id: TransactionId, err: &ControllerError) {
        warn!(trx_id = %id, error = %err, "Transaction failed");
        self.bus.publish(ChainSignal::TransactionRejected {
            id,
            reason: err.to_string(),
        });
    }

    fn drop_expired_queued(&mut self, block_time: BlockTimestamp) {
        let (live, expired): (VecDeque<_>, VecDeque<_>) = self
            .queue
            .drain(..)
            .partition(|p| p.trx.expiration.is_after(block_time));
        self.queue = live;
        for p in expired {
            self.queued.remove(&p.id);
            let err = ControllerError::TransactionExpired {
                id: p.id,
                expiration: p.trx.expiration,
                head_time: block_time,
            };
            self.reject(p.id, &err);
        }
    }

    fn requeue_front(&mut self, transactions: Vec<PendingTransaction>) {
        for p in transactions.into_iter().rev() {
            if self.queued.insert(p.id) {
                self.queue.push_front(p);
            }
        }
    }

    /// Put transactions of blocks dropped by a fork switch back in the queue
    /// unless the new branch already includes them.
    fn requeue_popped(&mut self, transactions: Vec<Transaction>) {
        let head_time = self.head.header_state.timestamp();
        let revived: Vec<PendingTransaction> = transactions
            .into_iter()
            .filter(|trx| !is_onblock(trx) && trx.expiration.is_after(head_time))
            .map(|trx| PendingTransaction::new(Arc::new(trx)))
            .filter(|p| !self.included.contains_key(&p.id))
            .collect();
        if !revived.is_empty() {
            debug!(requeued = revived.len(), "Re-queued transactions from popped blocks");
        }
        self.requeue_front(revived);
    }

    fn record_included(&mut self, block: &SignedBlock) {
        for trx in &block.input_transactions {
            self.included.insert(trx.id(), trx.expiration);
        }
    }

    fn purge_expired_included(&mut self) {
        let head_time = self.head.header_state.timestamp();
        self.included.retain(|_, expiration| expiration.is_after(head_time));
    }

    fn announce_transactions(&self, state: &BlockState, validated: bool) {
        for trx in &state.block.input_transactions {
            if is_onblock(trx) {
                continue;
            }
            let id = trx.id();
            if validated {
                self.bus.publish(ChainSignal::TransactionValidated {
                    id,
                    block_num: state.block_num(),
                });
            }
            self.bus.publish(ChainSignal::TransactionConfirmed {
                id,
                block_id: state.id(),
            });
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn chain_id(&self) -> Digest {
        self.genesis.chain_id
    }

    /// Applied head.
    pub fn head(&self) -> Arc<BlockState> {
        Arc::clone(&self.head)
    }

    pub fn head_block_id(&self) -> BlockId {
        self.head.id()
    }

    pub fn head_block_num(&self) -> BlockNum {
        self.head.block_num()
    }

    pub fn head_block_time(&self) -> BlockTimestamp {
        self.head.header_state.timestamp()
    }

    pub fn head_block_producer(&self) -> Name {
        self.head.header_state.producer()
    }

    /// Effective LIB of the applied head.
    pub fn last_irreversible_block_num(&self) -> BlockNum {
        self.head.header_state.last_irreversible_blocknum()
    }

    /// Header state of the pending block, if one is open.
    pub fn pending_block_state(&self) -> Option<&BlockHeaderState> {
        self.pending.as_ref().map(|p| &p.header_state)
    }

    pub fn active_producers(&self) -> &ProducerSchedule {
        &self.head.header_state.active_schedule
    }

    pub fn pending_producers(&self) -> Option<&ProducerSchedule> {
        self.head.header_state.pending_schedule.as_ref()
    }

    /// Number of queued transactions.
    pub fn pending_transaction_count(&self) -> usize {
        self.queue.len()
    }

    /// Reversible block states held by the fork database.
    pub fn fork_db(&self) -> &ForkDatabase {
        &self.fork_db
    }

    /// Block by id, reversible or logged.
    pub fn fetch_block_by_id(&self, id: &BlockId) -> ControllerResult<Option<Arc<SignedBlock>>> {
        if let Some(state) = self.fork_db.get(id) {
            return Ok(Some(Arc::clone(&state.block)));
        }
        Ok(self
            .block_log
            .read_block_by_num(id.block_num())?
            .filter(|b| b.id() == *id)
            .map(Arc::new))
    }

    /// Block by number on the applied branch.
    pub fn fetch_block_by_number(&self, block_num: BlockNum) -> ControllerResult<Option<Arc<SignedBlock>>> {
        if let Some(state) = self.fork_db.search_on_branch(&self.head.id(), block_num) {
            return Ok(Some(Arc::clone(&state.block)));
        }
        Ok(self.block_log.read_block_by_num(block_num)?.map(Arc::new))
    }

    /// Every row of a table.
    pub fn get_table_rows(&self, table: &TableId) -> Vec<(PrimaryKey, Vec<u8>)> {
        self.state_db.rows(table)
    }

    /// One row of a table.
    pub fn get_row(&self, table: &TableId, key: PrimaryKey) -> Option<Vec<u8>> {
        self.state_db.get(table, key)
    }

    /// Producer and key scheduled for the slot of `when`, building on the
    /// head.
    pub fn scheduled_producer(&self, when: BlockTimestamp) -> ControllerResult<ProducerKey> {
        Ok(self.head.header_state.get_scheduled_producer(when)?.clone())
    }

    /// Next slot after the head in which `producer` may produce.
    pub fn next_production_slot(&self, producer: Name) -> ControllerResult<Option<BlockTimestamp>> {
        let rotation = self.head.header_state.params.rotation()?;
        rotation
            .next_slot_for(&self.head.header_state.active_schedule, self.head_block_time(), producer)
            .map_err(|e| ControllerError::HeaderState(HeaderStateError::from(e)))
    }

    /// Signing key scheduled for `producer`, if active.
    pub fn producer_key(&self, producer: Name) -> Option<PublicKey> {
        self.head.header_state.active_schedule.get_producer_key(producer)
    }
}

fn schedule_mismatch(
    block_num: BlockNum,
    header: &BlockHeader,
    executed: Option<&ProducerSchedule>,
) -> ControllerError {
    ControllerError::ProposedScheduleMismatch {
        block_num,
        declared: header.new_producers.as_ref().map(|s| s.version),
        executed: executed.map(|s| s.version),
    }
}

fn is_onblock(trx: &Transaction) -> bool {
    matches!(trx.actions.as_slice(), [act] if act.account == SYSTEM && act.name == ONBLOCK)
}

fn executed_trace(id: TransactionId, outcome: TransactionOutcome) -> TransactionTrace {
    TransactionTrace {
        id,
        status: TraceStatus::Executed,
        action_traces: outcome.action_traces,
    }
}
