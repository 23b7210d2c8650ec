//! Shared fixtures for controller unit tests.

use crate::adapters::{MemoryBlockLog, MemoryStateDb};
use crate::config::ChainConfig;
use crate::controller::{Controller, ControllerDeps};
use crate::domain::genesis::{GenesisConfig, GenesisState};
use crate::execution::ActionDispatcher;
use dc_02_block_header_state::BlockHeaderState;
use dc_03_block_state::BlockState;
use shared_bus::SignalBus;
use shared_crypto::{sign, PrivateKey};
use shared_types::{
    Action, HeaderConfirmation, Name, PermissionLevel, RegionSummary, ShardLock, ShardSummary,
    BlockTimestamp, SignedBlock, TimePointSec, Transaction, TransactionReceipt,
};
use std::sync::Arc;

pub const TOKEN: Name = Name::constant("token");
pub const TRANSFER: Name = Name::constant("transfer");
pub const ALICE: Name = Name::constant("alice");

/// A devnet genesis with `n` generated producers.
pub struct TestChain {
    pub config: ChainConfig,
    pub genesis_config: GenesisConfig,
    pub genesis: GenesisState,
}

impl TestChain {
    pub fn new(n_producers: u32) -> Self {
        let genesis_config = GenesisConfig::devnet(n_producers, "test");
        let genesis = genesis_config.build().unwrap();
        Self {
            config: ChainConfig::default(),
            genesis_config,
            genesis,
        }
    }

    pub fn genesis_block_state(&self) -> BlockState {
        BlockState::genesis(
            BlockHeaderState::genesis(
                self.config.consensus_params(),
                self.genesis.initial_schedule.clone(),
                self.genesis.initial_timestamp,
                self.genesis.chain_id,
            )
            .unwrap(),
        )
    }

    pub fn producer_names(&self) -> Vec<Name> {
        self.genesis
            .initial_schedule
            .producers
            .iter()
            .map(|p| p.producer_name)
            .collect()
    }

    pub fn key(&self, producer: Name) -> PrivateKey {
        self.genesis_config.producer_private_key(producer).unwrap()
    }

    /// Signed child of `parent`, `slot_offset` slots later, carrying one
    /// transfer.
    pub fn child_of(&self, parent: &BlockState, slot_offset: u32) -> BlockState {
        let when = parent.header_state.get_slot_time(slot_offset).unwrap();
        let mut header_state = parent.header_state.generate_next(Some(when)).unwrap();

        let trx = transfer(ALICE, &header_state.block_num.to_le_bytes());
        let mut block = SignedBlock {
            header: header_state.header.clone(),
            regions: vec![RegionSummary {
                region: 0,
                cycles_summary: vec![vec![ShardSummary {
                    read_locks: vec![],
                    write_locks: trx.write_scope.clone(),
                    transactions: vec![TransactionReceipt { id: trx.id() }],
                }]],
            }],
            input_transactions: vec![trx],
        };
        header_state.set_body_roots(
            block.calculate_transaction_mroot(),
            block.calculate_action_mroot(),
        );
        header_state
            .sign_with_key(&self.key(header_state.producer()))
            .unwrap();
        block.header = header_state.header.clone();

        BlockState::new(header_state, Arc::new(block)).unwrap()
    }

    /// `producer`'s signed endorsement of `state`.
    pub fn confirm(&self, state: &BlockState, producer: Name) -> HeaderConfirmation {
        HeaderConfirmation {
            block_id: state.id(),
            producer,
            producer_signature: sign(&self.key(producer), &state.header_state.sig_digest()).unwrap(),
        }
    }

    /// Controller over in-memory adapters.
    pub fn open_controller(&self) -> (Controller, Arc<SignalBus>) {
        self.open_controller_with(ActionDispatcher::with_system_handlers())
    }

    pub fn open_controller_with(&self, dispatcher: ActionDispatcher) -> (Controller, Arc<SignalBus>) {
        let bus = Arc::new(SignalBus::new());
        let controller = Controller::open(
            self.config.clone(),
            &self.genesis_config,
            ControllerDeps {
                state_db: Box::new(MemoryStateDb::new()),
                block_log: Box::new(MemoryBlockLog::new()),
                bus: bus.clone(),
                dispatcher,
            },
        )
        .unwrap();
        (controller, bus)
    }

    /// Start and sign the next block on `controller` in its next slot.
    pub fn produce(&self, controller: &mut Controller) -> Arc<BlockState> {
        let producer = controller.start_pending_block(None).unwrap().producer();
        controller.sign_block(&self.key(producer)).unwrap()
    }
}

/// Expiration well inside the lifetime window of a fresh test chain.
pub fn expiration() -> TimePointSec {
    TimePointSec::from_block_timestamp(BlockTimestamp::from_slot(0), 3000)
}

/// Transfer authorized by `from`, writing `token/from`.
pub fn transfer(from: Name, memo: &[u8]) -> Transaction {
    Transaction {
        expiration: expiration(),
        region: 0,
        read_scope: vec![],
        write_scope: vec![ShardLock::new(TOKEN, from)],
        context_free_actions: vec![],
        actions: vec![Action {
            account: TOKEN,
            name: TRANSFER,
            authorization: vec![PermissionLevel {
                actor: from,
                permission: Name::constant("active"),
            }],
            data: memo.to_vec(),
        }],
    }
}
