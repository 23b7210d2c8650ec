//! # Test Network Fixtures
//!
//! A devnet genesis shared by any number of in-memory nodes, a `token`
//! contract whose `transfer` action counts transfers per sender, and
//! helpers to produce blocks in chosen slots.

use dc_03_block_state::BlockState;
use dc_05_controller::{
    ActionDispatcher, ApplyContext, BlockLog, ChainConfig, Controller, ControllerDeps,
    ControllerResult, ExecutionError, ExecutionResult, GenesisConfig, MemoryBlockLog,
    MemoryStateDb, TableId,
};
use shared_bus::SignalBus;
use shared_crypto::{sign, PrivateKey};
use shared_types::{
    Action, BlockTimestamp, HeaderConfirmation, Name, PermissionLevel, ProducerKey, ShardLock,
    SignedBlock, TimePointSec, Transaction,
};
use std::sync::Arc;

pub const TOKEN: Name = Name::constant("token");
pub const TRANSFER: Name = Name::constant("transfer");
pub const TRANSFERS_TABLE: Name = Name::constant("transfers");

/// Table counting the transfers sent by `from`.
pub fn transfers_table(from: Name) -> TableId {
    TableId::new(TOKEN, from, TRANSFERS_TABLE)
}

/// `token::transfer`: bump the sender's transfer counter.
pub fn record_transfer(ctx: &mut ApplyContext<'_>) -> ExecutionResult<()> {
    let from = ctx
        .act()
        .authorization
        .first()
        .map(|p| p.actor)
        .ok_or(ExecutionError::MissingAuthorization { actor: TOKEN })?;
    ctx.require_authorization(from)?;

    let table = transfers_table(from);
    let count: u64 = ctx.get_row(&table, 0)?.unwrap_or(0);
    ctx.put_row(&table, 0, &(count + 1))
}

/// System handlers plus `token::transfer`.
pub fn dispatcher() -> ActionDispatcher {
    let mut dispatcher = ActionDispatcher::with_system_handlers();
    dispatcher.register(TOKEN, TRANSFER, record_transfer);
    dispatcher
}

/// Account `index` (`usera`, `userb`, ...).
pub fn account(index: u8) -> Name {
    Name::new(&format!("user{}", char::from(b'a' + index % 26))).expect("valid account name")
}

/// Expiration valid for the first ten minutes of a test chain.
pub fn expiration() -> TimePointSec {
    TimePointSec::from_block_timestamp(BlockTimestamp::from_slot(0), 600)
}

/// Transfer sent by `from`; `nonce` keeps ids distinct.
pub fn transfer(from: Name, nonce: u64) -> Transaction {
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
            data: nonce.to_le_bytes().to_vec(),
        }],
    }
}

/// A controller and the bus it publishes on.
pub struct Node {
    pub controller: Controller,
    pub bus: Arc<SignalBus>,
}

impl Node {
    /// Transfers recorded for `from` in this node's state.
    pub fn transfers(&self, from: Name) -> u64 {
        self.controller
            .get_row(&transfers_table(from), 0)
            .map(|bytes| shared_types::decode(&bytes).expect("counter row"))
            .unwrap_or(0)
    }

    /// Push every block to this node, oldest first.
    pub fn push_blocks<'a>(&mut self, blocks: impl IntoIterator<Item = &'a SignedBlock>) {
        for block in blocks {
            self.controller
                .push_block(block.clone())
                .expect("peer block accepted");
        }
    }
}

/// Devnet configuration shared by every node of a test.
#[derive(Clone)]
pub struct TestNet {
    pub config: ChainConfig,
    pub genesis: GenesisConfig,
}

impl TestNet {
    /// `producers` generated producers, default chain configuration.
    pub fn new(producers: u32) -> Self {
        Self::with_config(producers, ChainConfig::default())
    }

    pub fn with_config(producers: u32, config: ChainConfig) -> Self {
        Self {
            config,
            genesis: GenesisConfig::devnet(producers, "integration"),
        }
    }

    /// Node over in-memory adapters.
    pub fn open_node(&self) -> Node {
        self.open_node_with_log(Box::new(MemoryBlockLog::new()))
            .expect("fresh node opens")
    }

    /// Node over a fresh state database and the given block log.
    pub fn open_node_with_log(&self, block_log: Box<dyn BlockLog>) -> ControllerResult<Node> {
        let bus = Arc::new(SignalBus::new());
        let controller = Controller::open(
            self.config.clone(),
            &self.genesis,
            ControllerDeps {
                state_db: Box::new(MemoryStateDb::new()),
                block_log,
                bus: bus.clone(),
                dispatcher: dispatcher(),
            },
        )?;
        Ok(Node { controller, bus })
    }

    /// The `index`-th genesis producer.
    pub fn producer(&self, index: u32) -> Name {
        GenesisConfig::producer_name(index).expect("producer name")
    }

    pub fn key(&self, producer: Name) -> PrivateKey {
        self.genesis
            .producer_private_key(producer)
            .expect("derived key")
    }

    pub fn producer_key(&self, index: u32) -> ProducerKey {
        let producer_name = self.producer(index);
        ProducerKey {
            producer_name,
            block_signing_key: self.key(producer_name).public_key(),
        }
    }

    /// Produce on `node` in the next slot.
    pub fn produce(&self, node: &mut Node) -> Arc<BlockState> {
        let producer = node
            .controller
            .start_pending_block(None)
            .expect("pending block")
            .producer();
        node.controller
            .sign_block(&self.key(producer))
            .expect("signed block")
    }

    /// Produce on `node` in `slot`.
    pub fn produce_at(&self, node: &mut Node, slot: u32) -> Arc<BlockState> {
        let producer = node
            .controller
            .start_pending_block(Some(BlockTimestamp::from_slot(slot)))
            .expect("pending block")
            .producer();
        node.controller
            .sign_block(&self.key(producer))
            .expect("signed block")
    }

    /// `producer`'s confirmation of `state`.
    pub fn confirm(&self, state: &BlockState, producer: Name) -> HeaderConfirmation {
        HeaderConfirmation {
            block_id: state.id(),
            producer,
            producer_signature: sign(&self.key(producer), &state.header_state.sig_digest())
                .expect("signature"),
        }
    }
}

/// Owned copies of the blocks in `states`.
pub fn blocks_of(states: &[Arc<BlockState>]) -> Vec<SignedBlock> {
    states.iter().map(|s| s.block.as_ref().clone()).collect()
}
