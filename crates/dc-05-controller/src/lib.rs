//! # DC-05: Controller
//!
//! Drives the chain: opens or replays it, produces blocks, applies blocks
//! from peers, switches forks and advances irreversibility.
//!
//! ## Architecture
//!
//! - **Domain**: `ForkDatabase`, genesis resolution, error taxonomy
//! - **Ports**: `StateDatabase` (tables with nested undo sessions) and
//!   `BlockLog` (append-only irreversible blocks)
//! - **Adapters**: `MemoryStateDb`, `MemoryBlockLog`, `FileBlockLog`
//! - **Execution**: `ActionDispatcher` mapping `(account, action)` to
//!   handlers, `ApplyContext` enforcing declared scopes, the built-in
//!   `onblock` and `setprods` actions
//! - **Controller**: pending block lifecycle and block application
//!
//! ## Signals
//!
//! Every transition is announced on the shared signal bus, per object in
//! lifecycle order:
//!
//! ```text
//! TransactionAdded → TransactionValidated → TransactionConfirmed
//!                  ↘ TransactionRejected
//! BlockLinked → BlockValidated → BlockConfirmed
//! ```
//!
//! ## Execution Order
//!
//! Blocks execute region by region, cycle by cycle, shard by shard. Shards
//! of one cycle touch disjoint scopes, but this controller runs them in
//! sequence.

pub mod adapters;
pub mod config;
pub mod controller;
pub mod domain;
pub mod execution;
mod layout;
pub mod ports;

#[cfg(test)]
mod test_utils;

pub use adapters::{FileBlockLog, MemoryBlockLog, MemoryStateDb};
pub use config::ChainConfig;
pub use controller::{Controller, ControllerDeps};
pub use domain::errors::{
    BlockLogError, ControllerError, ControllerResult, ErrorKind, ExecutionError, ExecutionResult,
    ForkDbError, StateDbError,
};
pub use domain::fork_database::ForkDatabase;
pub use domain::genesis::{GenesisConfig, GenesisState, GlobalState};
pub use execution::{ActionDispatcher, ActionHandler, ApplyContext, BlockContext, TransactionOutcome};
pub use ports::{BlockLog, PrimaryKey, StateDatabase, TableId};
