//! Domain layer: errors, fork database and genesis.

pub mod errors;
pub mod fork_database;
pub mod genesis;

pub use errors::*;
pub use fork_database::ForkDatabase;
pub use genesis::{GenesisConfig, GenesisState, GlobalState};
