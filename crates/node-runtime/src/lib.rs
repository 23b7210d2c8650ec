//! # Node Runtime Library
//!
//! Pieces of the node binary exposed for testing.
//!
//! - `config`: `NodeConfig` and its `DC_*` environment overrides
//! - `producer`: decides whether a local producer owns the current slot and
//!   builds the block
//! - `runtime`: opens the controller and runs the production and status
//!   loops

pub mod config;
pub mod producer;
pub mod runtime;

pub use config::NodeConfig;
pub use producer::BlockProducer;
pub use runtime::NodeRuntime;
