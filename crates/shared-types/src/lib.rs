//! # Shared Types Crate
//!
//! Wire entities shared by the Delegate-Chain subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every structure that crosses a subsystem
//!   boundary or ends up hashed is defined here.
//! - **Fixed Field Order**: structs encode with `bincode` in declaration
//!   order. Reordering a field of [`BlockHeader`] changes every block id.
//! - **Value Semantics**: names, ids and timestamps are `Copy` newtypes.

pub mod block;
pub mod encoding;
pub mod errors;
pub mod names;
pub mod schedule;
pub mod timestamp;
pub mod trace;
pub mod transaction;

pub use block::*;
pub use encoding::{canonical_bytes, decode, encode, encoded_size};
pub use errors::*;
pub use names::Name;
pub use schedule::{ProducerKey, ProducerSchedule};
pub use timestamp::{BlockTimestamp, TimePointSec, BLOCK_INTERVAL_MS, BLOCK_TIMESTAMP_EPOCH_MS};
pub use trace::*;
pub use transaction::*;

pub use shared_crypto::{Digest, PublicKey, Signature};
