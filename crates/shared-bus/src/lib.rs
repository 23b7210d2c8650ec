//! # Shared Bus - Controller Signals
//!
//! The controller announces block and transaction lifecycle transitions on an
//! in-process broadcast bus. Network and RPC layers subscribe; the controller
//! never waits on them.
//!
//! ```text
//! ┌──────────────┐  publish()   ┌──────────────┐  subscribe()  ┌──────────┐
//! │  Controller  │ ───────────▶ │  Signal Bus  │ ────────────▶ │ net/rpc  │
//! └──────────────┘   (sync)     └──────────────┘    (async)    └──────────┘
//! ```
//!
//! ## Ordering
//!
//! Per object, signals are published in lifecycle order:
//! `TransactionAdded → TransactionValidated → TransactionConfirmed` (or
//! `TransactionRejected`), and `BlockLinked → BlockValidated →
//! BlockConfirmed`. A single broadcast channel preserves that order for
//! every subscriber.
//!
//! ## Back-pressure
//!
//! Publishing never blocks. A subscriber that falls more than the channel
//! capacity behind skips the oldest signals and is told how many it lost.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{ChainSignal, SignalFilter, SignalKind};
pub use publisher::{SignalBus, SignalPublisher};
pub use subscriber::{SignalStream, Subscription, SubscriptionError};

/// Maximum signals buffered per subscriber before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
