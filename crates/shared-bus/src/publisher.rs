//! # Signal Publisher
//!
//! Publishing side of the signal bus.

use crate::events::{ChainSignal, SignalFilter};
use crate::subscriber::{SignalStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Sink for controller signals.
///
/// Publishing is fire-and-forget: it never blocks and never fails the caller.
pub trait SignalPublisher: Send + Sync {
    /// Publish a signal; returns the number of subscribers it reached.
    fn publish(&self, signal: ChainSignal) -> usize;

    /// Total signals published.
    fn signals_published(&self) -> u64;
}

/// In-memory signal bus over `tokio::sync::broadcast`.
pub struct SignalBus {
    sender: broadcast::Sender<ChainSignal>,
    signals_published: AtomicU64,
    capacity: usize,
}

impl SignalBus {
    /// Create a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus buffering up to `capacity` signals per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            signals_published: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to signals matching a filter.
    ///
    /// Only signals published after this call are delivered.
    #[must_use]
    pub fn subscribe(&self, filter: SignalFilter) -> Subscription {
        debug!(kinds = ?filter.kinds, "New signal subscription");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Subscribe as a `Stream`.
    #[must_use]
    pub fn signal_stream(&self, filter: SignalFilter) -> SignalStream {
        SignalStream::new(self.sender.subscribe(), filter)
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalPublisher for SignalBus {
    fn publish(&self, signal: ChainSignal) -> usize {
        let kind = signal.kind();
        self.signals_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(signal) {
            Ok(receivers) => {
                trace!(kind = ?kind, receivers, "Signal published");
                receivers
            }
            Err(_) => {
                // No subscribers; nothing to deliver.
                trace!(kind = ?kind, "Signal published without subscribers");
                0
            }
        }
    }

    fn signals_published(&self) -> u64 {
        self.signals_published.load(Ordering::Relaxed)
    }
}
