//! # Signal Subscriber
//!
//! Receiving side of the signal bus.

use crate::events::{ChainSignal, SignalFilter};
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::warn;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped.
    #[error("Signal bus closed")]
    Closed,
}

/// A subscription handle.
pub struct Subscription {
    receiver: broadcast::Receiver<ChainSignal>,
    filter: SignalFilter,
    lagged: u64,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<ChainSignal>, filter: SignalFilter) -> Self {
        Self {
            receiver,
            filter,
            lagged: 0,
        }
    }

    /// Receive the next matching signal; `None` once the bus is dropped.
    pub async fn recv(&mut self) -> Option<ChainSignal> {
        loop {
            match self.receiver.recv().await {
                Ok(signal) if self.filter.matches(&signal) => return Some(signal),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => self.on_lag(count),
            }
        }
    }

    /// Receive the next matching signal without waiting.
    pub fn try_recv(&mut self) -> Result<Option<ChainSignal>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(signal) if self.filter.matches(&signal) => return Ok(Some(signal)),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(count)) => self.on_lag(count),
            }
        }
    }

    /// Drain every matching signal currently buffered.
    pub fn drain(&mut self) -> Vec<ChainSignal> {
        let mut out = Vec::new();
        while let Ok(Some(signal)) = self.try_recv() {
            out.push(signal);
        }
        out
    }

    /// Signals lost to lagging so far.
    #[must_use]
    pub fn lagged(&self) -> u64 {
        self.lagged
    }

    /// Subscription filter.
    #[must_use]
    pub fn filter(&self) -> &SignalFilter {
        &self.filter
    }

    fn on_lag(&mut self, count: u64) {
        self.lagged += count;
        warn!(lost = count, "Signal subscriber lagged");
    }
}

/// `Stream` of matching signals; lag gaps are skipped.
pub struct SignalStream {
    inner: BroadcastStream<ChainSignal>,
    filter: SignalFilter,
}

impl SignalStream {
    pub(crate) fn new(receiver: broadcast::Receiver<ChainSignal>, filter: SignalFilter) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
            filter,
        }
    }
}

impl Stream for SignalStream {
    type Item = ChainSignal;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(signal))) => {
                    if self.filter.matches(&signal) {
                        return Poll::Ready(Some(signal));
                    }
                }
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(count)))) => {
                    warn!(lost = count, "Signal stream lagged");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
