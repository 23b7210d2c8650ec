//! # Producer Schedule
//!
//! Ordered list of block producers and their signing keys, tagged with a
//! version that increases by exactly one per accepted change.

use crate::encoding::canonical_bytes;
use crate::errors::TypeError;
use crate::names::Name;
use serde::{Deserialize, Serialize};
use shared_crypto::{sha256, Digest, PublicKey};
use std::collections::HashSet;

/// A producer and the key that must sign its blocks.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProducerKey {
    /// Producer account.
    pub producer_name: Name,
    /// Block signing key.
    pub block_signing_key: PublicKey,
}

/// Versioned, ordered producer list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProducerSchedule {
    /// Monotonic schedule version.
    pub version: u32,
    /// Producers in rotation order.
    pub producers: Vec<ProducerKey>,
}

impl ProducerSchedule {
    /// Create a schedule.
    pub fn new(version: u32, producers: Vec<ProducerKey>) -> Self {
        Self { version, producers }
    }

    /// Number of producers.
    pub fn len(&self) -> usize {
        self.producers.len()
    }

    /// Whether the schedule has no producers.
    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }

    /// Signing key registered for `producer`.
    pub fn get_producer_key(&self, producer: Name) -> Option<PublicKey> {
        self.producers
            .iter()
            .find(|p| p.producer_name == producer)
            .map(|p| p.block_signing_key)
    }

    /// Whether `producer` is part of this schedule.
    pub fn contains(&self, producer: Name) -> bool {
        self.get_producer_key(producer).is_some()
    }

    /// Digest of the canonical encoding.
    pub fn digest(&self) -> Digest {
        sha256(canonical_bytes(self))
    }

    /// Structural checks applied to proposed schedules.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.producers.is_empty() {
            return Err(TypeError::EmptySchedule);
        }

        let mut seen = HashSet::with_capacity(self.producers.len());
        for p in &self.producers {
            if p.producer_name.is_empty() {
                return Err(TypeError::EmptyProducerName);
            }
            if p.block_signing_key.is_null() {
                return Err(TypeError::NullSigningKey(p.producer_name));
            }
            if !seen.insert(p.producer_name) {
                return Err(TypeError::DuplicateProducer(p.producer_name));
            }
        }
        Ok(())
    }
}
