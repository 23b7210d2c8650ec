//! # Block Producer
//!
//! Decides, slot by slot, whether one of the local producers is scheduled
//! and if so builds and signs the block.

use anyhow::Result;
use dc_03_block_state::BlockState;
use dc_05_controller::{Controller, ControllerResult};
use shared_crypto::PrivateKey;
use shared_types::{BlockTimestamp, Name};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::NodeConfig;

/// Local producers and their signing keys.
#[derive(Debug, Clone, Default)]
pub struct BlockProducer {
    keys: BTreeMap<Name, PrivateKey>,
}

impl BlockProducer {
    /// Producer set for the producers named in `config`.
    pub fn from_config(config: &NodeConfig) -> Result<Self> {
        let keys = config
            .producers
            .iter()
            .map(|&name| Ok((name, config.producer_key(name)?)))
            .collect::<Result<_>>()?;
        Ok(Self { keys })
    }

    /// Add or replace a local producer.
    pub fn insert(&mut self, producer: Name, key: PrivateKey) {
        self.keys.insert(producer, key);
    }

    /// Whether no local producer is configured.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Local producer names.
    pub fn producers(&self) -> impl Iterator<Item = &Name> {
        self.keys.keys()
    }

    /// Produce the block for the slot of `now` if a local producer owns it.
    ///
    /// Returns `None` when the head already occupies that slot, when the
    /// slot belongs to someone else, or when the local key no longer matches
    /// the scheduled one. A block that cannot be signed is aborted and its
    /// transactions stay queued.
    pub fn maybe_produce(
        &self,
        controller: &mut Controller,
        now: BlockTimestamp,
    ) -> ControllerResult<Option<Arc<BlockState>>> {
        if now <= controller.head_block_time() {
            return Ok(None);
        }

        let scheduled = controller.scheduled_producer(now)?;
        let Some(key) = self.keys.get(&scheduled.producer_name) else {
            debug!(slot = now.slot(), producer = %scheduled.producer_name, "Slot owned by remote producer");
            return Ok(None);
        };
        if key.public_key() != scheduled.block_signing_key {
            warn!(
                producer = %scheduled.producer_name,
                scheduled_key = %scheduled.block_signing_key,
                "Local key does not match the schedule, skipping slot"
            );
            return Ok(None);
        }

        controller.start_pending_block(Some(now))?;
        match controller.sign_block(key) {
            Ok(state) => Ok(Some(state)),
            Err(err) => {
                controller.abort_pending_block()?;
                Err(err)
            }
        }
    }
}
