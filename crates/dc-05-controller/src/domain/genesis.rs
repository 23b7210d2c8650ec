//! # Genesis
//!
//! Resolves a [`GenesisConfig`] into the initial producer schedule and chain
//! id, and seeds the system tables of a fresh state database.
//!
//! When no explicit producer list is configured, `initial_producer_count`
//! producers named `produceraa`, `producerab`, ... are generated, each with
//! a key derived from `key_seed` and its name.

use crate::domain::errors::{ControllerError, ControllerResult};
use crate::execution::system::{system_table, GLOBAL_TABLE, PRODUCERS_TABLE};
use crate::ports::state_db::StateDatabase;
use serde::{Deserialize, Serialize};
use shared_crypto::{sha256_many, CryptoError, Digest, PrivateKey};
use shared_types::{canonical_bytes, BlockTimestamp, Name, ProducerKey, ProducerSchedule};

/// Default size of the generated initial producer list.
pub const DEFAULT_INITIAL_PRODUCER_COUNT: u32 = 21;

/// Most producers the generated naming scheme can name.
const MAX_GENERATED_PRODUCERS: u32 = 26 * 26;

/// Genesis configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    /// Timestamp of block 1.
    pub initial_timestamp: BlockTimestamp,
    /// Size of the generated producer list.
    pub initial_producer_count: u32,
    /// Seed for generated producer keys.
    pub key_seed: String,
    /// Explicit producer list; overrides the generated one when non-empty.
    pub producers: Vec<ProducerKey>,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            initial_timestamp: BlockTimestamp::from_slot(0),
            initial_producer_count: DEFAULT_INITIAL_PRODUCER_COUNT,
            key_seed: "delegate-chain".to_string(),
            producers: Vec::new(),
        }
    }
}

impl GenesisConfig {
    /// Development chain with `count` generated producers.
    pub fn devnet(count: u32, key_seed: impl Into<String>) -> Self {
        Self {
            initial_producer_count: count,
            key_seed: key_seed.into(),
            ..Default::default()
        }
    }

    /// Name of the `index`-th generated producer.
    pub fn producer_name(index: u32) -> ControllerResult<Name> {
        if index >= MAX_GENERATED_PRODUCERS {
            return Err(ControllerError::InvalidConfig(format!(
                "cannot generate more than {MAX_GENERATED_PRODUCERS} producer names"
            )));
        }
        let first = char::from(b'a' + (index / 26) as u8);
        let second = char::from(b'a' + (index % 26) as u8);
        Ok(Name::new(&format!("producer{first}{second}"))?)
    }

    /// Signing key of a generated producer.
    pub fn producer_private_key(&self, producer: Name) -> Result<PrivateKey, CryptoError> {
        PrivateKey::from_seed(&format!("{}/{}", self.key_seed, producer))
    }

    /// Reject configurations that cannot produce a schedule.
    pub fn validate(&self) -> ControllerResult<()> {
        if self.producers.is_empty() {
            if self.initial_producer_count == 0 {
                return Err(ControllerError::InvalidConfig(
                    "initial_producer_count must be at least 1".into(),
                ));
            }
            if self.initial_producer_count > MAX_GENERATED_PRODUCERS {
                return Err(ControllerError::InvalidConfig(format!(
                    "initial_producer_count {} exceeds {MAX_GENERATED_PRODUCERS}",
                    self.initial_producer_count
                )));
            }
        }
        Ok(())
    }

    /// Resolve into the genesis state.
    pub fn build(&self) -> ControllerResult<GenesisState> {
        self.validate()?;

        let producers = if self.producers.is_empty() {
            (0..self.initial_producer_count)
                .map(|i| {
                    let producer_name = Self::producer_name(i)?;
                    let key = self.producer_private_key(producer_name)?;
                    Ok(ProducerKey {
                        producer_name,
                        block_signing_key: key.public_key(),
                    })
                })
                .collect::<ControllerResult<Vec<_>>>()?
        } else {
            self.producers.clone()
        };

        let schedule = ProducerSchedule::new(0, producers);
        schedule.validate()?;

        let chain_id = sha256_many(&[
            &self.initial_timestamp.slot().to_le_bytes(),
            schedule.digest().as_bytes(),
        ]);

        Ok(GenesisState {
            initial_timestamp: self.initial_timestamp,
            initial_schedule: schedule,
            chain_id,
        })
    }
}

/// Initial chain parameters derived from a [`GenesisConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisState {
    pub initial_timestamp: BlockTimestamp,
    pub initial_schedule: ProducerSchedule,
    pub chain_id: Digest,
}

/// Row 0 of the `global` system table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalState {
    pub chain_id: Digest,
    pub initial_timestamp: BlockTimestamp,
    pub initial_schedule_version: u32,
}

impl GenesisState {
    /// Write the global row and the initial producer list.
    pub fn seed(&self, db: &mut dyn StateDatabase) {
        let global = GlobalState {
            chain_id: self.chain_id,
            initial_timestamp: self.initial_timestamp,
            initial_schedule_version: self.initial_schedule.version,
        };
        db.put(&system_table(GLOBAL_TABLE), 0, canonical_bytes(&global));
        db.put(
            &system_table(PRODUCERS_TABLE),
            0,
            canonical_bytes(&self.initial_schedule.producers),
        );
    }
}
