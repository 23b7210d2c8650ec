//! # Node Configuration
//!
//! Chain parameters, genesis, the local producers and where the block log
//! lives. Every field has a development default; `DC_*` environment
//! variables override them.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `DC_DATA_DIR` | `data_dir` |
//! | `DC_PRODUCERS` | `producers` (comma separated) |
//! | `DC_SIGNING_KEY` | `signing_key` (64 hex chars) |
//! | `DC_GENESIS_PRODUCERS` | `genesis.initial_producer_count` |
//! | `DC_KEY_SEED` | `genesis.key_seed` |
//! | `DC_PRODUCER_REPETITIONS` | `chain.producer_repetitions` |
//! | `DC_MAX_PENDING_TRANSACTIONS` | `chain.max_pending_transactions` |
//! | `DC_STATUS_INTERVAL_SECS` | `status_interval_secs` |

use anyhow::{bail, Context, Result};
use dc_05_controller::{ChainConfig, GenesisConfig};
use shared_crypto::PrivateKey;
use shared_types::Name;
use std::path::PathBuf;
use std::str::FromStr;

/// File name of the block log inside `data_dir`.
pub const BLOCK_LOG_FILE: &str = "blocks.log";

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Consensus parameters and limits.
    pub chain: ChainConfig,
    /// Genesis used when the block log is empty.
    pub genesis: GenesisConfig,
    /// Producers this node signs for.
    pub producers: Vec<Name>,
    /// Key for every local producer. Without one, keys are derived from
    /// the genesis key seed (development chains only).
    pub signing_key: Option<PrivateKey>,
    /// Directory holding the block log.
    pub data_dir: PathBuf,
    /// Seconds between status lines.
    pub status_interval_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            genesis: GenesisConfig::default(),
            producers: Vec::new(),
            signing_key: None,
            data_dir: PathBuf::from("./data"),
            status_interval_secs: 10,
        }
    }
}

impl NodeConfig {
    /// Defaults overridden from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("DC_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(list) = lookup("DC_PRODUCERS") {
            config.producers = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Name::new(s).with_context(|| format!("invalid producer name {s:?}")))
                .collect::<Result<_>>()?;
        }
        if let Some(hex) = lookup("DC_SIGNING_KEY") {
            let key = PrivateKey::from_hex(hex.trim()).context("DC_SIGNING_KEY is not a valid key")?;
            config.signing_key = Some(key);
        }
        if let Some(seed) = lookup("DC_KEY_SEED") {
            config.genesis.key_seed = seed;
        }

        parse_into(&lookup, "DC_GENESIS_PRODUCERS", &mut config.genesis.initial_producer_count)?;
        parse_into(&lookup, "DC_PRODUCER_REPETITIONS", &mut config.chain.producer_repetitions)?;
        parse_into(
            &lookup,
            "DC_MAX_PENDING_TRANSACTIONS",
            &mut config.chain.max_pending_transactions,
        )?;
        parse_into(&lookup, "DC_STATUS_INTERVAL_SECS", &mut config.status_interval_secs)?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the node cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.chain.validate().context("invalid chain configuration")?;
        self.genesis.validate().context("invalid genesis configuration")?;
        if self.status_interval_secs == 0 {
            bail!("status_interval_secs must be positive");
        }
        Ok(())
    }

    /// Path of the block log.
    pub fn block_log_path(&self) -> PathBuf {
        self.data_dir.join(BLOCK_LOG_FILE)
    }

    /// Signing key of a local producer.
    pub fn producer_key(&self, producer: Name) -> Result<PrivateKey> {
        match &self.signing_key {
            Some(key) => Ok(key.clone()),
            None => self
                .genesis
                .producer_private_key(producer)
                .with_context(|| format!("cannot derive key for {producer}")),
        }
    }
}

fn parse_into<F, T>(lookup: &F, key: &str, target: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Some(raw) = lookup(key) {
        *target = raw
            .trim()
            .parse()
            .with_context(|| format!("{key}={raw:?} is not valid"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = NodeConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.producers.is_empty());
        assert!(config.signing_key.is_none());
        assert_eq!(config.chain, ChainConfig::default());
        assert_eq!(config.block_log_path(), PathBuf::from("./data").join(BLOCK_LOG_FILE));
    }

    #[test]
    fn test_environment_overrides() {
        let key = PrivateKey::from_seed("node").unwrap();
        let key_hex = hex::encode(key.to_bytes());
        let config = NodeConfig::from_lookup(lookup(&[
            ("DC_DATA_DIR", "/var/lib/dc"),
            ("DC_PRODUCERS", "produceraa, producerab"),
            ("DC_SIGNING_KEY", &key_hex),
            ("DC_GENESIS_PRODUCERS", "4"),
            ("DC_PRODUCER_REPETITIONS", "6"),
        ]))
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/dc"));
        assert_eq!(config.producers.len(), 2);
        assert_eq!(config.producers[1], Name::new("producerab").unwrap());
        assert_eq!(config.genesis.initial_producer_count, 4);
        assert_eq!(config.chain.producer_repetitions, 6);
        assert_eq!(
            config.producer_key(config.producers[0]).unwrap().public_key(),
            key.public_key()
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(NodeConfig::from_lookup(lookup(&[("DC_PRODUCER_REPETITIONS", "zero")])).is_err());
        assert!(NodeConfig::from_lookup(lookup(&[("DC_PRODUCER_REPETITIONS", "0")])).is_err());
        assert!(NodeConfig::from_lookup(lookup(&[("DC_SIGNING_KEY", "abcd")])).is_err());
        assert!(NodeConfig::from_lookup(lookup(&[("DC_GENESIS_PRODUCERS", "0")])).is_err());
    }

    #[test]
    fn test_derived_keys_follow_genesis_seed() {
        let config = NodeConfig::default();
        let name = Name::new("produceraa").unwrap();
        assert_eq!(
            config.producer_key(name).unwrap().public_key(),
            config.genesis.producer_private_key(name).unwrap().public_key()
        );
    }
}
