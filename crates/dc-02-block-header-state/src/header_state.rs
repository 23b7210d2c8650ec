//! # Block Header State
//!
//! Everything consensus needs to know after block N is appended.
//!
//! ## Invariants
//!
//! - `pending_schedule`, when present, has version `active_schedule.version + 1`.
//! - `bft_irreversible_blocknum >= dpos_irreversible_blocknum` after every
//!   transition.
//! - `blockroot_merkle` holds the ids of every block before this one.
//! - `id` is the id of `header`; methods that touch the header refresh it.

use crate::config::ConsensusParams;
use crate::error::{HeaderStateError, HeaderStateResult};
use crate::irreversibility::calc_dpos_last_irreversible;
use dc_01_producer_schedule::get_slot_time;
use serde::{Deserialize, Serialize};
use shared_crypto::{
    recover, sha256_many, CryptoError, Digest, IncrementalMerkle, PrivateKey, PublicKey,
    Signature,
};
use shared_types::{
    BlockHeader, BlockId, BlockNum, BlockTimestamp, HeaderConfirmation, Name, ProducerKey,
    ProducerSchedule, SignedBlockHeader,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Chain metadata after a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeaderState {
    /// Id of `header`.
    pub id: BlockId,
    /// Number of `header`.
    pub block_num: BlockNum,
    /// The signed header this state describes.
    pub header: SignedBlockHeader,
    /// LIB derived from producer statistics.
    pub dpos_irreversible_blocknum: BlockNum,
    /// LIB from confirmations; never below the DPoS LIB.
    pub bft_irreversible_blocknum: BlockNum,
    /// Block in which the pending schedule was proposed.
    pub pending_schedule_lib_num: BlockNum,
    /// Digest of the most recently proposed schedule.
    pub pending_schedule_hash: Digest,
    /// Schedule waiting for its proposing block to become irreversible.
    pub pending_schedule: Option<ProducerSchedule>,
    /// Schedule producers are currently taken from.
    pub active_schedule: ProducerSchedule,
    /// Accumulator over the ids of all prior blocks.
    pub blockroot_merkle: IncrementalMerkle,
    /// Last block number produced by each active producer.
    pub producer_to_last_produced: BTreeMap<Name, BlockNum>,
    /// Key the header must be signed with.
    pub block_signing_key: PublicKey,
    /// Producer endorsements of this block.
    pub confirmations: Vec<HeaderConfirmation>,
    /// Consensus parameters.
    pub params: ConsensusParams,
}

impl BlockHeaderState {
    /// State for the first block of a chain.
    ///
    /// Block 1 is unsigned; its action Merkle root carries the chain id.
    /// Every initial producer starts with block 1 as its last produced block,
    /// so irreversibility starts at 1 and only advances once a quorum of
    /// producers has actually produced.
    pub fn genesis(
        params: ConsensusParams,
        initial_schedule: ProducerSchedule,
        timestamp: BlockTimestamp,
        chain_id: Digest,
    ) -> HeaderStateResult<Self> {
        params.validate()?;
        initial_schedule.validate()?;

        let header = BlockHeader {
            previous: BlockId::default(),
            timestamp,
            action_mroot: chain_id,
            schedule_version: initial_schedule.version,
            ..Default::default()
        };
        let id = header.id();
        let block_num = header.block_num();

        let producer_to_last_produced = initial_schedule
            .producers
            .iter()
            .map(|p| (p.producer_name, block_num))
            .collect();

        Ok(Self {
            id,
            block_num,
            header: SignedBlockHeader {
                header,
                producer_signature: Signature::default(),
            },
            dpos_irreversible_blocknum: block_num,
            bft_irreversible_blocknum: block_num,
            pending_schedule_lib_num: 0,
            pending_schedule_hash: Digest::ZERO,
            pending_schedule: None,
            active_schedule: initial_schedule,
            blockroot_merkle: IncrementalMerkle::new(),
            producer_to_last_produced,
            block_signing_key: PublicKey::default(),
            confirmations: Vec::new(),
            params,
        })
    }

    /// Header timestamp.
    pub fn timestamp(&self) -> BlockTimestamp {
        self.header.header.timestamp
    }

    /// Producer of this block.
    pub fn producer(&self) -> Name {
        self.header.header.producer
    }

    /// Effective last irreversible block.
    pub fn last_irreversible_blocknum(&self) -> BlockNum {
        self.dpos_irreversible_blocknum
            .max(self.bft_irreversible_blocknum)
    }

    /// Timestamp `offset` slots after this block.
    pub fn get_slot_time(&self, offset: u32) -> HeaderStateResult<BlockTimestamp> {
        Ok(get_slot_time(self.timestamp(), offset)?)
    }

    /// Slots between this block and `t` (0 if `t` is not in the future).
    pub fn get_slot_at_time(&self, t: BlockTimestamp) -> u32 {
        dc_01_producer_schedule::get_slot_at_time(self.timestamp(), t)
    }

    /// Producer the active schedule assigns to the slot of `t`.
    pub fn get_scheduled_producer(
        &self,
        t: BlockTimestamp,
    ) -> HeaderStateResult<&ProducerKey> {
        let rotation = self.params.rotation()?;
        Ok(rotation.get_scheduled_producer(&self.active_schedule, t)?)
    }

    /// DPoS LIB from this state's last-produced map.
    pub fn calc_dpos_last_irreversible(&self) -> BlockNum {
        calc_dpos_last_irreversible(
            self.producer_to_last_produced.values().copied(),
            self.params.irreversible_threshold_percent,
        )
    }

    /// Template for the block after this one, in the slot of `when` (or the
    /// next slot when `None`).
    ///
    /// The template has zero transaction and action Merkle roots, no
    /// signature and no proposed schedule; its `id` reflects that and is
    /// refreshed by the methods that fill those in.
    pub fn generate_next(&self, when: Option<BlockTimestamp>) -> HeaderStateResult<Self> {
        let when = match when {
            Some(t) if t <= self.timestamp() => {
                return Err(HeaderStateError::TimestampNotIncreasing {
                    current: self.timestamp(),
                    proposed: t,
                })
            }
            Some(t) => t,
            None => self.get_slot_time(1)?,
        };

        let prokey = self.get_scheduled_producer(when)?.clone();
        let block_num = self
            .block_num
            .checked_add(1)
            .ok_or(HeaderStateError::BlockNumOverflow)?;

        let mut producer_to_last_produced = self.producer_to_last_produced.clone();
        producer_to_last_produced.insert(prokey.producer_name, block_num);

        let mut blockroot_merkle = self.blockroot_merkle.clone();
        blockroot_merkle.append(self.id.digest());

        let header = BlockHeader {
            previous: self.id,
            timestamp: when,
            transaction_mroot: Digest::ZERO,
            action_mroot: Digest::ZERO,
            block_mroot: blockroot_merkle.root(),
            producer: prokey.producer_name,
            schedule_version: self.active_schedule.version,
            new_producers: None,
        };

        let mut result = Self {
            id: BlockId::default(),
            block_num,
            header: SignedBlockHeader {
                header,
                producer_signature: Signature::default(),
            },
            dpos_irreversible_blocknum: 0,
            bft_irreversible_blocknum: 0,
            pending_schedule_lib_num: self.pending_schedule_lib_num,
            pending_schedule_hash: self.pending_schedule_hash,
            pending_schedule: self.pending_schedule.clone(),
            active_schedule: self.active_schedule.clone(),
            blockroot_merkle,
            producer_to_last_produced,
            block_signing_key: prokey.block_signing_key,
            confirmations: Vec::new(),
            params: self.params,
        };

        result.dpos_irreversible_blocknum = result.calc_dpos_last_irreversible();
        result.bft_irreversible_blocknum = self
            .bft_irreversible_blocknum
            .max(result.dpos_irreversible_blocknum);

        result.promote_pending_schedule();
        result.refresh_id();

        debug!(
            block_num,
            producer = %prokey.producer_name,
            slot = when.slot(),
            dpos_lib = result.dpos_irreversible_blocknum,
            "Generated next header state"
        );
        Ok(result)
    }

    /// Promote the pending schedule once its proposing block is irreversible.
    ///
    /// Producers carried over keep their last-produced number; producers new
    /// to the schedule start at the current DPoS LIB.
    fn promote_pending_schedule(&mut self) {
        let ready = matches!(
            &self.pending_schedule,
            Some(pending)
                if !pending.is_empty()
                    && self.dpos_irreversible_blocknum >= self.pending_schedule_lib_num
        );
        if !ready {
            return;
        }
        let Some(pending) = self.pending_schedule.take() else {
            return;
        };

        let lib = self.dpos_irreversible_blocknum;
        let rebuilt = pending
            .producers
            .iter()
            .map(|p| {
                let last = self
                    .producer_to_last_produced
                    .get(&p.producer_name)
                    .copied()
                    .unwrap_or(lib);
                (p.producer_name, last)
            })
            .collect();

        info!(
            block_num = self.block_num,
            old_version = self.active_schedule.version,
            new_version = pending.version,
            producers = pending.len(),
            "Promoting pending producer schedule"
        );

        self.producer_to_last_produced = rebuilt;
        self.active_schedule = pending;
    }

    /// Validate `h` against the template for its slot and return the state
    /// it produces.
    pub fn next(&self, h: &SignedBlockHeader) -> HeaderStateResult<Self> {
        let proposed = &h.header;
        if proposed.timestamp <= self.timestamp() {
            return Err(HeaderStateError::TimestampNotIncreasing {
                current: self.timestamp(),
                proposed: proposed.timestamp,
            });
        }
        if proposed.previous != self.id {
            return Err(HeaderStateError::UnlinkableHeader {
                expected: self.id,
                actual: proposed.previous,
            });
        }

        let mut result = self.generate_next(Some(proposed.timestamp))?;

        if result.header.header.producer != proposed.producer {
            return Err(HeaderStateError::WrongProducer {
                expected: result.header.header.producer,
                actual: proposed.producer,
            });
        }
        if result.header.header.schedule_version != proposed.schedule_version {
            return Err(HeaderStateError::WrongScheduleVersion {
                expected: result.header.header.schedule_version,
                actual: proposed.schedule_version,
            });
        }
        if result.header.header.block_mroot != proposed.block_mroot {
            return Err(HeaderStateError::BlockMrootMismatch);
        }

        if let Some(new_producers) = &proposed.new_producers {
            result.set_new_producers(new_producers.clone())?;
        }

        result.header.header.action_mroot = proposed.action_mroot;
        result.header.header.transaction_mroot = proposed.transaction_mroot;
        result.header.producer_signature = h.producer_signature;
        result.refresh_id();

        let signee = result.signee()?;
        if signee != result.block_signing_key {
            return Err(HeaderStateError::WrongSigningKey {
                expected: result.block_signing_key,
                actual: signee,
            });
        }

        Ok(result)
    }

    /// Queue `pending` as the next schedule, proposed by this block.
    pub fn set_new_producers(&mut self, pending: ProducerSchedule) -> HeaderStateResult<()> {
        pending.validate()?;

        let expected = self.active_schedule.version.wrapping_add(1);
        if pending.version != expected {
            return Err(HeaderStateError::WrongPendingVersion {
                expected,
                actual: pending.version,
            });
        }
        if let Some(existing) = &self.pending_schedule {
            return Err(HeaderStateError::PendingScheduleExists {
                version: existing.version,
            });
        }

        info!(
            block_num = self.block_num,
            version = pending.version,
            producers = pending.len(),
            "New producer schedule proposed"
        );

        self.pending_schedule_hash = pending.digest();
        self.pending_schedule_lib_num = self.block_num;
        self.header.header.new_producers = Some(pending.clone());
        self.pending_schedule = Some(pending);
        self.refresh_id();
        Ok(())
    }

    /// Fill in the body Merkle roots of a template.
    pub fn set_body_roots(&mut self, transaction_mroot: Digest, action_mroot: Digest) {
        self.header.header.transaction_mroot = transaction_mroot;
        self.header.header.action_mroot = action_mroot;
        self.refresh_id();
    }

    /// Digest the producer signs: binds the header to the fork's block-id
    /// accumulator and to the pending schedule.
    pub fn sig_digest(&self) -> Digest {
        let header_bmroot = sha256_many(&[
            self.header.header.digest().as_bytes(),
            self.blockroot_merkle.root().as_bytes(),
        ]);
        sha256_many(&[header_bmroot.as_bytes(), self.pending_schedule_hash.as_bytes()])
    }

    /// Sign with `signer` and check the signature recovers to
    /// `block_signing_key`.
    pub fn sign<F>(&mut self, signer: F) -> HeaderStateResult<()>
    where
        F: FnOnce(&Digest) -> Result<Signature, CryptoError>,
    {
        let digest = self.sig_digest();
        self.header.producer_signature = signer(&digest)?;

        let recovered = recover(&self.header.producer_signature, &digest)?;
        if recovered != self.block_signing_key {
            return Err(HeaderStateError::WrongSigningKey {
                expected: self.block_signing_key,
                actual: recovered,
            });
        }
        Ok(())
    }

    /// Sign with a local private key.
    pub fn sign_with_key(&mut self, key: &PrivateKey) -> HeaderStateResult<()> {
        self.sign(|digest| shared_crypto::sign(key, digest))
    }

    /// Key recovered from the header signature.
    pub fn signee(&self) -> HeaderStateResult<PublicKey> {
        Ok(recover(&self.header.producer_signature, &self.sig_digest())?)
    }

    /// Record a producer's endorsement of this block.
    pub fn add_confirmation(&mut self, conf: HeaderConfirmation) -> HeaderStateResult<()> {
        if conf.block_id != self.id {
            return Err(HeaderStateError::ConfirmationBlockMismatch {
                expected: self.id,
                actual: conf.block_id,
            });
        }
        if self
            .confirmations
            .iter()
            .any(|c| c.producer == conf.producer)
        {
            return Err(HeaderStateError::DuplicateConfirmation {
                producer: conf.producer,
            });
        }

        let key = self
            .active_schedule
            .get_producer_key(conf.producer)
            .ok_or(HeaderStateError::UnknownProducer {
                producer: conf.producer,
            })?;

        let signer = recover(&conf.producer_signature, &self.sig_digest())?;
        if signer != key {
            return Err(HeaderStateError::ConfirmationKeyMismatch {
                producer: conf.producer,
            });
        }

        self.confirmations.push(conf);
        Ok(())
    }

    /// Whether more than two thirds of the active producers confirmed.
    pub fn has_confirmation_quorum(&self) -> bool {
        self.confirmations.len() * 3 > self.active_schedule.len() * 2
    }

    fn refresh_id(&mut self) {
        self.id = self.header.id();
    }
}
