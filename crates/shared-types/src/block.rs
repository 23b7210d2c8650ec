//! # Blocks
//!
//! Header, signed header, and the region → cycle → shard block body.
//!
//! ## Wire Order
//!
//! [`BlockHeader`] fields are encoded in exactly this order: previous id,
//! timestamp, transaction Merkle root, action Merkle root, block Merkle root,
//! producer, schedule version, optional new producer schedule.

use crate::encoding::canonical_bytes;
use crate::names::Name;
use crate::schedule::ProducerSchedule;
use crate::timestamp::BlockTimestamp;
use crate::transaction::{ShardLock, Transaction, TransactionId};
use serde::{Deserialize, Serialize};
use shared_crypto::{merkle_root, sha256, Digest, Signature};
use std::collections::HashMap;
use std::fmt;

/// Block number.
pub type BlockNum = u32;

/// Block identifier: header digest with the block number in the first four
/// bytes (big-endian).
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(Digest);

impl BlockId {
    /// Build an id from a header digest and block number.
    pub fn new(digest: Digest, block_num: BlockNum) -> Self {
        let mut bytes = digest.0;
        bytes[..4].copy_from_slice(&block_num.to_be_bytes());
        Self(Digest(bytes))
    }

    /// Wrap raw id bytes.
    pub fn from_digest(digest: Digest) -> Self {
        Self(digest)
    }

    /// Block number embedded in the id.
    pub fn block_num(&self) -> BlockNum {
        let mut num = [0u8; 4];
        num.copy_from_slice(&self.0 .0[..4]);
        u32::from_be_bytes(num)
    }

    /// Underlying digest.
    pub fn digest(&self) -> Digest {
        self.0
    }

    /// Whether this is the all-zero id (parent of the first block).
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId(#{} {:?})", self.block_num(), self.0)
    }
}

/// Unsigned block header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Id of the parent block.
    pub previous: BlockId,
    /// Slot this block was produced in.
    pub timestamp: BlockTimestamp,
    /// Merkle root of the transaction receipts.
    pub transaction_mroot: Digest,
    /// Merkle root of the executed actions.
    pub action_mroot: Digest,
    /// Merkle root of all prior block ids.
    pub block_mroot: Digest,
    /// Scheduled producer.
    pub producer: Name,
    /// Version of the active schedule the producer was taken from.
    pub schedule_version: u32,
    /// Proposed next schedule, if this block proposes one.
    pub new_producers: Option<ProducerSchedule>,
}

impl BlockHeader {
    /// Digest of the canonical header encoding.
    pub fn digest(&self) -> Digest {
        sha256(canonical_bytes(self))
    }

    /// Block number (parent number + 1).
    pub fn block_num(&self) -> BlockNum {
        self.previous.block_num().wrapping_add(1)
    }

    /// Block id.
    pub fn id(&self) -> BlockId {
        BlockId::new(self.digest(), self.block_num())
    }
}

/// Header plus the producer's signature.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBlockHeader {
    /// The header.
    pub header: BlockHeader,
    /// Signature over the header state's signing digest.
    pub producer_signature: Signature,
}

impl SignedBlockHeader {
    /// Block id (the signature is not part of the id).
    pub fn id(&self) -> BlockId {
        self.header.id()
    }

    /// Block number.
    pub fn block_num(&self) -> BlockNum {
        self.header.block_num()
    }
}

/// Record that a transaction was executed in a shard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Executed transaction.
    pub id: TransactionId,
}

impl TransactionReceipt {
    /// Digest used for the transaction Merkle root.
    pub fn digest(&self) -> Digest {
        sha256(canonical_bytes(self))
    }
}

/// One shard of a cycle: its locks and the transactions it ran in order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardSummary {
    /// Sorted, unique read locks.
    pub read_locks: Vec<ShardLock>,
    /// Sorted, unique write locks.
    pub write_locks: Vec<ShardLock>,
    /// Receipts in execution order.
    pub transactions: Vec<TransactionReceipt>,
}

/// Shards that may execute concurrently.
pub type CycleSummary = Vec<ShardSummary>;

/// All cycles executed in one region.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSummary {
    /// Region id; regions are strictly increasing within a block.
    pub region: u16,
    /// Cycles in execution order.
    pub cycles_summary: Vec<CycleSummary>,
}

/// A complete block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBlock {
    /// Signed header.
    pub header: SignedBlockHeader,
    /// Execution layout.
    pub regions: Vec<RegionSummary>,
    /// Full bodies of every transaction referenced by a receipt.
    pub input_transactions: Vec<Transaction>,
}

impl SignedBlock {
    /// Empty block for `header`.
    pub fn new(header: SignedBlockHeader) -> Self {
        Self {
            header,
            regions: Vec::new(),
            input_transactions: Vec::new(),
        }
    }

    /// Block id.
    pub fn id(&self) -> BlockId {
        self.header.id()
    }

    /// Block number.
    pub fn block_num(&self) -> BlockNum {
        self.header.block_num()
    }

    /// Receipts in region, cycle, shard, execution order.
    pub fn receipts(&self) -> impl Iterator<Item = &TransactionReceipt> {
        self.regions
            .iter()
            .flat_map(|r| r.cycles_summary.iter())
            .flat_map(|c| c.iter())
            .flat_map(|s| s.transactions.iter())
    }

    /// Number of receipts.
    pub fn transaction_count(&self) -> usize {
        self.receipts().count()
    }

    /// Merkle root over the receipt digests.
    pub fn calculate_transaction_mroot(&self) -> Digest {
        merkle_root(self.receipts().map(TransactionReceipt::digest).collect())
    }

    /// Merkle root over every action of every receipt's transaction, in
    /// execution order.
    pub fn calculate_action_mroot(&self) -> Digest {
        let inputs: HashMap<TransactionId, &Transaction> = self
            .input_transactions
            .iter()
            .map(|trx| (trx.id(), trx))
            .collect();

        let digests = self
            .receipts()
            .filter_map(|receipt| inputs.get(&receipt.id))
            .flat_map(|trx| trx.all_actions().map(|a| a.digest()))
            .collect();
        merkle_root(digests)
    }
}

/// A producer's endorsement of a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderConfirmation {
    /// Confirmed block.
    pub block_id: BlockId,
    /// Confirming producer.
    pub producer: Name,
    /// Signature over the block's signing digest.
    pub producer_signature: Signature,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::TimePointSec;
    use crate::transaction::Action;

    fn name(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    #[test]
    fn test_block_num_embedded_in_id() {
        let mut header = BlockHeader::default();
        assert_eq!(header.block_num(), 1);
        let first = header.id();
        assert_eq!(first.block_num(), 1);

        header.previous = first;
        assert_eq!(header.block_num(), 2);
        assert_eq!(header.id().block_num(), 2);
    }

    #[test]
    fn test_header_digest_covers_every_field() {
        let base = BlockHeader {
            producer: name("alice"),
            ..Default::default()
        };

        let mut changed = base.clone();
        changed.schedule_version = 1;
        assert_ne!(base.id(), changed.id());

        let mut changed = base.clone();
        changed.new_producers = Some(ProducerSchedule::default());
        assert_ne!(base.id(), changed.id());

        // The signature is not part of the id.
        let signed = SignedBlockHeader {
            header: base.clone(),
            producer_signature: Signature::from_bytes([7u8; 65]),
        };
        assert_eq!(signed.id(), base.id());
    }

    #[test]
    fn test_body_merkle_roots() {
        let trx = Transaction {
            expiration: TimePointSec::from_secs(10),
            region: 0,
            read_scope: vec![],
            write_scope: vec![],
            context_free_actions: vec![],
            actions: vec![Action {
                account: name("system"),
                name: name("onblock"),
                authorization: vec![],
                data: vec![1, 2, 3],
            }],
        };
        let receipt = TransactionReceipt { id: trx.id() };

        let mut block = SignedBlock::new(SignedBlockHeader::default());
        assert_eq!(block.calculate_transaction_mroot(), Digest::ZERO);

        block.regions.push(RegionSummary {
            region: 0,
            cycles_summary: vec![vec![ShardSummary {
                transactions: vec![receipt],
                ..Default::default()
            }]],
        });
        block.input_transactions.push(trx.clone());

        assert_eq!(block.transaction_count(), 1);
        assert_eq!(block.calculate_transaction_mroot(), receipt.digest());
        assert_eq!(block.calculate_action_mroot(), trx.actions[0].digest());
    }
}
