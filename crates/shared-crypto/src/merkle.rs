//! # Merkle Trees
//!
//! Pairwise SHA-256 trees where an odd node at any level is paired with
//! itself. `IncrementalMerkle` keeps only the right edge of the tree so a
//! block header state can extend the accumulator of all prior block ids in
//! O(log n) without storing the ids; its root always equals `merkle_root`
//! over the same leaves.

use crate::hashing::{sha256_many, Digest};
use serde::{Deserialize, Serialize};

fn hash_pair(left: &Digest, right: &Digest) -> Digest {
    sha256_many(&[left.as_bytes(), right.as_bytes()])
}

/// Compute the Merkle root of a list of digests.
///
/// Returns the zero digest for an empty list.
pub fn merkle_root(mut ids: Vec<Digest>) -> Digest {
    if ids.is_empty() {
        return Digest::ZERO;
    }

    while ids.len() > 1 {
        if ids.len() % 2 == 1 {
            let last = ids[ids.len() - 1];
            ids.push(last);
        }
        for i in 0..ids.len() / 2 {
            ids[i] = hash_pair(&ids[2 * i], &ids[2 * i + 1]);
        }
        ids.truncate(ids.len() / 2);
    }

    ids[0]
}

/// Depth of a tree holding `node_count` leaves (a single leaf has depth 1).
fn max_depth(node_count: u64) -> u32 {
    if node_count == 0 {
        return 0;
    }
    node_count.next_power_of_two().trailing_zeros() + 1
}

/// Append-only Merkle accumulator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementalMerkle {
    active_nodes: Vec<Digest>,
    node_count: u64,
}

impl IncrementalMerkle {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of leaves appended so far.
    pub fn node_count(&self) -> u64 {
        self.node_count
    }

    /// Append a leaf and return the new root.
    pub fn append(&mut self, digest: Digest) -> Digest {
        let depth = max_depth(self.node_count + 1);
        let mut index = self.node_count;
        let mut top = digest;
        let mut partial = false;
        let mut lefts = self.active_nodes.iter();
        let mut updated = Vec::with_capacity(depth as usize);

        for _ in 1..depth {
            if index & 1 == 0 {
                // `top` is a left child; its right sibling does not exist yet.
                if !partial {
                    updated.push(top);
                }
                top = hash_pair(&top, &top);
                partial = true;
            } else {
                let left = lefts.next().copied().unwrap_or_default();
                if partial {
                    updated.push(left);
                }
                top = hash_pair(&left, &top);
            }
            index >>= 1;
        }

        updated.push(top);
        self.active_nodes = updated;
        self.node_count += 1;
        top
    }

    /// Current root (zero digest when empty).
    pub fn root(&self) -> Digest {
        self.active_nodes.last().copied().unwrap_or_default()
    }
}
