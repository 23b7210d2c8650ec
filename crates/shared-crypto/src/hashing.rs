//! # Hashing
//!
//! SHA-256 is the consensus digest: block ids, signing digests, schedule
//! digests and Merkle nodes are all SHA-256. BLAKE3 is only used for
//! non-consensus bucketing (scheduler touch-points) where speed matters and
//! the output never leaves the node.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;

/// SHA-256 digest (256-bit).
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// The all-zero digest, used for "no value".
    pub const ZERO: Digest = Digest([0u8; 32]);

    /// Wrap raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether this is the all-zero digest.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", hex::encode(&self.0[..8]))
    }
}

/// Stateful SHA-256 hasher.
pub struct DigestHasher {
    inner: Sha256,
}

impl DigestHasher {
    /// Create new hasher.
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    /// Update with data.
    pub fn update(&mut self, data: impl AsRef<[u8]>) -> &mut Self {
        self.inner.update(data.as_ref());
        self
    }

    /// Finalize and return digest.
    pub fn finalize(self) -> Digest {
        Digest(self.inner.finalize().into())
    }
}

impl Default for DigestHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: impl AsRef<[u8]>) -> Digest {
    Digest(Sha256::digest(data.as_ref()).into())
}

/// Hash the concatenation of multiple inputs.
pub fn sha256_many(inputs: &[&[u8]]) -> Digest {
    let mut hasher = DigestHasher::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize()
}

/// Bucket hash for a scheduler touch-point.
///
/// Not a consensus value: two unrelated touch-points may collide, which the
/// scheduler treats as a conflict.
pub fn touch_point_hash(data: impl AsRef<[u8]>) -> u64 {
    let hash = blake3::hash(data.as_ref());
    let mut word = [0u8; 8];
    word.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(word)
}
