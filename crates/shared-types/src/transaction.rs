//! # Transactions
//!
//! A transaction declares up front every `(account, scope)` pair it reads or
//! writes. The scheduler partitions on these declarations and execution
//! refuses table access outside them.

use crate::encoding::{canonical_bytes, encoded_size};
use crate::names::Name;
use crate::timestamp::TimePointSec;
use serde::{Deserialize, Serialize};
use shared_crypto::{sha256, Digest};
use std::fmt;

/// Transaction identifier (digest of the canonical encoding).
pub type TransactionId = Digest;

/// An `actor@permission` authorization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionLevel {
    /// Authorizing account.
    pub actor: Name,
    /// Permission of that account.
    pub permission: Name,
}

/// A call to a contract handler.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    /// Contract account that handles the action.
    pub account: Name,
    /// Action name within the contract.
    pub name: Name,
    /// Declared authorizations.
    pub authorization: Vec<PermissionLevel>,
    /// Opaque payload, interpreted by the handler.
    pub data: Vec<u8>,
}

impl Action {
    /// Digest used for the action Merkle root.
    pub fn digest(&self) -> Digest {
        sha256(canonical_bytes(self))
    }
}

/// A declared read or write dependency on an `(account, scope)` pair.
///
/// Ordered by account, then scope.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShardLock {
    /// Account whose tables are touched.
    pub account: Name,
    /// Scope within those tables.
    pub scope: Name,
}

impl ShardLock {
    /// Create a lock.
    pub fn new(account: Name, scope: Name) -> Self {
        Self { account, scope }
    }

    /// Bytes hashed for scheduler bucketing.
    pub fn key_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&self.account.as_u64().to_le_bytes());
        out[8..].copy_from_slice(&self.scope.as_u64().to_le_bytes());
        out
    }
}

impl fmt::Debug for ShardLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account, self.scope)
    }
}

impl fmt::Display for ShardLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account, self.scope)
    }
}

/// A transaction as submitted to the node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    /// The transaction is invalid in any block at or after this time.
    pub expiration: TimePointSec,
    /// Region the transaction executes in.
    pub region: u16,
    /// Declared read set.
    pub read_scope: Vec<ShardLock>,
    /// Declared write set.
    pub write_scope: Vec<ShardLock>,
    /// Actions that need no authorization.
    pub context_free_actions: Vec<Action>,
    /// Authorized actions.
    pub actions: Vec<Action>,
}

impl Transaction {
    /// Transaction id.
    pub fn id(&self) -> TransactionId {
        sha256(canonical_bytes(self))
    }

    /// Every declared touch-point (reads, then writes).
    pub fn touch_points(&self) -> impl Iterator<Item = &ShardLock> {
        self.read_scope.iter().chain(self.write_scope.iter())
    }

    /// Whether the transaction declares `lock` as readable.
    pub fn may_read(&self, lock: &ShardLock) -> bool {
        self.read_scope.contains(lock) || self.write_scope.contains(lock)
    }

    /// Whether the transaction declares `lock` as writable.
    pub fn may_write(&self, lock: &ShardLock) -> bool {
        self.write_scope.contains(lock)
    }

    /// All actions in execution order (context-free first).
    pub fn all_actions(&self) -> impl Iterator<Item = &Action> {
        self.context_free_actions.iter().chain(self.actions.iter())
    }

    /// Encoded size in bytes.
    pub fn packed_size(&self) -> usize {
        encoded_size(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    fn transfer(memo: &[u8]) -> Transaction {
        Transaction {
            expiration: TimePointSec::from_secs(1_000),
            region: 0,
            read_scope: vec![],
            write_scope: vec![ShardLock::new(name("token"), name("alice"))],
            context_free_actions: vec![],
            actions: vec![Action {
                account: name("token"),
                name: name("transfer"),
                authorization: vec![PermissionLevel {
                    actor: name("alice"),
                    permission: name("active"),
                }],
                data: memo.to_vec(),
            }],
        }
    }

    #[test]
    fn test_id_depends_on_content() {
        assert_eq!(transfer(b"a").id(), transfer(b"a").id());
        assert_ne!(transfer(b"a").id(), transfer(b"b").id());
    }

    #[test]
    fn test_declared_access() {
        let trx = transfer(b"x");
        let alice = ShardLock::new(name("token"), name("alice"));
        let bob = ShardLock::new(name("token"), name("bob"));

        assert!(trx.may_write(&alice));
        assert!(trx.may_read(&alice));
        assert!(!trx.may_read(&bob));
        assert_eq!(trx.touch_points().count(), 1);
    }

    #[test]
    fn test_lock_order() {
        let a = ShardLock::new(name("a"), name("z"));
        let b = ShardLock::new(name("b"), name("a"));
        assert!(a < b);
    }
}
