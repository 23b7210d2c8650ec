//! State database port.
//!
//! Rows live in tables addressed by `(code, scope, table)` and keyed by a
//! `u64` primary key. Changes are grouped into nested undo sessions:
//!
//! ```text
//! revision:   5 (committed)   6 (block)   7 (transaction)
//! sessions:   ─────────────── [ block ] ─ [ trx ]
//!                                           │ squash → merged into block
//!                                           │ undo   → reverted
//! ```
//!
//! Each open session raises the revision by one. `commit(rev)` forgets the
//! undo history of every session at or below `rev`; those changes can no
//! longer be reverted.

use crate::domain::errors::StateDbResult;
use serde::{Deserialize, Serialize};
use shared_types::{Name, ShardLock};
use std::fmt;

/// Primary key of a table row.
pub type PrimaryKey = u64;

/// Address of a table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableId {
    /// Account owning the table.
    pub code: Name,
    /// Scope within the account.
    pub scope: Name,
    /// Table name.
    pub table: Name,
}

impl TableId {
    /// Create a table address.
    pub fn new(code: Name, scope: Name, table: Name) -> Self {
        Self { code, scope, table }
    }

    /// The `(account, scope)` lock guarding this table.
    pub fn lock(&self) -> ShardLock {
        ShardLock::new(self.code, self.scope)
    }
}

impl fmt::Debug for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.code, self.scope, self.table)
    }
}

/// Versioned key-value state with nested undo sessions.
pub trait StateDatabase: Send + Sync {
    /// Read a row.
    fn get(&self, table: &TableId, key: PrimaryKey) -> Option<Vec<u8>>;

    /// Insert or overwrite a row.
    fn put(&mut self, table: &TableId, key: PrimaryKey, value: Vec<u8>);

    /// Delete a row, returning its previous value.
    fn remove(&mut self, table: &TableId, key: PrimaryKey) -> Option<Vec<u8>>;

    /// All rows of a table in key order.
    fn rows(&self, table: &TableId) -> Vec<(PrimaryKey, Vec<u8>)>;

    /// Open a nested undo session and return its revision.
    fn start_undo_session(&mut self) -> u64;

    /// Revert and close the innermost session.
    fn undo(&mut self) -> StateDbResult<()>;

    /// Merge the innermost session into its parent.
    fn squash(&mut self) -> StateDbResult<()>;

    /// Forget the undo history of every session at or below `revision`.
    fn commit(&mut self, revision: u64);

    /// Revert every open session.
    fn undo_all(&mut self);

    /// Current revision.
    fn revision(&self) -> u64;

    /// Set the revision; only allowed with no open session.
    fn set_revision(&mut self, revision: u64) -> StateDbResult<()>;

    /// Number of open undo sessions.
    fn session_count(&self) -> usize;
}
