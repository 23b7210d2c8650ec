//! In-memory state database.

use crate::domain::errors::{StateDbError, StateDbResult};
use crate::ports::state_db::{PrimaryKey, StateDatabase, TableId};
use std::collections::BTreeMap;

type RowKey = (TableId, PrimaryKey);

/// Prior values of every row a session touched; `None` means the row did
/// not exist.
#[derive(Debug, Default)]
struct UndoState {
    revision: u64,
    old_values: BTreeMap<RowKey, Option<Vec<u8>>>,
}

/// `BTreeMap`-backed [`StateDatabase`].
#[derive(Debug, Default)]
pub struct MemoryStateDb {
    rows: BTreeMap<RowKey, Vec<u8>>,
    sessions: Vec<UndoState>,
    revision: u64,
}

impl MemoryStateDb {
    /// Empty database at revision 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the database holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn remember(&mut self, key: &RowKey) {
        let Some(top) = self.sessions.last_mut() else {
            return;
        };
        if !top.old_values.contains_key(key) {
            top.old_values.insert(*key, self.rows.get(key).cloned());
        }
    }
}

impl StateDatabase for MemoryStateDb {
    fn get(&self, table: &TableId, key: PrimaryKey) -> Option<Vec<u8>> {
        self.rows.get(&(*table, key)).cloned()
    }

    fn put(&mut self, table: &TableId, key: PrimaryKey, value: Vec<u8>) {
        let row = (*table, key);
        self.remember(&row);
        self.rows.insert(row, value);
    }

    fn remove(&mut self, table: &TableId, key: PrimaryKey) -> Option<Vec<u8>> {
        let row = (*table, key);
        self.remember(&row);
        self.rows.remove(&row)
    }

    fn rows(&self, table: &TableId) -> Vec<(PrimaryKey, Vec<u8>)> {
        self.rows
            .range((*table, PrimaryKey::MIN)..=(*table, PrimaryKey::MAX))
            .map(|((_, key), value)| (*key, value.clone()))
            .collect()
    }

    fn start_undo_session(&mut self) -> u64 {
        self.revision += 1;
        self.sessions.push(UndoState {
            revision: self.revision,
            old_values: BTreeMap::new(),
        });
        self.revision
    }

    fn undo(&mut self) -> StateDbResult<()> {
        let top = self.sessions.pop().ok_or(StateDbError::NoUndoSession)?;
        for (row, old) in top.old_values {
            match old {
                Some(value) => {
                    self.rows.insert(row, value);
                }
                None => {
                    self.rows.remove(&row);
                }
            }
        }
        self.revision -= 1;
        Ok(())
    }

    fn squash(&mut self) -> StateDbResult<()> {
        let top = self.sessions.pop().ok_or(StateDbError::NoUndoSession)?;
        if let Some(parent) = self.sessions.last_mut() {
            for (row, old) in top.old_values {
                parent.old_values.entry(row).or_insert(old);
            }
        }
        self.revision -= 1;
        Ok(())
    }

    fn commit(&mut self, revision: u64) {
        let keep_from = self
            .sessions
            .iter()
            .position(|s| s.revision > revision)
            .unwrap_or(self.sessions.len());
        self.sessions.drain(..keep_from);
    }

    fn undo_all(&mut self) {
        while self.undo().is_ok() {}
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn set_revision(&mut self, revision: u64) -> StateDbResult<()> {
        if !self.sessions.is_empty() {
            return Err(StateDbError::SessionsOpen {
                open: self.sessions.len(),
            });
        }
        self.revision = revision;
        Ok(())
    }

    fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
