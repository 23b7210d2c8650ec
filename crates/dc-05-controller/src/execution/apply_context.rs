//! Per-action view of state.

use crate::domain::errors::{ExecutionError, ExecutionResult};
use crate::ports::state_db::{PrimaryKey, StateDatabase, TableId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{
    canonical_bytes, decode, Action, BlockNum, BlockTimestamp, Name, ProducerKey, Transaction,
};

/// Block the action executes in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockContext {
    pub block_num: BlockNum,
    pub timestamp: BlockTimestamp,
    pub producer: Name,
}

/// What a handler can see and touch while executing one action.
pub struct ApplyContext<'a> {
    db: &'a mut dyn StateDatabase,
    trx: &'a Transaction,
    act: &'a Action,
    block: BlockContext,
    context_free: bool,
    console: String,
    proposed_producers: Option<Vec<ProducerKey>>,
}

impl<'a> ApplyContext<'a> {
    pub fn new(
        db: &'a mut dyn StateDatabase,
        trx: &'a Transaction,
        act: &'a Action,
        block: BlockContext,
        context_free: bool,
    ) -> Self {
        Self {
            db,
            trx,
            act,
            block,
            context_free,
            console: String::new(),
            proposed_producers: None,
        }
    }

    /// The action being executed.
    pub fn act(&self) -> &Action {
        self.act
    }

    /// Block being built or applied.
    pub fn block(&self) -> &BlockContext {
        &self.block
    }

    /// Fail unless `actor` authorized the action.
    pub fn require_authorization(&self, actor: Name) -> ExecutionResult<()> {
        if self.act.authorization.iter().any(|p| p.actor == actor) {
            Ok(())
        } else {
            Err(ExecutionError::MissingAuthorization { actor })
        }
    }

    /// Decode the action payload.
    pub fn data_as<T: DeserializeOwned>(&self) -> ExecutionResult<T> {
        decode(&self.act.data).map_err(|e| ExecutionError::InvalidActionData {
            account: self.act.account,
            action: self.act.name,
            reason: e.to_string(),
        })
    }

    /// Raw row read.
    pub fn get(&self, table: &TableId, key: PrimaryKey) -> ExecutionResult<Option<Vec<u8>>> {
        self.check_state_access()?;
        let lock = table.lock();
        if !self.trx.may_read(&lock) {
            return Err(ExecutionError::ReadNotDeclared { lock });
        }
        Ok(self.db.get(table, key))
    }

    /// Raw row write.
    pub fn put(&mut self, table: &TableId, key: PrimaryKey, value: Vec<u8>) -> ExecutionResult<()> {
        self.check_write(table)?;
        self.db.put(table, key, value);
        Ok(())
    }

    /// Row delete.
    pub fn remove(&mut self, table: &TableId, key: PrimaryKey) -> ExecutionResult<Option<Vec<u8>>> {
        self.check_write(table)?;
        Ok(self.db.remove(table, key))
    }

    /// Typed row read.
    pub fn get_row<T: DeserializeOwned>(
        &self,
        table: &TableId,
        key: PrimaryKey,
    ) -> ExecutionResult<Option<T>> {
        self.get(table, key)?
            .map(|bytes| {
                decode(&bytes).map_err(|e| ExecutionError::ActionFailed {
                    account: self.act.account,
                    action: self.act.name,
                    reason: format!("corrupt row {table:?}#{key}: {e}"),
                })
            })
            .transpose()
    }

    /// Typed row write.
    pub fn put_row<T: Serialize>(
        &mut self,
        table: &TableId,
        key: PrimaryKey,
        value: &T,
    ) -> ExecutionResult<()> {
        self.put(table, key, canonical_bytes(value))
    }

    /// Append to the action's console output.
    pub fn print(&mut self, text: impl AsRef<str>) {
        self.console.push_str(text.as_ref());
    }

    /// Propose a new producer list for the block being built.
    pub fn set_proposed_producers(&mut self, producers: Vec<ProducerKey>) {
        self.proposed_producers = Some(producers);
    }

    /// Console output and proposed producers.
    pub fn finish(self) -> (String, Option<Vec<ProducerKey>>) {
        (self.console, self.proposed_producers)
    }

    fn check_state_access(&self) -> ExecutionResult<()> {
        if self.context_free {
            return Err(ExecutionError::ContextFreeStateAccess {
                account: self.act.account,
                action: self.act.name,
            });
        }
        Ok(())
    }

    fn check_write(&self, table: &TableId) -> ExecutionResult<()> {
        self.check_state_access()?;
        let lock = table.lock();
        if !self.trx.may_write(&lock) {
            return Err(ExecutionError::WriteNotDeclared { lock });
        }
        Ok(())
    }
}
