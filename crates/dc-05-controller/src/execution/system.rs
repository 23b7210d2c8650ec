//! Built-in system contract.
//!
//! - `onblock` runs first in every block and counts the blocks each
//!   producer has signed.
//! - `setprods` proposes a new producer list. The controller installs it on
//!   the pending header state.

use super::apply_context::ApplyContext;
use crate::domain::errors::{ExecutionError, ExecutionResult};
use crate::ports::state_db::TableId;
use shared_types::{
    canonical_bytes, Action, BlockHeader, Name, PermissionLevel, ProducerKey, ProducerSchedule,
    ShardLock, TimePointSec, Transaction,
};

pub const SYSTEM: Name = Name::constant("system");
pub const ONBLOCK: Name = Name::constant("onblock");
pub const SETPRODS: Name = Name::constant("setprods");
pub const ACTIVE: Name = Name::constant("active");

/// Blocks signed per producer, keyed by producer name.
pub const BLOCKCOUNT_TABLE: Name = Name::constant("blockcount");
/// Row 0 holds the last accepted producer list.
pub const PRODUCERS_TABLE: Name = Name::constant("producers");
/// Row 0 holds [`GlobalState`](crate::domain::genesis::GlobalState).
pub const GLOBAL_TABLE: Name = Name::constant("global");

/// The single scope every system table lives in.
pub fn system_lock() -> ShardLock {
    ShardLock::new(SYSTEM, SYSTEM)
}

/// `(system, system, table)`.
pub fn system_table(table: Name) -> TableId {
    TableId::new(SYSTEM, SYSTEM, table)
}

fn system_action(name: Name, data: Vec<u8>) -> Action {
    Action {
        account: SYSTEM,
        name,
        authorization: vec![PermissionLevel {
            actor: SYSTEM,
            permission: ACTIVE,
        }],
        data,
    }
}

fn system_transaction(action: Action, expiration: TimePointSec) -> Transaction {
    Transaction {
        expiration,
        region: 0,
        read_scope: vec![],
        write_scope: vec![system_lock()],
        context_free_actions: vec![],
        actions: vec![action],
    }
}

/// Implicit first transaction of the block built on `header`.
pub fn onblock_transaction(header: &BlockHeader) -> Transaction {
    system_transaction(
        system_action(ONBLOCK, canonical_bytes(header)),
        TimePointSec::from_block_timestamp(header.timestamp, 1),
    )
}

/// Transaction proposing `producers` as the next schedule.
pub fn setprods_transaction(producers: Vec<ProducerKey>, expiration: TimePointSec) -> Transaction {
    system_transaction(system_action(SETPRODS, canonical_bytes(&producers)), expiration)
}

pub(crate) fn on_block(ctx: &mut ApplyContext<'_>) -> ExecutionResult<()> {
    ctx.require_authorization(SYSTEM)?;
    let header: BlockHeader = ctx.data_as()?;

    let table = system_table(BLOCKCOUNT_TABLE);
    let key = header.producer.as_u64();
    let produced: u64 = ctx.get_row(&table, key)?.unwrap_or(0);
    ctx.put_row(&table, key, &(produced + 1))
}

pub(crate) fn set_prods(ctx: &mut ApplyContext<'_>) -> ExecutionResult<()> {
    ctx.require_authorization(SYSTEM)?;
    let producers: Vec<ProducerKey> = ctx.data_as()?;

    let candidate = ProducerSchedule::new(0, producers);
    candidate
        .validate()
        .map_err(|e| ExecutionError::ActionFailed {
            account: SYSTEM,
            action: SETPRODS,
            reason: e.to_string(),
        })?;

    ctx.put_row(&system_table(PRODUCERS_TABLE), 0, &candidate.producers)?;
    ctx.print(format!("proposed {} producers", candidate.producers.len()));
    ctx.set_proposed_producers(candidate.producers);
    Ok(())
}
