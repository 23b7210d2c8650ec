//! Test helpers shared by the algorithm tests.

use crate::domain::entities::PendingTransaction;
use shared_types::{Action, Name, PermissionLevel, ShardLock, TimePointSec, Transaction};
use std::sync::Arc;

pub fn scope(label: &str) -> ShardLock {
    ShardLock::new(Name::new("token").unwrap(), Name::new(label).unwrap())
}

/// Transaction `seq` writing the given scopes.
pub fn make_trx(seq: u32, writes: &[ShardLock]) -> PendingTransaction {
    make_trx_rw(seq, &[], writes)
}

pub fn make_trx_rw(seq: u32, reads: &[ShardLock], writes: &[ShardLock]) -> PendingTransaction {
    make_sized_trx(seq, reads, writes, 0)
}

pub fn make_sized_trx(
    seq: u32,
    reads: &[ShardLock],
    writes: &[ShardLock],
    padding: usize,
) -> PendingTransaction {
    let mut data = seq.to_le_bytes().to_vec();
    data.resize(4 + padding, 0);
    let trx = Transaction {
        expiration: TimePointSec::from_secs(u32::MAX),
        region: 0,
        read_scope: reads.to_vec(),
        write_scope: writes.to_vec(),
        context_free_actions: vec![],
        actions: vec![Action {
            account: Name::new("token").unwrap(),
            name: Name::new("transfer").unwrap(),
            authorization: vec![PermissionLevel {
                actor: Name::new("alice").unwrap(),
                permission: Name::new("active").unwrap(),
            }],
            data,
        }],
    };
    PendingTransaction::new(Arc::new(trx))
}
