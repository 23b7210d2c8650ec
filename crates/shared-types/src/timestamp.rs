//! # Time Types
//!
//! [`BlockTimestamp`] counts fixed-duration slots since 2000-01-01T00:00:00Z;
//! it is the only clock consensus code looks at. [`TimePointSec`] is a
//! plain Unix-seconds value used for transaction expiration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Slot duration in milliseconds.
pub const BLOCK_INTERVAL_MS: u64 = 500;

/// Unix time of slot 0 (2000-01-01T00:00:00Z) in milliseconds.
pub const BLOCK_TIMESTAMP_EPOCH_MS: u64 = 946_684_800_000;

/// Slot-quantized block time.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockTimestamp(u32);

impl BlockTimestamp {
    /// Largest representable slot.
    pub const MAX: BlockTimestamp = BlockTimestamp(u32::MAX);

    /// Timestamp at slot `slot`.
    pub const fn from_slot(slot: u32) -> Self {
        Self(slot)
    }

    /// Slot counter.
    pub const fn slot(&self) -> u32 {
        self.0
    }

    /// Timestamp of the slot containing `unix_ms`.
    ///
    /// Times before the epoch map to slot 0; times past the last slot map to
    /// [`BlockTimestamp::MAX`].
    pub fn from_unix_millis(unix_ms: u64) -> Self {
        let slot = unix_ms.saturating_sub(BLOCK_TIMESTAMP_EPOCH_MS) / BLOCK_INTERVAL_MS;
        Self(u32::try_from(slot).unwrap_or(u32::MAX))
    }

    /// Start of this slot in Unix milliseconds.
    pub fn to_unix_millis(&self) -> u64 {
        BLOCK_TIMESTAMP_EPOCH_MS + self.0 as u64 * BLOCK_INTERVAL_MS
    }

    /// Advance by `slots`, or `None` on counter overflow.
    pub fn checked_add_slots(&self, slots: u32) -> Option<Self> {
        self.0.checked_add(slots).map(Self)
    }

    /// The following slot, or `None` at the end of the counter.
    pub fn next(&self) -> Option<Self> {
        self.checked_add_slots(1)
    }
}

impl fmt::Display for BlockTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

impl fmt::Debug for BlockTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockTimestamp({})", self.0)
    }
}

/// Unix time with one-second resolution.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TimePointSec(pub u32);

impl TimePointSec {
    /// From Unix seconds.
    pub const fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    /// Unix milliseconds.
    pub fn to_unix_millis(&self) -> u64 {
        self.0 as u64 * 1000
    }

    /// Whether this instant is strictly after the start of `ts`.
    pub fn is_after(&self, ts: BlockTimestamp) -> bool {
        self.to_unix_millis() > ts.to_unix_millis()
    }

    /// The second containing `ts`, plus `secs`.
    pub fn from_block_timestamp(ts: BlockTimestamp, secs: u32) -> Self {
        let base = (ts.to_unix_millis() / 1000).min(u32::MAX as u64) as u32;
        Self(base.saturating_add(secs))
    }
}
