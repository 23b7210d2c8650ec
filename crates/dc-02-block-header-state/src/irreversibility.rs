//! # Irreversibility Calculator
//!
//! DPoS finality: a block is irreversible once `threshold` percent of the
//! active producers have produced a block on top of it. Given the last block
//! number each producer built, that is the value at position
//! `ceil(N × (100 − threshold) / 100)` counted from the bottom of the sorted
//! list (1-based).

use shared_types::BlockNum;

/// 0-based position of the irreversible value among `count` sorted values.
pub fn lib_index(count: usize, threshold_percent: u32) -> usize {
    let share = 100 - u64::from(threshold_percent.min(100));
    let position = (count as u64 * share).div_ceil(100);
    position.saturating_sub(1) as usize
}

/// Last irreversible block number for a set of last-produced numbers.
///
/// Zero producers gives 0. Selection is O(N) expected; the input order does
/// not matter.
pub fn calc_dpos_last_irreversible<I>(last_produced: I, threshold_percent: u32) -> BlockNum
where
    I: IntoIterator<Item = BlockNum>,
{
    let mut nums: Vec<BlockNum> = last_produced.into_iter().collect();
    if nums.is_empty() {
        return 0;
    }

    let index = lib_index(nums.len(), threshold_percent).min(nums.len() - 1);
    let (_, value, _) = nums.select_nth_unstable(index);
    *value
}
