//! # Rotation
//!
//! Slot arithmetic and round-robin producer selection.

use crate::error::{ScheduleError, ScheduleResult};
use serde::{Deserialize, Serialize};
use shared_types::{BlockTimestamp, Name, ProducerKey, ProducerSchedule};

/// Consecutive slots signed by one producer before rotating.
pub const DEFAULT_PRODUCER_REPETITIONS: u32 = 12;

/// Timestamp `offset` slots after `base`.
pub fn get_slot_time(base: BlockTimestamp, offset: u32) -> ScheduleResult<BlockTimestamp> {
    base.checked_add_slots(offset)
        .ok_or(ScheduleError::SlotOverflow {
            base: base.slot(),
            offset,
        })
}

/// Number of slots from `base` to `t`: 0 if `t` is before the first slot
/// after `base`, else the 1-based offset.
pub fn get_slot_at_time(base: BlockTimestamp, t: BlockTimestamp) -> u32 {
    let Ok(first) = get_slot_time(base, 1) else {
        return 0;
    };
    if t < first {
        return 0;
    }
    t.slot() - first.slot() + 1
}

/// Index into a `producer_count`-long schedule for `slot`.
pub fn scheduled_producer_index(
    slot: u32,
    producer_count: usize,
    repetitions: u32,
) -> ScheduleResult<usize> {
    if producer_count == 0 {
        return Err(ScheduleError::EmptySchedule);
    }
    if repetitions == 0 {
        return Err(ScheduleError::ZeroRepetitions);
    }

    let round = producer_count as u64 * repetitions as u64;
    let index = (slot as u64 % round) / repetitions as u64;
    Ok(index as usize)
}

/// Round-robin rotation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerRotation {
    repetitions: u32,
}

impl ProducerRotation {
    /// Rotation where each producer signs `repetitions` consecutive slots.
    pub fn new(repetitions: u32) -> ScheduleResult<Self> {
        if repetitions == 0 {
            return Err(ScheduleError::ZeroRepetitions);
        }
        Ok(Self { repetitions })
    }

    /// Consecutive slots per producer.
    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }

    /// Producer scheduled for the slot of `t` in `schedule`.
    pub fn get_scheduled_producer<'a>(
        &self,
        schedule: &'a ProducerSchedule,
        t: BlockTimestamp,
    ) -> ScheduleResult<&'a ProducerKey> {
        let index = scheduled_producer_index(t.slot(), schedule.len(), self.repetitions)?;
        schedule
            .producers
            .get(index)
            .ok_or(ScheduleError::EmptySchedule)
    }

    /// First slot strictly after `after` in which `producer` is scheduled,
    /// searching one full round.
    pub fn next_slot_for(
        &self,
        schedule: &ProducerSchedule,
        after: BlockTimestamp,
        producer: Name,
    ) -> ScheduleResult<Option<BlockTimestamp>> {
        let round = (schedule.len() as u64 * self.repetitions as u64).min(u32::MAX as u64) as u32;
        for offset in 1..=round {
            let t = get_slot_time(after, offset)?;
            if self.get_scheduled_producer(schedule, t)?.producer_name == producer {
                return Ok(Some(t));
            }
        }
        Ok(None)
    }
}

impl Default for ProducerRotation {
    fn default() -> Self {
        Self {
            repetitions: DEFAULT_PRODUCER_REPETITIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared_crypto::PrivateKey;

    fn make_schedule(n: usize) -> ProducerSchedule {
        let producers = (0..n)
            .map(|i| {
                let letter = |k: usize| (b'a' + k as u8) as char;
                let name = format!("prod{}{}", letter(i / 26), letter(i % 26));
                ProducerKey {
                    producer_name: Name::new(&name).unwrap(),
                    block_signing_key: PrivateKey::from_seed(&name).unwrap().public_key(),
                }
            })
            .collect();
        ProducerSchedule::new(0, producers)
    }

    #[test]
    fn test_slot_time_and_overflow() {
        let base = BlockTimestamp::from_slot(100);
        assert_eq!(get_slot_time(base, 0).unwrap(), base);
        assert_eq!(get_slot_time(base, 5).unwrap().slot(), 105);

        let err = get_slot_time(BlockTimestamp::from_slot(u32::MAX - 1), 2).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::SlotOverflow {
                base: u32::MAX - 1,
                offset: 2
            }
        );
    }

    #[test]
    fn test_slot_at_time() {
        let base = BlockTimestamp::from_slot(100);
        assert_eq!(get_slot_at_time(base, BlockTimestamp::from_slot(90)), 0);
        assert_eq!(get_slot_at_time(base, base), 0);
        assert_eq!(get_slot_at_time(base, BlockTimestamp::from_slot(101)), 1);
        assert_eq!(get_slot_at_time(base, BlockTimestamp::from_slot(110)), 10);
        assert_eq!(get_slot_at_time(BlockTimestamp::MAX, BlockTimestamp::MAX), 0);
    }

    #[test]
    fn test_single_producer_boundary() {
        let schedule = make_schedule(1);
        let rotation = ProducerRotation::new(12).unwrap();
        let only = &schedule.producers[0];

        for slot in 0..=12 {
            let producer = rotation
                .get_scheduled_producer(&schedule, BlockTimestamp::from_slot(slot))
                .unwrap();
            assert_eq!(producer, only, "slot {slot}");
        }
    }

    #[test]
    fn test_round_robin_with_repetitions() {
        let schedule = make_schedule(3);
        let rotation = ProducerRotation::new(12).unwrap();
        let at = |slot| {
            rotation
                .get_scheduled_producer(&schedule, BlockTimestamp::from_slot(slot))
                .unwrap()
                .producer_name
        };

        assert_eq!(at(0), schedule.producers[0].producer_name);
        assert_eq!(at(11), schedule.producers[0].producer_name);
        assert_eq!(at(12), schedule.producers[1].producer_name);
        assert_eq!(at(24), schedule.producers[2].producer_name);
        assert_eq!(at(36), schedule.producers[0].producer_name);
    }

    #[test]
    fn test_empty_schedule_and_zero_repetitions() {
        let rotation = ProducerRotation::default();
        let empty = make_schedule(0);
        let result = rotation.get_scheduled_producer(&empty, BlockTimestamp::from_slot(3));
        assert_eq!(result, Err(ScheduleError::EmptySchedule));
        assert_eq!(ProducerRotation::new(0), Err(ScheduleError::ZeroRepetitions));
        assert_eq!(scheduled_producer_index(1, 3, 0), Err(ScheduleError::ZeroRepetitions));
    }

    #[test]
    fn test_next_slot_for() {
        let schedule = make_schedule(2);
        let rotation = ProducerRotation::new(2).unwrap();
        let second = schedule.producers[1].producer_name;

        // Slots 2 and 3 belong to the second producer.
        let next = rotation
            .next_slot_for(&schedule, BlockTimestamp::from_slot(0), second)
            .unwrap();
        assert_eq!(next, Some(BlockTimestamp::from_slot(2)));

        let stranger = Name::new("nobody").unwrap();
        let none = rotation
            .next_slot_for(&schedule, BlockTimestamp::from_slot(0), stranger)
            .unwrap();
        assert_eq!(none, None);
    }

    proptest! {
        #[test]
        fn prop_scheduling_is_pure(n in 1usize..30, reps in 1u32..20, slot in any::<u32>()) {
            let schedule = make_schedule(n);
            let rotation = ProducerRotation::new(reps).unwrap();
            let t = BlockTimestamp::from_slot(slot);

            let first = rotation.get_scheduled_producer(&schedule, t).unwrap().clone();
            let second = rotation.get_scheduled_producer(&schedule, t).unwrap().clone();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_index_in_range(n in 1usize..100, reps in 1u32..50, slot in any::<u32>()) {
            let index = scheduled_producer_index(slot, n, reps).unwrap();
            prop_assert!(index < n);
        }
    }
}
