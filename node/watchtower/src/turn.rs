use std::num::NonZeroU64;

use stader_basic_types::{Address, L1BlockNumber};

/// Round-robin assignment of block windows to trusted members.
///
/// Each window of `window_blocks` consecutive blocks belongs to a single member, in the order
/// of the member list. The verdict is a pure function of its inputs, so members agree on whose
/// turn it is as long as they see the same block and the same member list. If they don't,
/// two members may act in the same window (or none at all); the contracts driven by this
/// scheduler treat late or repeated submissions as no-ops.
#[derive(Debug, Clone, Copy)]
pub struct TurnScheduler {
    window_blocks: NonZeroU64,
}

impl TurnScheduler {
    pub fn new(window_blocks: NonZeroU64) -> Self {
        Self { window_blocks }
    }

    /// Index of the member acting at `block`, or `None` for an empty member set.
    pub fn turn_index(&self, member_count: usize, block: L1BlockNumber) -> Option<usize> {
        if member_count == 0 {
            return None;
        }
        let window = block.0 / self.window_blocks.get();
        Some((window % member_count as u64) as usize)
    }

    /// Checks whether `node` acts at `block`. A node missing from `members` never acts.
    pub fn is_my_turn(&self, members: &[Address], node: Address, block: L1BlockNumber) -> bool {
        let Some(my_index) = members.iter().position(|&member| member == node) else {
            return false;
        };
        self.turn_index(members.len(), block) == Some(my_index)
    }
}

#[cfg(test)]
mod tests {
    use test_casing::{test_casing, Product};

    use super::*;

    const WINDOW: NonZeroU64 = match NonZeroU64::new(75) {
        Some(window) => window,
        None => unreachable!(),
    };

    fn members(count: u64) -> Vec<Address> {
        (1..=count).map(Address::from_low_u64_be).collect()
    }

    #[test]
    fn turn_index_example() {
        let scheduler = TurnScheduler::new(WINDOW);
        assert_eq!(scheduler.turn_index(4, L1BlockNumber(224)), Some(2));

        let members = members(4);
        for (index, &member) in members.iter().enumerate() {
            let is_my_turn = scheduler.is_my_turn(&members, member, L1BlockNumber(224));
            assert_eq!(is_my_turn, index == 2, "member #{index}");
        }
    }

    #[test]
    fn empty_member_set_has_no_turns() {
        let scheduler = TurnScheduler::new(WINDOW);
        assert_eq!(scheduler.turn_index(0, L1BlockNumber(1_000)), None);
        assert!(!scheduler.is_my_turn(&[], Address::zero(), L1BlockNumber(1_000)));
    }

    #[test]
    fn absent_node_never_acts() {
        let scheduler = TurnScheduler::new(WINDOW);
        let members = members(3);
        let outsider = Address::repeat_byte(0xff);
        for block in (0..1_000).step_by(25) {
            assert!(!scheduler.is_my_turn(&members, outsider, L1BlockNumber(block)));
        }
    }

    #[test]
    fn first_occurrence_of_duplicate_member_wins() {
        let scheduler = TurnScheduler::new(WINDOW);
        let node = Address::repeat_byte(1);
        let members = [node, Address::repeat_byte(2), node];
        assert!(scheduler.is_my_turn(&members, node, L1BlockNumber(0)));
        assert!(!scheduler.is_my_turn(&members, node, L1BlockNumber(150)));
    }

    #[test_casing(9, Product(([1_u64, 4, 7], [0_u64, 74, 5_000])))]
    #[test]
    fn verdict_is_constant_within_window(member_count: u64, window_start: u64) {
        let scheduler = TurnScheduler::new(WINDOW);
        let members = members(member_count);
        let window_start = window_start / 75 * 75;

        for &member in &members {
            let first = scheduler.is_my_turn(&members, member, L1BlockNumber(window_start));
            for offset in 0..75 {
                let block = L1BlockNumber(window_start + offset);
                assert_eq!(scheduler.is_my_turn(&members, member, block), first);
            }
        }

        // Exactly one member acts in each window.
        let actors = members
            .iter()
            .filter(|&&member| scheduler.is_my_turn(&members, member, L1BlockNumber(window_start)))
            .count();
        assert_eq!(actors, 1);
    }

    #[test]
    fn turns_rotate_between_windows() {
        let scheduler = TurnScheduler::new(WINDOW);
        let turns: Vec<_> = (0..6)
            .map(|window| scheduler.turn_index(4, L1BlockNumber(window * 75 + 10)))
            .collect();
        assert_eq!(
            turns,
            [Some(0), Some(1), Some(2), Some(3), Some(0), Some(1)]
        );
    }
}
