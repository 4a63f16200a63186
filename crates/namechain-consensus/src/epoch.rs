//! Epoch clock
//!
//! Epoch windows and purchase periods are derived from the current height
//! alone; neither is persisted apart from the height it was computed for.
//!
//! ```text
//! zero                                     current
//!  │◄── length ──►│◄── length ──►│◄── length ──►│
//!  ├──────────────┼──────────────┼──────┬───────┤
//!                                 start  ▲     end
//! ```

use namechain_core::BlockHeight;
use serde::{Deserialize, Serialize};

/// An epoch window, recomputed per query
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochWindow {
    pub zero_height: BlockHeight,
    pub length_blocks: u64,
    pub start_height: BlockHeight,
    pub end_height: BlockHeight,
}

impl EpochWindow {
    /// Window for `current`, see [`epoch_boundaries`]
    pub fn for_height(current: BlockHeight, zero: BlockHeight, length: u64) -> Self {
        epoch_boundaries(current, zero, length)
    }

    /// Epoch index counted from the zero height
    pub fn index(&self) -> u64 {
        self.start_height.saturating_sub(self.zero_height) / self.length_blocks.max(1)
    }

    pub fn contains(&self, height: BlockHeight) -> bool {
        self.start_height <= height && height <= self.end_height
    }

    /// The window immediately after this one
    pub fn next(&self) -> Self {
        epoch_boundaries(
            self.end_height.saturating_add(1),
            self.zero_height,
            self.length_blocks,
        )
    }
}

/// Epoch boundaries for `current`:
///
/// `end = zero + length * (floor((current - zero) / length) + 1) - 1`,
/// `start = end + 1 - length`.
///
/// At `current == zero` the window is the second one, `[zero + length,
/// zero + 2 * length - 1]`, so the zero height lies outside its own window.
///
/// Heights below `zero` fall in the first window. Intermediate values are
/// widened to u128 and the end is clamped to `u64::MAX`.
pub fn epoch_boundaries(current: BlockHeight, zero: BlockHeight, length: u64) -> EpochWindow {
    let length_wide = length.max(1) as u128;
    let index = if current == zero {
        1
    } else {
        current.saturating_sub(zero) as u128 / length_wide
    };

    let end = (zero as u128 + length_wide * (index + 1) - 1).min(u64::MAX as u128);
    let start = (end + 1).saturating_sub(length_wide);

    EpochWindow {
        zero_height: zero,
        length_blocks: length,
        start_height: start as BlockHeight,
        end_height: end as BlockHeight,
    }
}

/// Period index of `height` counted from `period_zero`
pub fn period_at_height(height: BlockHeight, period_zero: BlockHeight, period_block_count: u64) -> u64 {
    height.saturating_sub(period_zero) / period_block_count.max(1)
}

/// Whether a periodic transition is due at `current`.
///
/// Never due at the zero height itself; otherwise due once the computed
/// period index strictly exceeds the stored one.
pub fn periodic_update_due(
    current: BlockHeight,
    period_zero: BlockHeight,
    period_block_count: u64,
    current_period: u64,
) -> bool {
    if current == period_zero {
        return false;
    }
    period_at_height(current, period_zero, period_block_count) > current_period
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_boundaries() {
        let cases = [
            ((1, 1, 1), (2, 2)),
            ((19, 2, 100), (2, 101)),
            ((34, 0, u64::MAX), (0, u64::MAX - 1)),
            ((5, 0, 720), (0, 719)),
        ];
        for ((current, zero, length), expected) in cases {
            let window = epoch_boundaries(current, zero, length);
            assert_eq!((window.start_height, window.end_height), expected);
        }
    }

    #[test]
    fn test_zero_height_lands_in_second_window() {
        let window = epoch_boundaries(100, 100, 10);
        assert_eq!((window.start_height, window.end_height), (110, 119));
        assert_eq!(window.index(), 1);
        assert!(!window.contains(100));

        // one block later the first window applies
        let window = epoch_boundaries(101, 100, 10);
        assert_eq!((window.start_height, window.end_height), (100, 109));
    }

    #[test]
    fn test_window_index_and_next() {
        let window = epoch_boundaries(1_500, 0, 720);
        assert_eq!(window.index(), 2);
        assert_eq!(window.start_height, 1_440);

        let next = window.next();
        assert_eq!(next.start_height, 2_160);
        assert_eq!(next.index(), 3);
    }

    #[test]
    fn test_update_not_due_at_zero_height() {
        assert!(!periodic_update_due(50, 50, 10, 0));
    }

    #[test]
    fn test_update_due_when_period_advances() {
        // period 0 covers 0..=9
        assert!(!periodic_update_due(9, 0, 10, 0));
        assert!(periodic_update_due(10, 0, 10, 0));
        assert!(!periodic_update_due(10, 0, 10, 1));
        assert!(periodic_update_due(35, 0, 10, 2));
    }

    #[test]
    fn test_heights_before_zero_saturate() {
        assert_eq!(period_at_height(3, 10, 5), 0);
        assert!(!periodic_update_due(3, 10, 5, 0));
        let window = epoch_boundaries(3, 10, 5);
        assert_eq!((window.start_height, window.end_height), (10, 14));
    }

    proptest! {
        #[test]
        fn window_has_length_and_contains_height(
            zero in 0u64..1_000_000,
            offset in 1u64..10_000_000,
            length in 1u64..100_000,
        ) {
            let current = zero + offset;
            let window = epoch_boundaries(current, zero, length);
            prop_assert_eq!(window.end_height - window.start_height + 1, length);
            prop_assert!(window.contains(current));
            prop_assert_eq!((window.start_height - zero) % length, 0);
        }

        #[test]
        fn update_due_matches_period_index(
            zero in 0u64..1_000,
            offset in 1u64..100_000,
            count in 1u64..1_000,
            stored in 0u64..200,
        ) {
            let current = zero + offset;
            let due = periodic_update_due(current, zero, count, stored);
            prop_assert_eq!(due, offset / count > stored);
        }
    }
}
