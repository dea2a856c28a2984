//! Property tests for the history window invariants.

use myolink_core::HistoryBuffer;
use proptest::prelude::*;

proptest! {
    /// For any max >= 1 and any push sequence, the snapshot never exceeds
    /// max and its first element is the most recent push.
    #[test]
    fn bounded_and_newest_first(max in 1usize..64, pushes in proptest::collection::vec(any::<i32>(), 0..256)) {
        let mut buf = HistoryBuffer::new(max);
        for &v in &pushes {
            buf.push(v);
        }

        let snap = buf.snapshot();
        prop_assert!(snap.len() <= max);
        prop_assert_eq!(snap.len(), pushes.len().min(max));
        if let Some(&last) = pushes.last() {
            prop_assert_eq!(snap[0], last);
        }
    }

    /// The window always equals the suffix of pushes, reversed.
    #[test]
    fn window_is_reversed_suffix(max in 1usize..32, pushes in proptest::collection::vec(any::<i16>(), 1..128)) {
        let mut buf = HistoryBuffer::new(max);
        for &v in &pushes {
            buf.push(v);
        }

        let expected: Vec<i16> = pushes
            .iter()
            .rev()
            .take(max)
            .copied()
            .collect();
        prop_assert_eq!(buf.snapshot(), expected);
    }

    /// Snapshot is idempotent between pushes.
    #[test]
    fn snapshot_idempotent(max in 0usize..16, pushes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let mut buf = HistoryBuffer::new(max);
        for &v in &pushes {
            buf.push(v);
        }
        prop_assert_eq!(buf.snapshot(), buf.snapshot());
    }
}
