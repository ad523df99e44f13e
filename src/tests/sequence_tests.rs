use crate::sequence::SequencePointer;
use crate::types::id::SeqIndex;

/// A tracked session writing alone places its entries at 0, 1, 2, ...
#[test]
fn test_successive_writes_are_consecutive_from_zero() {
    let pointer = SequencePointer::new();
    let mut placed = Vec::new();
    for _ in 0..20 {
        let index = pointer.next_write_index();
        placed.push(index);
        assert!(pointer.advance_to(SeqIndex::new(index)));
    }
    let expected: Vec<u64> = (0..20).collect();
    assert_eq!(placed, expected);
}

#[test]
fn test_stale_observation_does_not_rewind() {
    let pointer = SequencePointer::new();
    pointer.advance_to(SeqIndex::new(8));
    // A poll that started before a verified write at 8 reports 6.
    pointer.advance_to(SeqIndex::new(6));
    assert_eq!(pointer.next_write_index(), 9);
}

#[test]
fn test_next_saturates_at_the_largest_index() {
    let top = SeqIndex::new(u64::MAX);
    assert_eq!(top.raw(), i64::MAX);
    assert_eq!(top.next(), i64::MAX as u64);

    let p = SequencePointer::seeded(top);
    assert_eq!(p.next_write_index(), i64::MAX as u64);
}
