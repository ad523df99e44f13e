use crate::snapshot::ReactionSnapshot;
use crate::tests::fixtures::{identity, reaction, signed};
use crate::types::enums::MessageKind;
use crate::types::id::MessageId;

#[test]
fn test_merge_adds_then_toggles_off() {
    let alice = identity(1);
    let like = reaction(&alice, "r1", "m1", "+1", 10);

    let s1 = ReactionSnapshot::empty().merge(&like).unwrap();
    assert_eq!(s1.len(), 1);
    assert_eq!(s1.stamp, Some(like.stamp()));

    let unlike = reaction(&alice, "r2", "m1", "+1", 11);
    let s2 = s1.merge(&unlike).unwrap();
    assert!(s2.is_empty());
    assert_eq!(s2.stamp, Some(unlike.stamp()));
}

#[test]
fn test_snapshot_is_full_state() {
    let alice = identity(1);
    let bob = identity(2);
    let s = ReactionSnapshot::empty()
        .merge(&reaction(&alice, "r1", "m1", "+1", 1))
        .unwrap()
        .merge(&reaction(&bob, "r2", "m1", "+1", 2))
        .unwrap()
        .merge(&reaction(&bob, "r3", "m2", "heart", 3))
        .unwrap();

    let counts = s.counts_for(&MessageId::from("m1"));
    assert_eq!(counts.get("+1"), Some(&2));
    assert_eq!(s.counts_for(&MessageId::from("m2")).get("heart"), Some(&1));
    assert_eq!(s.reactions_for(&MessageId::from("m3")).count(), 0);
}

#[test]
fn test_merge_rejects_non_reaction() {
    let alice = identity(1);
    let text = signed(&alice, "m1", MessageKind::Text, None, "hi", 1);
    assert!(ReactionSnapshot::empty().merge(&text).is_err());
}

#[test]
fn test_retain_authentic_drops_forgeries_and_duplicates() {
    let alice = identity(1);
    let bob = identity(2);
    let good = reaction(&alice, "r1", "m1", "+1", 1);
    let mut forged = reaction(&bob, "r2", "m1", "+1", 2);
    forged.body = "-1".into();
    let dup = reaction(&alice, "r3", "m1", "+1", 3);

    let mut s = ReactionSnapshot {
        reactions: vec![good.clone(), forged, dup],
        stamp: None,
    };
    assert_eq!(s.retain_authentic(), 2);
    assert_eq!(s.reactions, vec![good]);
}
