use crate::envelope::EntryPayload;
use crate::error::KernelError;
use crate::snapshot::ReactionSnapshot;
use crate::tests::fixtures::{identity, reaction, signed};
use crate::types::enums::MessageKind;
use crate::types::id::SeqIndex;

#[test]
fn test_message_payload_survives_framing() {
    let alice = identity(1);
    let msg = signed(&alice, "m1", MessageKind::Thread, Some("m0"), "reply", 5).with_index(SeqIndex::new(3));
    let bytes = EntryPayload::Message(msg.clone()).encode().unwrap();
    assert_eq!(&bytes[0..4], b"GFT1");
    let decoded = EntryPayload::decode(&bytes).unwrap().into_message().unwrap();
    assert_eq!(decoded, msg);
}

#[test]
fn test_snapshot_stamp_is_producing_reaction() {
    let alice = identity(1);
    let r = reaction(&alice, "r1", "m1", "+1", 7);
    let snap = ReactionSnapshot::empty().merge(&r).unwrap();
    let payload = EntryPayload::decode(&EntryPayload::Reactions(snap).encode().unwrap()).unwrap();
    assert_eq!(payload.stamp(), Some(r.stamp()));
}

#[test]
fn test_corruption_detected() {
    let alice = identity(1);
    let msg = signed(&alice, "m1", MessageKind::Text, None, "hello", 5);
    let mut bytes = EntryPayload::Message(msg).encode().unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    assert!(matches!(EntryPayload::decode(&bytes), Err(KernelError::Decode(_))));

    assert!(EntryPayload::decode(b"GFT1").is_err());
    assert!(EntryPayload::decode(b"XXXX00000000body").is_err());
}

#[test]
fn test_kind_mismatch() {
    let payload = EntryPayload::Reactions(ReactionSnapshot::empty());
    assert!(payload.clone().into_message().is_err());
    assert!(payload.into_reactions().is_ok());
}
