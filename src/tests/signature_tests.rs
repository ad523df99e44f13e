use crate::error::KernelError;
use crate::tests::fixtures::{identity, signed};
use crate::types::enums::MessageKind;
use crate::types::id::{Address, SeqIndex};
use crate::verify::{is_authentic, verify_message, Verdict};

#[test]
fn test_signed_message_verifies() {
    let alice = identity(1);
    let msg = signed(&alice, "m1", MessageKind::Text, None, "hi", 1);
    assert_eq!(verify_message(&msg), Ok(Verdict::Signed));
}

#[test]
fn test_placement_does_not_affect_authenticity() {
    let alice = identity(1);
    let msg = signed(&alice, "m1", MessageKind::Text, None, "hi", 1).with_index(SeqIndex::new(99));
    assert!(is_authentic(&msg));
}

#[test]
fn test_claimed_author_must_match_key() {
    let alice = identity(1);
    let bob = identity(2);
    let mut msg = signed(&alice, "m1", MessageKind::Text, None, "hi", 1);
    msg.author = bob.address();
    assert!(matches!(verify_message(&msg), Err(KernelError::AuthorMismatch { .. })));
}

#[test]
fn test_tampered_body_rejected() {
    let alice = identity(1);
    let mut msg = signed(&alice, "m1", MessageKind::Text, None, "hi", 1);
    msg.body = "bye".into();
    assert_eq!(verify_message(&msg), Err(KernelError::SignatureMismatch));
}

#[test]
fn test_malformed_signature_rejected() {
    let alice = identity(1);
    let mut msg = signed(&alice, "m1", MessageKind::Text, None, "hi", 1);
    msg.signature.truncate(10);
    assert_eq!(verify_message(&msg), Err(KernelError::MalformedSignature(10)));
}

#[test]
fn test_legacy_always_accepted() {
    let alice = identity(1);
    let mut msg = signed(&alice, "m1", MessageKind::Text, None, "hi", 1);
    msg.signature.clear();
    msg.author = Address("0xdeadbeef".into());
    msg.legacy = true;
    assert_eq!(verify_message(&msg), Ok(Verdict::Legacy));
}

#[test]
fn test_cannot_sign_for_someone_else() {
    let alice = identity(1);
    let bob = identity(2);
    let mut msg = signed(&alice, "m1", MessageKind::Text, None, "hi", 1);
    msg.author = bob.address();
    assert!(alice.sign_message(&mut msg).is_err());
}
