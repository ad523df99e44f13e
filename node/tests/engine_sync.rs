// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{author, drain, engine, messages, payload, received_ids, seed, signed, TOPIC};
use graffiti_kernel::{Message, MessageId, MessageKind, SeqIndex};
use graffiti_node::config::Checkpoint;
use graffiti_node::store::MemoryFeedStore;
use graffiti_node::{CommentEvent, EngineError};
use tokio::sync::broadcast::error::RecvError;

fn checkpoint(first: Option<u64>, latest: Option<u64>) -> Checkpoint {
    Checkpoint {
        first_index: first,
        latest_index: latest,
        reaction_index: None,
    }
}

fn reaction_checkpoint(index: u64) -> Checkpoint {
    Checkpoint {
        first_index: None,
        latest_index: None,
        reaction_index: Some(index),
    }
}

#[tokio::test]
async fn test_checkpoint_backfill_delivers_gap_once() {
    let store = Arc::new(MemoryFeedStore::new());
    seed(&store, 0, 13).await;
    let engine = engine(&store);
    let mut rx = engine.subscribe();

    engine.start_from(Some(checkpoint(Some(0), Some(10)))).await.unwrap();
    engine.poll_once().await;
    engine.poll_once().await;

    let mut ids = received_ids(&drain(&mut rx));
    ids.sort();
    assert_eq!(ids, vec!["msg-11", "msg-12", "msg-13"]);
    assert_eq!(engine.session().tracker.pointer(), SeqIndex::new(13));

    engine.stop().await;
}

#[tokio::test]
async fn test_poll_picks_up_new_entries() {
    let store = Arc::new(MemoryFeedStore::new());
    seed(&store, 0, 1).await;
    let engine = engine(&store);
    engine.start_from(Some(checkpoint(Some(0), Some(1)))).await.unwrap();
    let mut rx = engine.subscribe();

    seed(&store, 2, 4).await;
    engine.poll_once().await;

    let mut ids = received_ids(&drain(&mut rx));
    ids.sort();
    assert_eq!(ids, vec!["msg-2", "msg-3", "msg-4"]);
    engine.stop().await;
}

#[tokio::test]
async fn test_initial_page_without_checkpoint() {
    let store = Arc::new(MemoryFeedStore::new());
    seed(&store, 0, 11).await;
    let engine = engine(&store);
    let mut rx = engine.subscribe();

    engine.start().await.unwrap();

    let events = drain(&mut rx);
    assert!(matches!(events.first(), Some(CommentEvent::InitLoading(true))));
    assert!(events.iter().any(|e| matches!(e, CommentEvent::InitLoading(false))));
    let ids: HashSet<_> = received_ids(&events).into_iter().collect();
    let expected: HashSet<_> = (3..=11).map(|i| format!("msg-{i}")).collect();
    assert_eq!(ids, expected);

    assert_eq!(engine.session().history.cursor(), SeqIndex::new(3));
    assert_eq!(engine.session().tracker.pointer(), SeqIndex::new(11));
    assert!(engine.has_previous());
    engine.stop().await;
}

#[tokio::test]
async fn test_previous_pages_walk_to_start() {
    let store = Arc::new(MemoryFeedStore::new());
    seed(&store, 0, 20).await;
    let engine = engine(&store);
    engine.start_from(Some(checkpoint(Some(12), Some(20)))).await.unwrap();
    let mut rx = engine.subscribe();

    let page = engine.fetch_previous().await.unwrap();
    let indices: Vec<_> = page.iter().map(|m| m.sequence_index).collect();
    assert_eq!(indices, (3..=11).map(SeqIndex::new).collect::<Vec<_>>());
    assert_eq!(engine.session().history.cursor(), SeqIndex::new(3));
    assert!(engine.has_previous());

    let page = engine.fetch_previous().await.unwrap();
    assert_eq!(page.len(), 3);
    assert_eq!(engine.session().history.cursor(), SeqIndex::new(0));
    assert!(!engine.has_previous());

    assert!(engine.fetch_previous().await.unwrap().is_empty());

    let loading: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            CommentEvent::PreviousLoading(b) => Some(b),
            _ => None,
        })
        .collect();
    assert_eq!(loading, vec![true, false, true, false]);
    engine.stop().await;
}

#[tokio::test]
async fn test_short_page_clamps_at_zero_and_drops_forgeries() {
    let store = Arc::new(MemoryFeedStore::new());
    seed(&store, 0, 3).await;
    let mut forged = signed(&author(4), "msg-4", "original", 1);
    forged.body = "tampered".to_string();
    store.inject(&messages(), 4, payload(&forged)).await;
    seed(&store, 5, 6).await;

    let engine = engine(&store);
    engine.start_from(Some(checkpoint(Some(5), Some(6)))).await.unwrap();

    let page = engine.fetch_previous().await.unwrap();
    let indices: Vec<_> = page.iter().map(|m| m.sequence_index.raw()).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    assert_eq!(engine.session().history.cursor(), SeqIndex::new(0));
    assert!(!engine.has_previous());
    engine.stop().await;
}

#[tokio::test]
async fn test_fetch_previous_requires_start() {
    let store = Arc::new(MemoryFeedStore::new());
    let engine = engine(&store);
    assert!(matches!(engine.fetch_previous().await, Err(EngineError::NotRunning)));
}

#[tokio::test]
async fn test_tracker_failure_is_critical() {
    let store = Arc::new(MemoryFeedStore::new());
    let engine = engine(&store);
    let mut rx = engine.subscribe();

    store.fail_reads(10).await;
    let err = engine.start().await.unwrap_err();
    assert!(matches!(err, EngineError::Critical(_)));
    assert!(!engine.is_running());

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(e, CommentEvent::CriticalError(_))));
}

#[tokio::test]
async fn test_stop_resets_pointers_and_closes_events() {
    let store = Arc::new(MemoryFeedStore::new());
    seed(&store, 0, 5).await;
    let engine = engine(&store);
    engine.start().await.unwrap();
    let mut rx = engine.subscribe();

    engine.stop().await;

    assert!(matches!(rx.recv().await, Err(RecvError::Closed)));
    assert!(!engine.is_running());
    assert_eq!(engine.session().tracker.pointer(), SeqIndex::ABSENT);
    assert_eq!(engine.session().reactions.pointer(), SeqIndex::ABSENT);
    assert_eq!(engine.session().history.cursor(), SeqIndex::ABSENT);

    // A restart delivers the history again on a fresh subscription.
    let mut rx = engine.subscribe();
    engine.start().await.unwrap();
    assert_eq!(received_ids(&drain(&mut rx)).len(), 6);
    engine.stop().await;
}

#[tokio::test]
async fn test_double_start_is_rejected() {
    let store = Arc::new(MemoryFeedStore::new());
    let engine = engine(&store);
    engine.start().await.unwrap();
    assert!(matches!(engine.start().await, Err(EngineError::InvalidInput(_))));
    engine.stop().await;
}

#[tokio::test]
async fn test_reaction_write_then_refresh_converges() {
    let store = Arc::new(MemoryFeedStore::new());
    let alice = engine(&store);
    let target = MessageId::from("post");

    let sent = alice.send_reaction("+1", target.clone()).await.unwrap();
    assert_eq!(sent.sequence_index, SeqIndex::new(0));
    let written = alice.reaction_snapshot();

    alice.poll_once().await;
    alice.session().reactions.refresh(None).await.unwrap();
    assert_eq!(alice.reaction_snapshot(), written);
    assert_eq!(written.counts_for(&target).get("+1"), Some(&1));

    // Another session adopts the full snapshot on start.
    let bob = engine(&store);
    let mut rx = bob.subscribe();
    bob.start().await.unwrap();
    let adopted = drain(&mut rx)
        .into_iter()
        .find_map(|e| match e {
            CommentEvent::ReactionsUpdated(s) => Some(s),
            _ => None,
        })
        .unwrap();
    assert_eq!(adopted, written);

    // Bob's reaction lands on top of Alice's state.
    bob.send_reaction("+1", target.clone()).await.unwrap();
    assert_eq!(bob.reaction_snapshot().counts_for(&target).get("+1"), Some(&2));
    bob.stop().await;

    // Alice toggles hers off; the next snapshot keeps only Bob's.
    let toggled = alice.send_reaction("+1", target.clone()).await.unwrap();
    assert_eq!(toggled.sequence_index, SeqIndex::new(2));
    let snapshot = alice.reaction_snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.reactions[0].author, bob.address());
}

#[tokio::test]
async fn test_reaction_collision_is_reported() {
    let store = Arc::new(MemoryFeedStore::new());
    let engine = engine(&store);

    store
        .hijack_next_write(payload(&signed(&author(3), "rival", "x", 5)))
        .await;
    let err = engine
        .send_reaction("+1", MessageId::from("post"))
        .await
        .unwrap_err();
    assert!(err.is_collision());
    assert_eq!(engine.session().reactions.pointer(), SeqIndex::ABSENT);
}

#[tokio::test]
async fn test_failed_backfill_keeps_pointer_at_tip() {
    let store = Arc::new(MemoryFeedStore::new());
    seed(&store, 0, 13).await;
    let engine = engine(&store);
    let mut rx = engine.subscribe();

    store.fail_range_reads(1).await;
    let result = engine.session().tracker.init(Some(SeqIndex::new(10))).await;
    assert!(result.is_err());

    // The gap read failed; the tip itself was still delivered and kept.
    assert_eq!(engine.session().tracker.pointer(), SeqIndex::new(13));
    assert_eq!(received_ids(&drain(&mut rx)), vec!["msg-13"]);
}

#[tokio::test]
async fn test_reaction_checkpoint_keeps_existing_reactions() {
    let store = Arc::new(MemoryFeedStore::new());
    let target = MessageId::from("post");

    let alice = engine(&store);
    let bob = engine(&store);
    alice.send_reaction("+1", target.clone()).await.unwrap();
    let sent = bob.send_reaction("heart", target.clone()).await.unwrap();
    assert_eq!(sent.sequence_index, SeqIndex::new(1));
    let before = bob.reaction_snapshot();
    assert_eq!(before.len(), 2);

    // Carol resumes from the snapshot she already holds.
    let carol = engine(&store);
    carol.start_from(Some(reaction_checkpoint(1))).await.unwrap();
    assert_eq!(carol.reaction_snapshot(), before);
    assert_eq!(carol.session().reactions.pointer(), SeqIndex::new(1));

    let wow = carol.send_reaction("wow", target.clone()).await.unwrap();
    assert_eq!(wow.sequence_index, SeqIndex::new(2));
    carol.stop().await;

    let dave = engine(&store);
    dave.session().reactions.refresh(None).await.unwrap();
    let counts = dave.reaction_snapshot().counts_for(&target);
    assert_eq!(counts.len(), 3);
    for body in ["+1", "heart", "wow"] {
        assert_eq!(counts.get(body), Some(&1), "missing {body}");
    }
}

#[tokio::test]
async fn test_unloaded_reaction_checkpoint_refuses_blind_merge() {
    let store = Arc::new(MemoryFeedStore::new());
    let target = MessageId::from("post");
    let alice = engine(&store);
    alice.send_reaction("+1", target.clone()).await.unwrap();

    let carol = engine(&store);
    let reactions = &carol.session().reactions;
    store.fail_reads(1).await;
    assert!(reactions.init(Some(SeqIndex::new(0))).await.is_err());

    let mut reaction = Message::draft(
        MessageId::from("carol-1"),
        author(5).address(),
        "carol",
        TOPIC,
        2_000,
        MessageKind::Reaction,
        Some(target.clone()),
        "wow",
    );
    author(5).sign_message(&mut reaction).unwrap();
    assert!(matches!(
        reactions.prepare_write(None, &reaction),
        Err(EngineError::InvalidInput(_))
    ));

    // The next refresh loads the checkpoint snapshot and the merge goes ahead.
    reactions.refresh(None).await.unwrap();
    let (snapshot, index) = reactions.prepare_write(None, &reaction).unwrap();
    assert_eq!(index, 1);
    assert_eq!(snapshot.counts_for(&target).len(), 2);
}
