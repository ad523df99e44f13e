// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
#![allow(dead_code)]

use std::sync::Arc;

use graffiti_kernel::envelope::EntryPayload;
use graffiti_kernel::identity::{Identity, StreamId};
use graffiti_kernel::{Message, MessageId, MessageKind};
use graffiti_node::config::EngineConfig;
use graffiti_node::store::MemoryFeedStore;
use graffiti_node::{CommentEngine, CommentEvent};
use tokio::sync::broadcast;

pub const TOPIC: &str = "https://example.org/blog/post-1";

pub fn config() -> EngineConfig {
    let mut cfg = EngineConfig::for_topic(TOPIC);
    cfg.tip_retry_attempts = 2;
    cfg.tip_retry_delay_ms = 1;
    cfg.poll_interval_ms = 60_000;
    cfg
}

pub fn engine(store: &Arc<MemoryFeedStore>) -> CommentEngine {
    CommentEngine::new(config(), store.clone()).unwrap()
}

pub fn author(seed: u8) -> Identity {
    Identity::from_bytes(&[seed; 32])
}

pub fn signed(author: &Identity, id: &str, body: &str, ts: u64) -> Message {
    let mut msg = Message::draft(
        MessageId::from(id),
        author.address(),
        "someone",
        TOPIC,
        ts,
        MessageKind::Text,
        None,
        body,
    );
    author.sign_message(&mut msg).unwrap();
    msg
}

pub fn payload(msg: &Message) -> Vec<u8> {
    EntryPayload::Message(msg.clone()).encode().unwrap()
}

pub fn messages() -> StreamId {
    StreamId::messages(TOPIC)
}

pub fn reactions() -> StreamId {
    StreamId::reactions(TOPIC)
}

/// Fills `from..=to` of the message stream with `msg-{index}` entries.
pub async fn seed(store: &MemoryFeedStore, from: u64, to: u64) {
    let other = author(9);
    for i in from..=to {
        let msg = signed(&other, &format!("msg-{i}"), &format!("body {i}"), 1_000 + i);
        store.inject(&messages(), i, payload(&msg)).await;
    }
}

/// Everything currently buffered, without waiting.
pub fn drain(rx: &mut broadcast::Receiver<CommentEvent>) -> Vec<CommentEvent> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

pub fn received_ids(events: &[CommentEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            CommentEvent::MessageReceived(m) => Some(m.id.0.clone()),
            _ => None,
        })
        .collect()
}
