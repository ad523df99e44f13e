// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Shared session context.
//!
//! Every component receives the same `Context` at construction instead of
//! reaching for process-wide singletons. It carries the storage handle, the
//! event bus and the delivery ledger.

use std::sync::{Arc, Mutex};

use graffiti_kernel::envelope::EntryPayload;
use graffiti_kernel::verify::verify_message;
use graffiti_kernel::{Message, MessageId, SeqIndex};
use rustc_hash::FxHashSet;

use crate::events::{CommentEvent, EventBus};
use crate::store::{Entry, SharedStore};
use crate::telemetry;

/// Ids of every message delivered this session. A message is emitted at most
/// once, whichever path (poll, backfill, history) reaches it first.
#[derive(Debug, Default)]
pub struct DeliveryLedger {
    seen: Mutex<FxHashSet<MessageId>>,
}

impl DeliveryLedger {
    /// True the first time `id` is offered.
    pub fn first_delivery(&self, id: &MessageId) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.insert(id.clone())
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        let seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.contains(id)
    }

    pub fn clear(&self) {
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.clear();
    }
}

#[derive(Clone)]
pub struct Context {
    pub store: SharedStore,
    pub events: Arc<EventBus>,
    pub ledger: Arc<DeliveryLedger>,
}

impl Context {
    pub fn new(store: SharedStore, events: Arc<EventBus>) -> Self {
        Self {
            store,
            events,
            ledger: Arc::new(DeliveryLedger::default()),
        }
    }

    /// Decodes a message slot. The slot index is authoritative for placement.
    /// Undecodable or unauthentic entries are dropped with a warning.
    pub fn decode_message(&self, entry: &Entry) -> Option<Message> {
        let msg = match EntryPayload::decode(&entry.payload).and_then(|p| p.into_message()) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Dropping undecodable entry at {}: {}", entry.index, e);
                metrics::increment_counter!(telemetry::MESSAGES_DROPPED);
                return None;
            }
        };
        if let Err(e) = verify_message(&msg) {
            tracing::warn!("Dropping entry {} at {}: {}", msg.id, entry.index, e);
            metrics::increment_counter!(telemetry::MESSAGES_DROPPED);
            return None;
        }
        Some(msg.with_index(SeqIndex::new(entry.index)))
    }

    /// Emits `message-received` unless this message was already delivered.
    pub fn deliver(&self, msg: &Message) -> bool {
        if !self.ledger.first_delivery(&msg.id) {
            tracing::debug!("Skipping already delivered message {}", msg.id);
            return false;
        }
        metrics::increment_counter!(telemetry::MESSAGES_RECEIVED);
        self.events.emit(CommentEvent::MessageReceived(msg.clone()));
        true
    }

    /// Decode and deliver; returns the message when it was emitted.
    pub fn deliver_entry(&self, entry: &Entry) -> Option<Message> {
        let msg = self.decode_message(entry)?;
        self.deliver(&msg).then_some(msg)
    }
}
