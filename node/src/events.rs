// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Lifecycle and data events.
//!
//! The bus is a broadcast channel with no backpressure: `emit` never blocks, and
//! a slow subscriber lags (and loses events) instead of stalling the engine.
//! `close` drops the sender so every subscriber sees the end of the stream.

use std::sync::RwLock;

use graffiti_kernel::{Message, ReactionSnapshot};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

#[derive(Debug, Clone)]
pub enum CommentEvent {
    InitLoading(bool),
    PreviousLoading(bool),
    MessageReceived(Message),
    /// Full replacement of the reaction state, not a delta.
    ReactionsUpdated(ReactionSnapshot),
    RequestInitiated(Message),
    RequestUploaded(Message),
    RequestError { message: Message, error: String },
    CriticalError(String),
}

impl CommentEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CommentEvent::InitLoading(_) => "init-loading",
            CommentEvent::PreviousLoading(_) => "previous-loading",
            CommentEvent::MessageReceived(_) => "message-received",
            CommentEvent::ReactionsUpdated(_) => "reactions-updated",
            CommentEvent::RequestInitiated(_) => "request-initiated",
            CommentEvent::RequestUploaded(_) => "request-uploaded",
            CommentEvent::RequestError { .. } => "request-error",
            CommentEvent::CriticalError(_) => "critical-error",
        }
    }
}

#[derive(Debug)]
pub struct EventBus {
    tx: RwLock<Option<broadcast::Sender<CommentEvent>>>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx: RwLock::new(Some(tx)),
            capacity: capacity.max(1),
        }
    }

    /// Subscribing after `close` reopens the bus.
    pub fn subscribe(&self) -> broadcast::Receiver<CommentEvent> {
        let mut guard = self.tx.write().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = broadcast::channel(self.capacity);
                *guard = Some(tx);
                rx
            }
        }
    }

    pub fn stream(&self) -> BroadcastStream<CommentEvent> {
        BroadcastStream::new(self.subscribe())
    }

    pub fn emit(&self, event: CommentEvent) {
        let guard = self.tx.read().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = guard.as_ref() {
            // Ignore send errors (no subscribers)
            let _ = tx.send(event);
        }
    }

    /// Unsubscribe everyone.
    pub fn close(&self) {
        let mut guard = self.tx.write().unwrap_or_else(|e| e.into_inner());
        guard.take();
    }

    pub fn subscriber_count(&self) -> usize {
        let guard = self.tx.read().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().map(|tx| tx.receiver_count()).unwrap_or(0)
    }
}
