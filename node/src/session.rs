// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::sync::atomic::{AtomicUsize, Ordering};

use graffiti_kernel::identity::StreamId;

use crate::config::EngineConfig;
use crate::context::Context;
use crate::history::HistoryPaginator;
use crate::reactions::ReactionAggregator;
use crate::tracker::SequenceTracker;
use crate::verifier::WriteVerifier;

/// Per-topic components, shared between the send path and the poll loop.
pub struct Session {
    pub ctx: Context,
    pub tracker: SequenceTracker,
    pub reactions: ReactionAggregator,
    pub history: HistoryPaginator,
    pub verifier: WriteVerifier,
    writes_in_flight: AtomicUsize,
}

impl Session {
    pub fn new(ctx: Context, config: &EngineConfig) -> Self {
        let messages = StreamId::messages(&config.topic);
        let reactions = StreamId::reactions(&config.topic);
        Self {
            tracker: SequenceTracker::new(ctx.clone(), messages.clone(), config.tip_retry()),
            reactions: ReactionAggregator::new(ctx.clone(), reactions),
            history: HistoryPaginator::new(ctx.clone(), messages, config.page_width),
            verifier: WriteVerifier::new(ctx.store.clone()),
            ctx,
            writes_in_flight: AtomicUsize::new(0),
        }
    }

    /// True while a text/thread write is between tip resync and verification.
    /// The poll loop skips its message-tip refresh meanwhile.
    pub fn write_in_flight(&self) -> bool {
        self.writes_in_flight.load(Ordering::Acquire) > 0
    }

    /// Marks a message-stream write in flight until the guard drops, whatever
    /// the outcome.
    pub fn begin_write(&self) -> InFlightGuard<'_> {
        self.writes_in_flight.fetch_add(1, Ordering::AcqRel);
        InFlightGuard(&self.writes_in_flight)
    }

    /// Session stop: every pointer back to absent, ledger cleared.
    pub fn reset(&self) {
        self.tracker.reset();
        self.reactions.reset();
        self.history.reset();
        self.ctx.ledger.clear();
    }
}

pub struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
