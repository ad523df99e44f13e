// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Sequence Tracker - message stream tip management
//!
//! Owns the locally known tip of the message stream.
//!
//! # Semantics
//! - pointer = highest message index this session has observed or written
//! - next write index = `pointer == -1 ? 0 : pointer + 1`
//! - the pointer only moves forward (see `SequencePointer`)
//!
//! # Flow
//! 1. init() - seed from a checkpoint, then one authoritative tip read (with retry)
//! 2. refresh_tip() - poll: read the tip, deliver everything past the pointer
//! 3. record_write() - a verified write moves the pointer to its slot

use graffiti_kernel::identity::StreamId;
use graffiti_kernel::sequence::{backfill_range, SequencePointer};
use graffiti_kernel::{Message, SeqIndex};

use crate::context::Context;
use crate::errors::EngineResult;
use crate::retry::{retry, RetryPolicy};
use crate::store::Entry;
use crate::telemetry;

pub struct SequenceTracker {
    ctx: Context,
    stream: StreamId,
    pointer: SequencePointer,
    retry: RetryPolicy,
}

impl SequenceTracker {
    pub fn new(ctx: Context, stream: StreamId, retry: RetryPolicy) -> Self {
        Self {
            ctx,
            stream,
            pointer: SequencePointer::new(),
            retry,
        }
    }

    pub fn stream(&self) -> &StreamId {
        &self.stream
    }

    pub fn pointer(&self) -> SeqIndex {
        self.pointer.get()
    }

    pub fn next_write_index(&self) -> u64 {
        self.pointer.next_write_index()
    }

    /// Seeds the pointer and performs the authoritative tip read.
    ///
    /// With a checkpoint, everything between it and the authoritative tip was
    /// missed while offline and is backfilled. Without one, the pointer is simply
    /// set to the tip; the history paginator delivers the newest page.
    ///
    /// Tip discovery retries with the configured budget; exhaustion is returned.
    pub async fn init(&self, checkpoint: Option<SeqIndex>) -> EngineResult<SeqIndex> {
        if let Some(cp) = checkpoint {
            self.pointer.advance_to(cp);
            tracing::info!("Message stream {} seeded from checkpoint {}", self.stream, cp);
        }

        let store = self.ctx.store.clone();
        let stream = self.stream.clone();
        let tip = retry(&self.retry, || {
            let store = store.clone();
            let stream = stream.clone();
            async move { store.read_tip(&stream).await }
        })
        .await?;

        match tip {
            None => tracing::info!("Message stream {} is empty", self.stream),
            Some(entry) if checkpoint.is_some() => {
                let prior = self.pointer.get();
                let recovered = self.backfill_from(prior, entry).await?;
                if recovered > 0 {
                    tracing::info!("Backfilled {} messages missed since checkpoint {}", recovered, prior);
                }
            }
            Some(entry) => {
                self.pointer.advance_to(SeqIndex::new(entry.index));
            }
        }
        self.publish_tip();
        Ok(self.pointer.get())
    }

    /// Reads the current tip once and delivers every entry past the pointer.
    ///
    /// Returns the message observed at the tip, if it decoded. A failed read is
    /// returned to the caller; the pointer is untouched.
    pub async fn refresh_tip(&self) -> EngineResult<Option<Message>> {
        let Some(entry) = self.ctx.store.read_tip(&self.stream).await? else {
            return Ok(None);
        };
        let observed = self.ctx.decode_message(&entry);
        let prior = self.pointer.get();
        if SeqIndex::new(entry.index) > prior {
            self.backfill_from(prior, entry).await?;
            self.publish_tip();
        }
        Ok(observed)
    }

    /// Delivers every message in `(prior, tip.index]` exactly once.
    ///
    /// The pointer moves to the tip before the range is fetched; a failed range
    /// read is reported without rolling that back. Returns the number delivered.
    pub async fn backfill_from(&self, prior: SeqIndex, tip: Entry) -> EngineResult<usize> {
        let Some(range) = backfill_range(prior, tip.index) else {
            return Ok(0);
        };
        self.pointer.advance_to(SeqIndex::new(tip.index));

        let mut delivered = 0;
        let gap = if *range.start() < tip.index {
            Some(
                self.ctx
                    .store
                    .read_range(&self.stream, *range.start(), tip.index - 1)
                    .await,
            )
        } else {
            None
        };

        let mut failure = None;
        match gap {
            Some(Ok(entries)) => {
                let expected = tip.index - *range.start();
                if (entries.len() as u64) < expected {
                    tracing::warn!(
                        "Backfill of {}..{} returned {} of {} entries",
                        range.start(),
                        tip.index - 1,
                        entries.len(),
                        expected
                    );
                }
                for entry in entries.iter().filter(|e| range.contains(&e.index)) {
                    if self.ctx.deliver_entry(entry).is_some() {
                        delivered += 1;
                    }
                }
            }
            Some(Err(e)) => {
                tracing::warn!("Backfill of {}..{} failed: {}", range.start(), tip.index - 1, e);
                failure = Some(e);
            }
            None => {}
        }

        if self.ctx.deliver_entry(&tip).is_some() {
            delivered += 1;
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(delivered),
        }
    }

    /// A verified write: the slot is ours, move the pointer to it.
    pub fn record_write(&self, msg: &Message) {
        self.pointer.advance_to(msg.sequence_index);
        self.ctx.ledger.first_delivery(&msg.id);
        self.publish_tip();
    }

    pub fn reset(&self) {
        self.pointer.reset();
    }

    fn publish_tip(&self) {
        metrics::gauge!(telemetry::MESSAGE_TIP, self.pointer.get().raw() as f64);
    }
}
