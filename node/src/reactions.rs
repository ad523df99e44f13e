// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Reaction aggregation.
//!
//! The reaction stream holds full snapshots, so the aggregator only ever reads
//! the tip. Two indices are tracked:
//! - `pointer`: highest slot known to be occupied; writes target `pointer + 1`
//!   (or the first slot on an empty stream)
//! - `consumed`: highest slot whose snapshot this session has adopted, either
//!   by reading it or by writing it
//!
//! After a refresh the pointer is set to `next_free - 1`, i.e. one behind the
//! slot a write would target. The pointer only ever moves forward, so a poll
//! that started before a send resynced cannot rewind the send's view. This
//! path has no in-flight guard: snapshots are whole-state and a reaction send
//! may interleave with a reaction poll.
//!
//! Seeding from a checkpoint reads the snapshot at that slot, so a write merges
//! into the state the stream already holds. Until that read succeeds every
//! refresh retries it and writes are refused.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use graffiti_kernel::config::FIRST_INDEX;
use graffiti_kernel::envelope::EntryPayload;
use graffiti_kernel::identity::StreamId;
use graffiti_kernel::sequence::SequencePointer;
use graffiti_kernel::{Message, ReactionSnapshot, SeqIndex};

use crate::context::Context;
use crate::errors::{EngineError, EngineResult};
use crate::events::CommentEvent;
use crate::telemetry;

pub struct ReactionAggregator {
    ctx: Context,
    stream: StreamId,
    pointer: SequencePointer,
    consumed: SequencePointer,
    current: Mutex<ReactionSnapshot>,
    /// `current` holds the snapshot at `consumed`.
    base_loaded: AtomicBool,
}

impl ReactionAggregator {
    pub fn new(ctx: Context, stream: StreamId) -> Self {
        Self {
            ctx,
            stream,
            pointer: SequencePointer::new(),
            consumed: SequencePointer::new(),
            current: Mutex::new(ReactionSnapshot::empty()),
            base_loaded: AtomicBool::new(true),
        }
    }

    pub fn stream(&self) -> &StreamId {
        &self.stream
    }

    pub fn pointer(&self) -> SeqIndex {
        self.pointer.get()
    }

    /// Latest adopted snapshot.
    pub fn snapshot(&self) -> ReactionSnapshot {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// With a checkpoint the caller already holds the state up to it: seed both
    /// indices, skip tip discovery and load the snapshot at the checkpoint slot
    /// as the merge base. Otherwise refresh from the stream.
    pub async fn init(&self, checkpoint: Option<SeqIndex>) -> EngineResult<u64> {
        if let Some(cp) = checkpoint {
            self.pointer.advance_to(cp);
            self.consumed.advance_to(cp);
            self.base_loaded.store(false, Ordering::Release);
            tracing::info!("Reaction stream {} seeded from checkpoint {}", self.stream, cp);
            self.load_base().await?;
            return Ok(self.pointer.next_write_index());
        }
        self.refresh(None).await
    }

    /// Reads the snapshot at `consumed` into `current`, once per seeding.
    async fn load_base(&self) -> EngineResult<()> {
        if self.base_loaded.load(Ordering::Acquire) {
            return Ok(());
        }
        let Some(slot) = self.consumed.get().get() else {
            self.base_loaded.store(true, Ordering::Release);
            return Ok(());
        };

        let snapshot = match self.ctx.store.read_entry(&self.stream, slot).await? {
            Some(entry) => match EntryPayload::decode(&entry.payload).and_then(|p| p.into_reactions()) {
                Ok(mut snapshot) => {
                    snapshot.retain_authentic();
                    snapshot
                }
                Err(e) => {
                    tracing::warn!("Undecodable reaction snapshot at checkpoint {}: {}", slot, e);
                    ReactionSnapshot::empty()
                }
            },
            None => {
                tracing::warn!("Reaction checkpoint {} is vacant on {}", slot, self.stream);
                ReactionSnapshot::empty()
            }
        };

        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        // A refresh may have adopted a newer tip while the slot was read.
        if !self.base_loaded.swap(true, Ordering::AcqRel) {
            *current = snapshot;
        }
        Ok(())
    }

    /// Reads the tip and returns the next free slot.
    ///
    /// A tip beyond everything consumed (and at or after `after_index`, when
    /// given) is adopted whole and emitted once as `ReactionsUpdated`. A failed
    /// read leaves both indices unchanged.
    pub async fn refresh(&self, after_index: Option<u64>) -> EngineResult<u64> {
        self.load_base().await?;
        let Some(entry) = self.ctx.store.read_tip(&self.stream).await? else {
            return Ok(FIRST_INDEX);
        };
        let observed = SeqIndex::new(entry.index);
        let next_free = entry.index.saturating_add(1);

        let is_new = observed > self.consumed.get() && after_index.map_or(true, |after| entry.index >= after);
        if is_new {
            match EntryPayload::decode(&entry.payload).and_then(|p| p.into_reactions()) {
                Ok(mut snapshot) => {
                    let dropped = snapshot.retain_authentic();
                    if dropped > 0 {
                        tracing::warn!("Dropped {} invalid reactions from snapshot {}", dropped, entry.index);
                        metrics::counter!(telemetry::MESSAGES_DROPPED, dropped as u64);
                    }
                    // A concurrent refresh may have adopted a newer slot meanwhile.
                    if self.consumed.advance_to(observed) {
                        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
                        *current = snapshot.clone();
                        self.base_loaded.store(true, Ordering::Release);
                        drop(current);
                        metrics::increment_counter!(telemetry::REACTION_SNAPSHOTS);
                        self.ctx.events.emit(CommentEvent::ReactionsUpdated(snapshot));
                    }
                }
                Err(e) => {
                    tracing::warn!("Ignoring undecodable reaction snapshot at {}: {}", entry.index, e);
                    self.consumed.advance_to(observed);
                }
            }
        }

        self.pointer.advance_to(SeqIndex::new(next_free - 1));
        metrics::gauge!(telemetry::REACTION_TIP, self.pointer.get().raw() as f64);
        Ok(next_free)
    }

    /// Folds `reaction` into `prior` (or the adopted snapshot) and picks the
    /// target slot. The reaction is placed at that slot inside the snapshot.
    ///
    /// Without `prior`, a seeded aggregator whose checkpoint snapshot was never
    /// loaded refuses the write: merging into an empty base would erase the
    /// stream's existing reactions.
    pub fn prepare_write(
        &self,
        prior: Option<&ReactionSnapshot>,
        reaction: &Message,
    ) -> EngineResult<(ReactionSnapshot, u64)> {
        let target = self.pointer.next_write_index();
        let base = match prior {
            Some(p) => p.clone(),
            None if !self.base_loaded.load(Ordering::Acquire) => {
                return Err(EngineError::InvalidInput(format!(
                    "reaction state at checkpoint {} not loaded",
                    self.consumed.get()
                )));
            }
            None => self.snapshot(),
        };
        let placed = reaction.clone().with_index(SeqIndex::new(target));
        let snapshot = base.merge(&placed)?;
        Ok((snapshot, target))
    }

    /// A verified write: adopt our snapshot and move both indices to the slot.
    pub fn record_write(&self, index: u64, snapshot: ReactionSnapshot) {
        let slot = SeqIndex::new(index);
        self.pointer.advance_to(slot);
        if self.consumed.advance_to(slot) {
            let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
            *current = snapshot;
            self.base_loaded.store(true, Ordering::Release);
        }
        metrics::gauge!(telemetry::REACTION_TIP, self.pointer.get().raw() as f64);
    }

    pub fn reset(&self) {
        self.pointer.reset();
        self.consumed.reset();
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = ReactionSnapshot::empty();
        self.base_loaded.store(true, Ordering::Release);
    }
}
