// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Sequence pointers.
//!
//! A pointer is the highest index of a stream this session knows about. It is
//! monotonically non-decreasing for the lifetime of a session: every update goes
//! through `advance_to`, which never lowers it. Only `reset` (session stop)
//! moves it back to absent.

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::types::id::SeqIndex;

#[derive(Debug)]
pub struct SequencePointer(AtomicI64);

impl SequencePointer {
    pub fn new() -> Self {
        Self::seeded(SeqIndex::ABSENT)
    }

    pub fn seeded(index: SeqIndex) -> Self {
        Self(AtomicI64::new(index.raw()))
    }

    pub fn get(&self) -> SeqIndex {
        // Values stored are always >= -1.
        SeqIndex::from_raw(self.0.load(Ordering::Acquire)).unwrap_or(SeqIndex::ABSENT)
    }

    /// `pointer == -1 ? 0 : pointer + 1`
    pub fn next_write_index(&self) -> u64 {
        self.get().next()
    }

    /// Raises the pointer to `index` if that is higher. Returns whether it moved.
    pub fn advance_to(&self, index: SeqIndex) -> bool {
        let prev = self.0.fetch_max(index.raw(), Ordering::AcqRel);
        prev < index.raw()
    }

    pub fn reset(&self) {
        self.0.store(SeqIndex::ABSENT.raw(), Ordering::Release);
    }
}

impl Default for SequencePointer {
    fn default() -> Self {
        Self::new()
    }
}

/// Slots written between a trusted checkpoint and the observed tip:
/// `(prior, tip]`, or `None` when the tip is not ahead.
pub fn backfill_range(prior: SeqIndex, tip: u64) -> Option<RangeInclusive<u64>> {
    let start = prior.next();
    if start > tip {
        None
    } else {
        Some(start..=tip)
    }
}
