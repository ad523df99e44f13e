// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Storage collaborator.
//!
//! The engine reaches the storage substrate only through [`FeedStore`]. The
//! substrate is conflict-blind: a write to an occupied slot is not an error at
//! write time, and "no entry" is reported as `None`, never as an error.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use graffiti_kernel::identity::{SlotWrite, StreamId};
use serde::{Deserialize, Serialize};

use crate::errors::EngineResult;

pub use memory::MemoryFeedStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub index: u64,
    pub payload: Vec<u8>,
}

/// Acknowledgement of an upload. Says nothing about who holds the slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub stream: StreamId,
    pub index: u64,
    /// BLAKE3 hex of the uploaded payload.
    pub reference: String,
}

impl Receipt {
    pub fn for_write(write: &SlotWrite) -> Self {
        Self {
            stream: write.stream.clone(),
            index: write.index,
            reference: blake3::hash(&write.payload).to_hex().to_string(),
        }
    }
}

#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Highest occupied slot, or `None` for an empty stream.
    async fn read_tip(&self, stream: &StreamId) -> EngineResult<Option<Entry>>;

    async fn read_entry(&self, stream: &StreamId, index: u64) -> EngineResult<Option<Entry>>;

    /// Occupied slots in `from..=to`, ascending. Vacant slots are skipped.
    async fn read_range(&self, stream: &StreamId, from: u64, to: u64) -> EngineResult<Vec<Entry>>;

    async fn write_entry(&self, write: &SlotWrite) -> EngineResult<Receipt>;
}

pub type SharedStore = Arc<dyn FeedStore>;
