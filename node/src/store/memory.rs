// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! In-memory feed store.
//!
//! Backs the local storage node and the engine tests. Slots are
//! first-writer-wins: a later write to an occupied slot is acknowledged but never
//! becomes visible, which is exactly how a concurrent writer on the shared topic
//! key looks from the losing side.
//!
//! Fault hooks (`fail_reads`, `fail_range_reads`, `fail_writes`, `drop_writes`, `hijack_next_write`)
//! let tests reproduce transport failures and collisions deterministically.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use graffiti_kernel::identity::{SlotWrite, StreamId};
use tokio::sync::Mutex;

use crate::errors::{EngineError, EngineResult};
use crate::store::{Entry, FeedStore, Receipt};

#[derive(Default)]
struct Inner {
    streams: HashMap<StreamId, BTreeMap<u64, Vec<u8>>>,
    fail_reads: u32,
    fail_range_reads: u32,
    fail_writes: u32,
    drop_writes: u32,
    hijack: Option<Vec<u8>>,
    reads: u64,
    writes: u64,
}

impl Inner {
    fn begin_read(&mut self) -> EngineResult<()> {
        self.reads += 1;
        if self.fail_reads > 0 {
            self.fail_reads -= 1;
            return Err(EngineError::Network("injected read failure".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryFeedStore {
    inner: Mutex<Inner>,
}

impl MemoryFeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a raw payload, bypassing key checks. Occupied slots are kept.
    pub async fn inject(&self, stream: &StreamId, index: u64, payload: Vec<u8>) {
        let mut inner = self.inner.lock().await;
        inner
            .streams
            .entry(stream.clone())
            .or_default()
            .entry(index)
            .or_insert(payload);
    }

    /// The next `n` reads fail with a network error.
    pub async fn fail_reads(&self, n: u32) {
        self.inner.lock().await.fail_reads = n;
    }

    /// The next `n` range reads fail; tip and single-slot reads still succeed.
    pub async fn fail_range_reads(&self, n: u32) {
        self.inner.lock().await.fail_range_reads = n;
    }

    /// The next `n` writes fail with a storage error.
    pub async fn fail_writes(&self, n: u32) {
        self.inner.lock().await.fail_writes = n;
    }

    /// The next `n` writes are acknowledged but never stored.
    pub async fn drop_writes(&self, n: u32) {
        self.inner.lock().await.drop_writes = n;
    }

    /// A concurrent writer lands `payload` in the slot targeted by the next write.
    pub async fn hijack_next_write(&self, payload: Vec<u8>) {
        self.inner.lock().await.hijack = Some(payload);
    }

    pub async fn read_count(&self) -> u64 {
        self.inner.lock().await.reads
    }

    pub async fn write_count(&self) -> u64 {
        self.inner.lock().await.writes
    }

    pub async fn len(&self, stream: &StreamId) -> usize {
        self.inner
            .lock()
            .await
            .streams
            .get(stream)
            .map(|s| s.len())
            .unwrap_or(0)
    }

    pub async fn is_empty(&self, stream: &StreamId) -> bool {
        self.len(stream).await == 0
    }
}

#[async_trait]
impl FeedStore for MemoryFeedStore {
    async fn read_tip(&self, stream: &StreamId) -> EngineResult<Option<Entry>> {
        let mut inner = self.inner.lock().await;
        inner.begin_read()?;
        Ok(inner
            .streams
            .get(stream)
            .and_then(|s| s.iter().next_back())
            .map(|(index, payload)| Entry {
                index: *index,
                payload: payload.clone(),
            }))
    }

    async fn read_entry(&self, stream: &StreamId, index: u64) -> EngineResult<Option<Entry>> {
        let mut inner = self.inner.lock().await;
        inner.begin_read()?;
        Ok(inner
            .streams
            .get(stream)
            .and_then(|s| s.get(&index))
            .map(|payload| Entry {
                index,
                payload: payload.clone(),
            }))
    }

    async fn read_range(&self, stream: &StreamId, from: u64, to: u64) -> EngineResult<Vec<Entry>> {
        let mut inner = self.inner.lock().await;
        inner.begin_read()?;
        if inner.fail_range_reads > 0 {
            inner.fail_range_reads -= 1;
            return Err(EngineError::Network("injected range read failure".into()));
        }
        if from > to {
            return Ok(Vec::new());
        }
        Ok(inner
            .streams
            .get(stream)
            .map(|s| {
                s.range(from..=to)
                    .map(|(index, payload)| Entry {
                        index: *index,
                        payload: payload.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn write_entry(&self, write: &SlotWrite) -> EngineResult<Receipt> {
        write.verify()?;
        let mut inner = self.inner.lock().await;
        if inner.fail_writes > 0 {
            inner.fail_writes -= 1;
            return Err(EngineError::Storage("injected write failure".into()));
        }
        inner.writes += 1;

        if let Some(payload) = inner.hijack.take() {
            inner
                .streams
                .entry(write.stream.clone())
                .or_default()
                .entry(write.index)
                .or_insert(payload);
        }

        if inner.drop_writes > 0 {
            inner.drop_writes -= 1;
            tracing::debug!("MemoryFeedStore: dropping write to {} at {}", write.stream, write.index);
            return Ok(Receipt::for_write(write));
        }

        inner
            .streams
            .entry(write.stream.clone())
            .or_default()
            .entry(write.index)
            .or_insert_with(|| write.payload.clone());
        Ok(Receipt::for_write(write))
    }
}
