// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Backward pagination over the message stream ("load more").
//!
//! The cursor is the oldest message index already delivered; each page fetches
//! the `width` slots below it, clamped at slot 0. Entries that fail decoding or
//! signature validation are dropped from the page, which still counts as
//! loaded.

use std::sync::atomic::{AtomicI64, Ordering};

use graffiti_kernel::identity::StreamId;
use graffiti_kernel::paging::{has_previous, latest_page, previous_page};
use graffiti_kernel::{Message, SeqIndex};
use tokio::sync::Mutex;

use crate::context::Context;
use crate::errors::EngineResult;
use crate::events::CommentEvent;

pub struct HistoryPaginator {
    ctx: Context,
    stream: StreamId,
    width: u64,
    cursor: AtomicI64,
    /// Serializes page loads so two callers never fetch the same page.
    paging: Mutex<()>,
}

impl HistoryPaginator {
    pub fn new(ctx: Context, stream: StreamId, width: u64) -> Self {
        Self {
            ctx,
            stream,
            width: width.max(1),
            cursor: AtomicI64::new(SeqIndex::ABSENT.raw()),
            paging: Mutex::new(()),
        }
    }

    pub fn cursor(&self) -> SeqIndex {
        SeqIndex::from_raw(self.cursor.load(Ordering::Acquire)).unwrap_or(SeqIndex::ABSENT)
    }

    fn set_cursor(&self, cursor: SeqIndex) {
        self.cursor.store(cursor.raw(), Ordering::Release);
    }

    pub fn has_previous(&self) -> bool {
        has_previous(self.cursor())
    }

    pub async fn load_initial_tip(&self) -> EngineResult<Option<u64>> {
        Ok(self.ctx.store.read_tip(&self.stream).await?.map(|e| e.index))
    }

    /// With `first_index` the caller already has everything from there on and
    /// no network discovery happens. Otherwise the newest page is delivered.
    pub async fn init(&self, first_index: Option<SeqIndex>) -> EngineResult<()> {
        if let Some(first) = first_index {
            self.set_cursor(first);
            return Ok(());
        }

        let _paging = self.paging.lock().await;
        self.ctx.events.emit(CommentEvent::InitLoading(true));
        let result = self.load_latest_page().await;
        self.ctx.events.emit(CommentEvent::InitLoading(false));
        result
    }

    async fn load_latest_page(&self) -> EngineResult<()> {
        let Some(tip) = self.load_initial_tip().await? else {
            tracing::debug!("History: stream {} is empty", self.stream);
            return Ok(());
        };
        let page = latest_page(tip, self.width);
        let entries = self.ctx.store.read_range(&self.stream, page.from, page.to).await?;
        for entry in &entries {
            self.ctx.deliver_entry(entry);
        }
        self.set_cursor(SeqIndex::new(page.from));
        tracing::debug!("History: initial page {}..={} ({} entries)", page.from, page.to, entries.len());
        Ok(())
    }

    /// Loads the page below the cursor and returns the messages delivered from
    /// it, oldest first. Returns an empty batch at the start of the stream. On
    /// failure the cursor is unchanged.
    pub async fn load_previous_page(&self) -> EngineResult<Vec<Message>> {
        let _paging = self.paging.lock().await;
        let Some(page) = previous_page(self.cursor(), self.width) else {
            return Ok(Vec::new());
        };

        self.ctx.events.emit(CommentEvent::PreviousLoading(true));
        let fetched = self.ctx.store.read_range(&self.stream, page.from, page.to).await;
        let result = fetched.map(|entries| {
            let delivered: Vec<Message> = entries
                .iter()
                .filter(|e| e.index >= page.from && e.index <= page.to)
                .filter_map(|e| self.ctx.deliver_entry(e))
                .collect();
            self.set_cursor(SeqIndex::new(page.from));
            delivered
        });
        self.ctx.events.emit(CommentEvent::PreviousLoading(false));

        if let Err(e) = &result {
            tracing::warn!("History: page {}..={} failed: {}", page.from, page.to, e);
        }
        result
    }

    pub fn reset(&self) {
        self.set_cursor(SeqIndex::ABSENT);
    }
}
