// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use async_trait::async_trait;
use graffiti_kernel::identity::{SlotWrite, StreamId};
use graffiti_kernel::index::{decode_index, encode_hex};
use reqwest::{Client, Response, StatusCode};

use crate::errors::{EngineError, EngineResult};
use crate::store::{Entry, FeedStore, Receipt};

/// Response header carrying the slot index of a tip or entry read.
pub const FEED_INDEX_HEADER: &str = "x-feed-index";

/// `FeedStore` over the storage node's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpFeedStore {
    base_url: String,
    auth_token: Option<String>,
    client: Client,
}

impl HttpFeedStore {
    pub fn new(url: impl Into<String>, auth_token: Option<String>) -> Self {
        let url = url.into();
        Self {
            base_url: url.trim_end_matches('/').to_string(),
            auth_token,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn feed_url(&self, stream: &StreamId) -> String {
        format!("{}/v1/feeds/{}/{}", self.base_url, stream.owner.bare(), stream.name)
    }

    async fn get(&self, url: &str) -> EngineResult<Option<Response>> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EngineError::Network(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(EngineError::Network(format!("GET {} failed: {}", url, resp.status())));
        }
        Ok(Some(resp))
    }

    /// Raw payload body with its index in the `x-feed-index` header.
    async fn read_slot(&self, url: &str) -> EngineResult<Option<Entry>> {
        let Some(resp) = self.get(url).await? else {
            return Ok(None);
        };
        let raw = resp
            .headers()
            .get(FEED_INDEX_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| EngineError::Storage(format!("{} missing from response", FEED_INDEX_HEADER)))?
            .to_string();
        let Some(index) = decode_index(&raw)?.get() else {
            return Ok(None);
        };
        let payload = resp.bytes().await.map_err(|e| EngineError::Network(e.to_string()))?;
        Ok(Some(Entry {
            index,
            payload: payload.to_vec(),
        }))
    }
}

#[async_trait]
impl FeedStore for HttpFeedStore {
    async fn read_tip(&self, stream: &StreamId) -> EngineResult<Option<Entry>> {
        let url = format!("{}/tip", self.feed_url(stream));
        self.read_slot(&url).await
    }

    async fn read_entry(&self, stream: &StreamId, index: u64) -> EngineResult<Option<Entry>> {
        let url = format!("{}/entries/{}", self.feed_url(stream), encode_hex(index));
        self.read_slot(&url).await
    }

    async fn read_range(&self, stream: &StreamId, from: u64, to: u64) -> EngineResult<Vec<Entry>> {
        let url = format!("{}/entries?from={}&to={}", self.feed_url(stream), from, to);
        let Some(resp) = self.get(&url).await? else {
            return Ok(Vec::new());
        };
        resp.json().await.map_err(|e| EngineError::Network(e.to_string()))
    }

    async fn write_entry(&self, write: &SlotWrite) -> EngineResult<Receipt> {
        let url = format!("{}/entries", self.feed_url(&write.stream));
        let mut req = self.client.post(&url).json(write);
        if let Some(token) = &self.auth_token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.map_err(|e| EngineError::Network(e.to_string()))?;

        match resp.status() {
            s if s.is_success() => resp.json().await.map_err(|e| EngineError::Network(e.to_string())),
            StatusCode::UNAUTHORIZED => Err(EngineError::Unauthorized),
            s => Err(EngineError::Storage(format!("write to {} at {} failed: {}", write.stream, write.index, s))),
        }
    }
}
