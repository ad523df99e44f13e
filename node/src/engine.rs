// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Comment engine.
//!
//! Composes the session components and exposes the caller-facing operations:
//! `start` / `stop`, `send` / `retry_send`, `fetch_previous`. Every outcome is
//! also published on the event bus.
//!
//! # Write path
//! Text and thread messages:
//! 1. mark a write in flight (the poll loop stops refreshing the message tip)
//! 2. resync the tip and pick `next_write_index`
//! 3. sign the slot with the topic key and upload
//! 4. read the slot back and compare `(id, timestamp)`
//! 5. on success move the pointer to the slot
//!
//! Reactions follow the same steps against the reaction stream, except that
//! nothing is marked in flight and the payload is the merged snapshot.
//!
//! A collision is reported and never retried automatically. `retry_send`
//! re-submits the same id with a fresh timestamp and signature at whatever slot
//! is free by then.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use graffiti_kernel::envelope::EntryPayload;
use graffiti_kernel::identity::{derive_topic_key, Identity, SlotWrite, StreamId};
use graffiti_kernel::{Address, Message, MessageId, MessageKind, ReactionSnapshot, SeqIndex};
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::config::{Checkpoint, EngineConfig};
use crate::context::Context;
use crate::errors::{EngineError, EngineResult};
use crate::events::{CommentEvent, EventBus};
use crate::network::HttpFeedStore;
use crate::poll::{PollHandle, PollLoop, TickReport};
use crate::session::Session;
use crate::store::SharedStore;
use crate::telemetry;

/// One `send` call. Use the constructors; `id` and `prior_reactions` are
/// optional overrides.
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub body: String,
    pub kind: MessageKind,
    pub target: Option<MessageId>,
    /// Reuse an id instead of generating one.
    pub id: Option<MessageId>,
    /// Reaction state to merge into instead of the last adopted snapshot.
    pub prior_reactions: Option<ReactionSnapshot>,
}

impl SendRequest {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            kind: MessageKind::Text,
            target: None,
            id: None,
            prior_reactions: None,
        }
    }

    pub fn thread(body: impl Into<String>, target: MessageId) -> Self {
        Self {
            kind: MessageKind::Thread,
            target: Some(target),
            ..Self::text(body)
        }
    }

    pub fn reaction(body: impl Into<String>, target: MessageId) -> Self {
        Self {
            kind: MessageKind::Reaction,
            target: Some(target),
            ..Self::text(body)
        }
    }

    pub fn with_id(mut self, id: MessageId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_prior_reactions(mut self, prior: ReactionSnapshot) -> Self {
        self.prior_reactions = Some(prior);
        self
    }
}

pub struct CommentEngine {
    config: EngineConfig,
    identity: Identity,
    events: Arc<EventBus>,
    session: Arc<Session>,
    poller: Mutex<Option<PollHandle>>,
    running: AtomicBool,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl CommentEngine {
    /// Builds an engine over `store`. The identity comes from
    /// `signing_key_hex`, or is generated for this session.
    pub fn new(config: EngineConfig, store: SharedStore) -> EngineResult<Self> {
        config.validate()?;
        let identity = match &config.signing_key_hex {
            Some(secret) => Identity::from_hex(secret)?,
            None => Identity::from_bytes(&rand::random::<[u8; 32]>()),
        };

        let events = Arc::new(EventBus::new(config.event_capacity));
        let ctx = Context::new(store, events.clone());
        let session = Arc::new(Session::new(ctx, &config));
        tracing::info!("Engine for topic {:?} as {}", config.topic, identity.address());

        Ok(Self {
            config,
            identity,
            events,
            session,
            poller: Mutex::new(None),
            running: AtomicBool::new(false),
        })
    }

    /// Engine talking to the storage node at `config.storage_url`.
    pub fn connect(config: EngineConfig) -> EngineResult<Self> {
        let store = HttpFeedStore::new(config.storage_url.clone(), config.auth_token.clone());
        Self::new(config, Arc::new(store))
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn address(&self) -> Address {
        self.identity.address()
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CommentEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Starts with the configured checkpoint, if any.
    pub async fn start(&self) -> EngineResult<()> {
        self.start_from(self.config.checkpoint).await
    }

    /// Initializes the three components concurrently, then starts polling.
    ///
    /// Only a message tracker failure aborts the start: it is reported as a
    /// `CriticalError` event and returned as `EngineError::Critical`. History
    /// and reaction init failures are logged and tolerated.
    pub async fn start_from(&self, checkpoint: Option<Checkpoint>) -> EngineResult<()> {
        let mut poller = self.poller.lock().await;
        if poller.is_some() {
            return Err(EngineError::InvalidInput("engine already started".into()));
        }

        let cp = checkpoint.unwrap_or_default();
        let session = &self.session;
        let (tracked, history, reactions) = tokio::join!(
            session.tracker.init(cp.latest()),
            session.history.init(cp.first()),
            session.reactions.init(cp.reaction()),
        );

        if let Err(e) = history {
            tracing::warn!("History init failed: {}", e);
        }
        if let Err(e) = reactions {
            tracing::warn!("Reaction init failed: {}", e);
        }
        let tip = match tracked {
            Ok(tip) => tip,
            Err(e) => {
                tracing::error!("Message stream init failed: {}", e);
                self.events.emit(CommentEvent::CriticalError(e.to_string()));
                return Err(EngineError::Critical(e.to_string()));
            }
        };

        *poller = Some(PollLoop::new(session.clone(), self.config.poll_interval()).spawn());
        self.running.store(true, Ordering::Release);
        tracing::info!("Engine started at message tip {}", tip);
        Ok(())
    }

    /// Stops polling (after any tick in flight), resets every pointer and
    /// closes the event bus.
    pub async fn stop(&self) {
        if let Some(handle) = self.poller.lock().await.take() {
            handle.stop().await;
        }
        self.running.store(false, Ordering::Release);
        self.session.reset();
        self.events.close();
        tracing::info!("Engine stopped");
    }

    /// One poll tick outside the background loop.
    pub async fn poll_once(&self) -> TickReport {
        PollLoop::new(self.session.clone(), self.config.poll_interval())
            .tick()
            .await
    }

    pub async fn send(&self, req: SendRequest) -> EngineResult<Message> {
        let msg = self.compose(req.kind, req.body, req.target, req.id)?;
        self.events.emit(CommentEvent::RequestInitiated(msg.clone()));

        let result = match msg.kind {
            MessageKind::Reaction => self.write_reaction(&msg, req.prior_reactions.as_ref()).await,
            MessageKind::Text | MessageKind::Thread => self.write_message(&msg).await,
        };

        match result {
            Ok(placed) => {
                metrics::increment_counter!(telemetry::WRITES);
                self.events.emit(CommentEvent::RequestUploaded(placed.clone()));
                Ok(placed)
            }
            Err(e) => {
                tracing::warn!("Send of {} failed: {}", msg.id, e);
                self.events.emit(CommentEvent::RequestError {
                    message: msg,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    pub async fn send_text(&self, body: impl Into<String>) -> EngineResult<Message> {
        self.send(SendRequest::text(body)).await
    }

    pub async fn send_thread(&self, body: impl Into<String>, target: MessageId) -> EngineResult<Message> {
        self.send(SendRequest::thread(body, target)).await
    }

    pub async fn send_reaction(&self, body: impl Into<String>, target: MessageId) -> EngineResult<Message> {
        self.send(SendRequest::reaction(body, target)).await
    }

    /// Re-submits a failed message: same id, body, kind and target; fresh
    /// timestamp and signature. The slot is whatever is free now.
    pub async fn retry_send(&self, failed: &Message) -> EngineResult<Message> {
        let mut req = SendRequest::text(failed.body.clone()).with_id(failed.id.clone());
        req.kind = failed.kind;
        req.target = failed.target_message_id.clone();
        self.send(req).await
    }

    /// Loads the next page of history. Requires a started engine.
    pub async fn fetch_previous(&self) -> EngineResult<Vec<Message>> {
        if !self.is_running() {
            return Err(EngineError::NotRunning);
        }
        self.session.history.load_previous_page().await
    }

    pub fn has_previous(&self) -> bool {
        self.session.history.has_previous()
    }

    pub fn reaction_snapshot(&self) -> ReactionSnapshot {
        self.session.reactions.snapshot()
    }

    fn compose(
        &self,
        kind: MessageKind,
        body: String,
        target: Option<MessageId>,
        id: Option<MessageId>,
    ) -> EngineResult<Message> {
        let id = id.unwrap_or_else(|| MessageId(Uuid::new_v4().to_string()));
        let mut msg = Message::draft(
            id,
            self.identity.address(),
            self.config.nickname.clone(),
            self.config.topic.clone(),
            now_ms(),
            kind,
            target,
            body,
        );
        msg.validate_shape()?;
        self.identity.sign_message(&mut msg)?;
        Ok(msg)
    }

    async fn upload(&self, stream: &StreamId, index: u64, payload: EntryPayload) -> EngineResult<()> {
        let bytes = payload.encode()?;
        let write = SlotWrite::sign(&derive_topic_key(&self.config.topic), stream.clone(), index, bytes);
        let receipt = self.session.ctx.store.write_entry(&write).await?;
        tracing::debug!("Uploaded {} to {} at {}", receipt.reference, stream, index);
        Ok(())
    }

    async fn write_message(&self, msg: &Message) -> EngineResult<Message> {
        let _in_flight = self.session.begin_write();
        let tracker = &self.session.tracker;

        tracker.refresh_tip().await?;
        let index = tracker.next_write_index();
        let placed = msg.clone().with_index(SeqIndex::new(index));
        let stream = tracker.stream().clone();

        self.upload(&stream, index, EntryPayload::Message(placed.clone())).await?;
        self.session.verifier.verify(&stream, index, &msg.stamp()).await?;
        tracker.record_write(&placed);
        Ok(placed)
    }

    async fn write_reaction(&self, msg: &Message, prior: Option<&ReactionSnapshot>) -> EngineResult<Message> {
        let reactions = &self.session.reactions;

        reactions.refresh(None).await?;
        let (snapshot, index) = reactions.prepare_write(prior, msg)?;
        let stream = reactions.stream().clone();

        self.upload(&stream, index, EntryPayload::Reactions(snapshot.clone())).await?;
        self.session.verifier.verify(&stream, index, &msg.stamp()).await?;
        reactions.record_write(index, snapshot);
        Ok(msg.clone().with_index(SeqIndex::new(index)))
    }
}
