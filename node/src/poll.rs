// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Poll loop.
//!
//! Each tick refreshes the message tip and the reaction tip concurrently. The
//! branches are joined, not raced: either may fail without affecting the other,
//! and the next tick is scheduled only after both settle.
//!
//! Stopping is cooperative. The cancel flag is checked before every tick and
//! wakes the inter-tick sleep; a tick already running always completes.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::MIN_POLL_INTERVAL_MS;
use crate::session::Session;
use crate::telemetry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchOutcome {
    Refreshed,
    /// Message refresh suppressed by an in-flight write.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub messages: BranchOutcome,
    pub reactions: BranchOutcome,
}

#[derive(Clone)]
pub struct PollLoop {
    session: Arc<Session>,
    interval: Duration,
}

impl PollLoop {
    pub fn new(session: Arc<Session>, interval: Duration) -> Self {
        Self {
            session,
            interval: interval.max(Duration::from_millis(MIN_POLL_INTERVAL_MS)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One poll round. Public so tests can single-step.
    pub async fn tick(&self) -> TickReport {
        let session = &self.session;

        let messages = async {
            if session.write_in_flight() {
                tracing::debug!("Poll: message refresh skipped, write in flight");
                return BranchOutcome::Skipped;
            }
            match session.tracker.refresh_tip().await {
                Ok(_) => BranchOutcome::Refreshed,
                Err(e) => {
                    tracing::warn!("Poll: message tip refresh failed: {}", e);
                    BranchOutcome::Failed(e.to_string())
                }
            }
        };

        let after = session.reactions.pointer().next();
        let reactions = async {
            match session.reactions.refresh(Some(after)).await {
                Ok(_) => BranchOutcome::Refreshed,
                Err(e) => {
                    tracing::warn!("Poll: reaction refresh failed: {}", e);
                    BranchOutcome::Failed(e.to_string())
                }
            }
        };

        let (messages, reactions) = futures::future::join(messages, reactions).await;
        metrics::increment_counter!(telemetry::POLL_TICKS);
        TickReport { messages, reactions }
    }

    pub fn spawn(self) -> PollHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            tracing::info!("Poll loop started (every {:?})", self.interval);
            loop {
                if token.is_cancelled() {
                    break;
                }
                self.tick().await;
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
            tracing::info!("Poll loop stopped");
        });
        PollHandle { cancel, task }
    }
}

pub struct PollHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Requests a stop and waits for the in-flight tick, if any, to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!("Poll task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
