// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use graffiti_kernel::config::DEFAULT_PAGE_WIDTH;
use graffiti_kernel::index::decode_index;
use graffiti_kernel::SeqIndex;
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::retry::RetryPolicy;

/// Floor for the poll interval, to avoid hammering the storage node.
pub const MIN_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Caller-supplied preload state that lets a session skip tip discovery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Oldest message index the caller already has (history cursor).
    pub first_index: Option<u64>,
    /// Newest message index the caller already has.
    pub latest_index: Option<u64>,
    /// Newest reaction snapshot index the caller already has.
    pub reaction_index: Option<u64>,
}

impl Checkpoint {
    pub fn first(&self) -> Option<SeqIndex> {
        self.first_index.map(SeqIndex::new)
    }

    pub fn latest(&self) -> Option<SeqIndex> {
        self.latest_index.map(SeqIndex::new)
    }

    pub fn reaction(&self) -> Option<SeqIndex> {
        self.reaction_index.map(SeqIndex::new)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub topic: String,
    pub storage_url: String,
    /// Bearer token presented on writes.
    pub auth_token: Option<String>,
    /// Hex ed25519 secret. A random identity is generated when absent.
    pub signing_key_hex: Option<String>,
    pub nickname: String,
    pub poll_interval_ms: u64,
    pub page_width: u64,
    pub tip_retry_attempts: u32,
    pub tip_retry_delay_ms: u64,
    pub event_capacity: usize,
    pub checkpoint: Option<Checkpoint>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            topic: String::new(),
            storage_url: "http://127.0.0.1:1633".to_string(),
            auth_token: None,
            signing_key_hex: None,
            nickname: "anonymous".to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            page_width: DEFAULT_PAGE_WIDTH,
            tip_retry_attempts: 3,
            tip_retry_delay_ms: 500,
            event_capacity: 1024,
            checkpoint: None,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_index(name: &str) -> EngineResult<Option<u64>> {
    match env_var(name) {
        Some(raw) => Ok(decode_index(&raw)?.get()),
        None => Ok(None),
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> EngineResult<T> {
    match env_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| EngineError::InvalidConfig(format!("{name}={raw:?}"))),
        None => Ok(default),
    }
}

impl EngineConfig {
    pub fn for_topic(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Default::default()
        }
    }

    /// Reads `GRAFFITI_*` variables on top of the defaults.
    pub fn from_env() -> EngineResult<Self> {
        let defaults = Self::default();
        let checkpoint = Checkpoint {
            first_index: env_index("GRAFFITI_CHECKPOINT_FIRST")?,
            latest_index: env_index("GRAFFITI_CHECKPOINT_LATEST")?,
            reaction_index: env_index("GRAFFITI_CHECKPOINT_REACTION")?,
        };
        let cfg = Self {
            topic: env_var("GRAFFITI_TOPIC").unwrap_or_default(),
            storage_url: env_var("GRAFFITI_STORAGE_URL").unwrap_or(defaults.storage_url),
            auth_token: env_var("GRAFFITI_AUTH_TOKEN"),
            signing_key_hex: env_var("GRAFFITI_SIGNING_KEY"),
            nickname: env_var("GRAFFITI_NICKNAME").unwrap_or(defaults.nickname),
            poll_interval_ms: env_parse("GRAFFITI_POLL_INTERVAL_MS", defaults.poll_interval_ms)?,
            page_width: env_parse("GRAFFITI_PAGE_WIDTH", defaults.page_width)?,
            tip_retry_attempts: env_parse("GRAFFITI_TIP_RETRY_ATTEMPTS", defaults.tip_retry_attempts)?,
            tip_retry_delay_ms: env_parse("GRAFFITI_TIP_RETRY_DELAY_MS", defaults.tip_retry_delay_ms)?,
            event_capacity: defaults.event_capacity,
            checkpoint: (checkpoint != Checkpoint::default()).then_some(checkpoint),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EngineError::InvalidConfig(format!("{}: {e}", path.display())))?;
        let cfg: Self = serde_json::from_str(&raw)
            .map_err(|e| EngineError::InvalidConfig(format!("{}: {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.topic.trim().is_empty() {
            return Err(EngineError::InvalidConfig("topic must not be empty".into()));
        }
        if self.page_width == 0 {
            return Err(EngineError::InvalidConfig("page_width must be at least 1".into()));
        }
        if self.tip_retry_attempts == 0 {
            return Err(EngineError::InvalidConfig("tip_retry_attempts must be at least 1".into()));
        }
        if self.event_capacity == 0 {
            return Err(EngineError::InvalidConfig("event_capacity must be at least 1".into()));
        }
        Ok(())
    }

    /// Configured interval, clamped to the floor.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn tip_retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.tip_retry_attempts,
            delay: Duration::from_millis(self.tip_retry_delay_ms),
        }
    }
}

/// Local development storage node.
#[derive(Debug, Clone)]
pub struct LocalNodeConfig {
    pub bind_addr: SocketAddr,
    pub auth_token: Option<String>,
}

impl Default for LocalNodeConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 1633)),
            auth_token: None,
        }
    }
}

impl LocalNodeConfig {
    pub fn from_env() -> EngineResult<Self> {
        let mut cfg = Self::default();
        if let Some(addr) = env_var("GRAFFITI_BIND_ADDR") {
            cfg.bind_addr = addr
                .parse()
                .map_err(|_| EngineError::InvalidConfig(format!("GRAFFITI_BIND_ADDR={addr:?}")))?;
        }
        cfg.auth_token = env_var("GRAFFITI_AUTH_TOKEN");
        Ok(cfg)
    }
}
