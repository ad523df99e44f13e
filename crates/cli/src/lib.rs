// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod commands;
pub mod render;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use graffiti_node::config::EngineConfig;

/// Connection and identity flags shared by every networked command.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectArgs {
    /// Topic to comment on (any string, typically a page URL)
    #[arg(long, short)]
    pub topic: Option<String>,

    /// JSON engine config; flags below override its fields
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Storage node URL
    #[arg(long)]
    pub storage_url: Option<String>,

    /// Bearer token for writes
    #[arg(long)]
    pub token: Option<String>,

    /// Hex ed25519 secret (see `graffiti keygen`)
    #[arg(long)]
    pub key: Option<String>,

    #[arg(long)]
    pub nickname: Option<String>,
}

impl ConnectArgs {
    pub fn into_config(self) -> Result<EngineConfig> {
        let mut cfg = match &self.config {
            Some(path) => EngineConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => match &self.topic {
                Some(topic) => EngineConfig::for_topic(topic.clone()),
                None => bail!("either --topic or --config is required"),
            },
        };

        if let Some(topic) = self.topic {
            cfg.topic = topic;
        }
        if let Some(url) = self.storage_url {
            cfg.storage_url = url;
        }
        if self.token.is_some() {
            cfg.auth_token = self.token;
        }
        if self.key.is_some() {
            cfg.signing_key_hex = self.key;
        }
        if let Some(nickname) = self.nickname {
            cfg.nickname = nickname;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}
