// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::Context;
use graffiti_kernel::{MessageId, ReactionSnapshot};
use graffiti_node::config::EngineConfig;
use graffiti_node::CommentEngine;

use crate::render::reaction_table;

/// Toggles `emoji` on `target` and returns the resulting reaction state.
pub async fn run(config: EngineConfig, target: MessageId, emoji: String) -> anyhow::Result<ReactionSnapshot> {
    let engine = CommentEngine::connect(config)?;
    engine
        .send_reaction(emoji, target)
        .await
        .context("Failed to react")?;

    let snapshot = engine.reaction_snapshot();
    println!("\nReactions\n");
    println!("{}\n", reaction_table(&snapshot));
    Ok(snapshot)
}
