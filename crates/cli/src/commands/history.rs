// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::collections::HashSet;

use anyhow::Context;
use graffiti_kernel::Message;
use graffiti_node::config::EngineConfig;
use graffiti_node::{CommentEngine, CommentEvent};
use tokio::sync::broadcast::error::RecvError;

use crate::render::message_table;

/// Loads the newest page plus `pages` older ones and prints them oldest first.
pub async fn run(mut config: EngineConfig, pages: u32) -> anyhow::Result<Vec<Message>> {
    // Room for every page plus the loading events around each one.
    let needed = (pages as u64 + 1).saturating_mul(config.page_width + 2) + 8;
    config.event_capacity = config.event_capacity.max(needed as usize);
    let engine = CommentEngine::connect(config)?;
    let mut rx = engine.subscribe();

    engine.start().await.context("Failed to load topic")?;
    let mut messages = Vec::new();
    for _ in 0..pages {
        if !engine.has_previous() {
            break;
        }
        let page = engine.fetch_previous().await.context("Failed to load previous page")?;
        messages.extend(page);
    }
    let more = engine.has_previous();
    engine.stop().await;

    // The bus is closed now; drain what was delivered.
    loop {
        match rx.recv().await {
            Ok(CommentEvent::MessageReceived(msg)) => messages.push(msg),
            Ok(_) => {}
            Err(RecvError::Lagged(n)) => eprintln!("(skipped {n} events)"),
            Err(RecvError::Closed) => break,
        }
    }
    let mut seen = HashSet::new();
    messages.retain(|m| seen.insert(m.id.clone()));
    messages.sort_by_key(|m| m.sequence_index);

    if messages.is_empty() {
        println!("\nNo comments yet.\n");
    } else {
        println!("\nComments\n");
        println!("{}\n", message_table(&messages));
        if more {
            println!("Older comments available (use --pages).\n");
        }
    }
    Ok(messages)
}
