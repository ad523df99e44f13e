// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::Context;
use graffiti_kernel::{Message, MessageId};
use graffiti_node::config::EngineConfig;
use graffiti_node::{CommentEngine, SendRequest};

use crate::render::message_table;

pub async fn run(config: EngineConfig, body: String, thread: Option<MessageId>) -> anyhow::Result<Message> {
    let engine = CommentEngine::connect(config)?;
    let req = match thread {
        Some(target) => SendRequest::thread(body, target),
        None => SendRequest::text(body),
    };

    let sent = engine.send(req).await.context("Failed to post")?;
    println!("\nPosted\n");
    println!("{}\n", message_table(std::slice::from_ref(&sent)));
    Ok(sent)
}
