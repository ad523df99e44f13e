// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use graffiti_node::config::EngineConfig;
use graffiti_node::{CommentEngine, CommentEvent};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::StreamExt;

use crate::render::{message_line, reaction_table};

pub async fn run(config: EngineConfig) -> anyhow::Result<()> {
    let topic = config.topic.clone();
    let engine = CommentEngine::connect(config)?;
    let mut events = engine.events().stream();
    engine.start().await?;
    println!("Watching {:?} as {} (Ctrl-C to stop)", topic, engine.address());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.next() => match event {
                Some(Ok(event)) => print_event(&event),
                Some(Err(BroadcastStreamRecvError::Lagged(n))) => eprintln!("(skipped {n} events)"),
                None => break,
            },
        }
    }

    engine.stop().await;
    Ok(())
}

fn print_event(event: &CommentEvent) {
    match event {
        CommentEvent::MessageReceived(msg) => println!("{}", message_line(msg)),
        CommentEvent::ReactionsUpdated(snapshot) => println!("{}", reaction_table(snapshot)),
        CommentEvent::CriticalError(e) => eprintln!("critical: {e}"),
        _ => {}
    }
}
