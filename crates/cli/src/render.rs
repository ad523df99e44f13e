// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use graffiti_kernel::{Message, MessageKind, ReactionSnapshot};

/// RFC 3339 rendering of a millisecond epoch timestamp.
pub fn format_timestamp(ms: u64) -> String {
    chrono::DateTime::from_timestamp_millis(ms as i64)
        .unwrap_or_default()
        .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

fn kind_label(msg: &Message) -> String {
    match (msg.kind, &msg.target_message_id) {
        (MessageKind::Thread, Some(target)) => format!("reply to {}", target),
        (MessageKind::Reaction, Some(target)) => format!("reaction to {}", target),
        _ => "comment".to_string(),
    }
}

pub fn message_table(messages: &[Message]) -> Table {
    let mut sorted: Vec<&Message> = messages.iter().collect();
    sorted.sort_by_key(|m| m.sequence_index);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Time", "Author", "Kind", "Body", "Id"]);

    for msg in sorted {
        table.add_row(vec![
            msg.sequence_index.to_string(),
            format_timestamp(msg.timestamp),
            format!("{} ({})", msg.nickname, msg.author),
            kind_label(msg),
            msg.body.clone(),
            msg.id.to_string(),
        ]);
    }
    table
}

/// One row per (target, reaction) with the number of authors.
pub fn reaction_table(snapshot: &ReactionSnapshot) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Target", "Reaction", "Count"]);

    let mut targets: Vec<_> = snapshot
        .reactions
        .iter()
        .filter_map(|m| m.target_message_id.clone())
        .collect();
    targets.sort();
    targets.dedup();

    for target in targets {
        for (body, count) in snapshot.counts_for(&target) {
            table.add_row(vec![target.to_string(), body, count.to_string()]);
        }
    }
    table
}

/// Single-line form used by `watch`.
pub fn message_line(msg: &Message) -> String {
    format!(
        "[{}] #{} {} ({}): {}",
        format_timestamp(msg.timestamp),
        msg.sequence_index,
        msg.nickname,
        kind_label(msg),
        msg.body
    )
}
