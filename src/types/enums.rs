use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    Text,
    /// Reply to `target_message_id`.
    Thread,
    /// Reaction to `target_message_id`; `body` holds the reaction (usually an emoji).
    Reaction,
}

impl MessageKind {
    /// Thread replies and reactions must point at another message.
    pub fn requires_target(self) -> bool {
        matches!(self, MessageKind::Thread | MessageKind::Reaction)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageKind::Text => "text",
            MessageKind::Thread => "thread",
            MessageKind::Reaction => "reaction",
        };
        f.write_str(s)
    }
}
