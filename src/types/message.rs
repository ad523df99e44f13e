// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Comment messages.

use serde::{Deserialize, Serialize};

use crate::config::MAX_BODY_SIZE;
use crate::error::{KernelError, KernelResult};
use crate::types::enums::MessageKind;
use crate::types::id::{Address, MessageId, SeqIndex};

/// A single comment, thread reply or reaction.
///
/// `signature` binds the message to `author`; the stream the message is stored
/// in proves nothing about who wrote it, since every participant writes through
/// the same topic key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub author: Address,
    pub nickname: String,
    pub topic: String,
    pub signature: Vec<u8>,
    /// Milliseconds since the unix epoch.
    pub timestamp: u64,
    pub kind: MessageKind,
    pub target_message_id: Option<MessageId>,
    /// Not covered by the signature: set after signing, once a slot is chosen.
    pub sequence_index: SeqIndex,
    pub body: String,
    /// Older unsigned format, accepted without signature verification.
    pub legacy: bool,
}

/// The identity the write verifier compares after reading a slot back.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stamp {
    pub id: MessageId,
    pub timestamp: u64,
}

/// Canonical view of the signed fields.
#[derive(Serialize)]
struct SigningView<'a> {
    id: &'a str,
    author: &'a str,
    nickname: &'a str,
    topic: &'a str,
    timestamp: u64,
    kind: MessageKind,
    target_message_id: Option<&'a str>,
    body: &'a str,
}

impl Message {
    /// Unsigned, unplaced message. Call `Identity::sign_message` before writing.
    #[allow(clippy::too_many_arguments)]
    pub fn draft(
        id: MessageId,
        author: Address,
        nickname: impl Into<String>,
        topic: impl Into<String>,
        timestamp: u64,
        kind: MessageKind,
        target_message_id: Option<MessageId>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id,
            author,
            nickname: nickname.into(),
            topic: topic.into(),
            signature: Vec::new(),
            timestamp,
            kind,
            target_message_id,
            sequence_index: SeqIndex::ABSENT,
            body: body.into(),
            legacy: false,
        }
    }

    /// Structural checks that do not need the signature.
    pub fn validate_shape(&self) -> KernelResult<()> {
        if self.id.0.is_empty() {
            return Err(KernelError::InvalidOperation("message id is empty"));
        }
        if self.body.len() > MAX_BODY_SIZE {
            return Err(KernelError::InvalidOperation("message body too large"));
        }
        if self.kind.requires_target() && self.target_message_id.is_none() {
            return Err(KernelError::InvalidOperation("thread and reaction messages need a target"));
        }
        Ok(())
    }

    /// BLAKE3 digest of the canonical (bincode) encoding of the signed fields.
    pub fn signing_digest(&self) -> KernelResult<[u8; 32]> {
        let view = SigningView {
            id: &self.id.0,
            author: &self.author.0,
            nickname: &self.nickname,
            topic: &self.topic,
            timestamp: self.timestamp,
            kind: self.kind,
            target_message_id: self.target_message_id.as_ref().map(|t| t.0.as_str()),
            body: &self.body,
        };
        let bytes = bincode::serde::encode_to_vec(&view, bincode::config::standard())
            .map_err(|e| KernelError::Encode(e.to_string()))?;
        Ok(*blake3::hash(&bytes).as_bytes())
    }

    pub fn stamp(&self) -> Stamp {
        Stamp {
            id: self.id.clone(),
            timestamp: self.timestamp,
        }
    }

    pub fn with_index(mut self, index: SeqIndex) -> Self {
        self.sequence_index = index;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Message {
        Message::draft(
            MessageId::from("m-1"),
            Address("0xabc".into()),
            "alice",
            "topic",
            1_700_000_000_000,
            MessageKind::Text,
            None,
            "hello",
        )
    }

    #[test]
    fn test_digest_ignores_sequence_index() {
        let msg = sample();
        let placed = msg.clone().with_index(SeqIndex::new(42));
        assert_eq!(msg.signing_digest().unwrap(), placed.signing_digest().unwrap());
    }

    #[test]
    fn test_digest_covers_body() {
        let msg = sample();
        let mut edited = msg.clone();
        edited.body.push('!');
        assert_ne!(msg.signing_digest().unwrap(), edited.signing_digest().unwrap());
    }

    #[test]
    fn test_reaction_without_target_rejected() {
        let mut msg = sample();
        msg.kind = MessageKind::Reaction;
        assert!(msg.validate_shape().is_err());
        msg.target_message_id = Some(MessageId::from("m-0"));
        assert!(msg.validate_shape().is_ok());
    }
}
