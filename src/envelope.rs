// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Slot payload framing.
//!
//! # Format
//! ```text
//! [magic "GFT1": 4][crc64 of body: u64 BE][bincode body]
//! ```
//!
//! The checksum covers only the body; a payload whose checksum does not match is
//! rejected as a whole.

use byteorder::{BigEndian, ByteOrder};
use crc64fast::Digest;
use serde::{Deserialize, Serialize};

use crate::config::ENVELOPE_MAGIC;
use crate::error::{KernelError, KernelResult};
use crate::snapshot::ReactionSnapshot;
use crate::types::message::{Message, Stamp};

const HEADER_LEN: usize = 4 + 8;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryPayload {
    Message(Message),
    Reactions(ReactionSnapshot),
}

fn checksum(body: &[u8]) -> u64 {
    let mut digest = Digest::new();
    digest.write(body);
    digest.sum64()
}

impl EntryPayload {
    pub fn encode(&self) -> KernelResult<Vec<u8>> {
        let body = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| KernelError::Encode(e.to_string()))?;
        let mut out = Vec::with_capacity(HEADER_LEN + body.len());
        out.extend_from_slice(ENVELOPE_MAGIC);
        let mut crc = [0u8; 8];
        BigEndian::write_u64(&mut crc, checksum(&body));
        out.extend_from_slice(&crc);
        out.extend_from_slice(&body);
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> KernelResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(KernelError::Decode(format!("short payload ({} bytes)", bytes.len())));
        }
        if &bytes[0..4] != ENVELOPE_MAGIC {
            return Err(KernelError::Decode("bad magic".into()));
        }
        let expected = BigEndian::read_u64(&bytes[4..HEADER_LEN]);
        let body = &bytes[HEADER_LEN..];
        let actual = checksum(body);
        if expected != actual {
            return Err(KernelError::Decode(format!(
                "checksum mismatch: expected {expected:016x}, got {actual:016x}"
            )));
        }
        let (payload, read) = bincode::serde::decode_from_slice::<EntryPayload, _>(body, bincode::config::standard())
            .map_err(|e| KernelError::Decode(e.to_string()))?;
        if read != body.len() {
            return Err(KernelError::Decode("trailing bytes after body".into()));
        }
        Ok(payload)
    }

    /// Identity compared when a slot is read back after writing.
    pub fn stamp(&self) -> Option<Stamp> {
        match self {
            EntryPayload::Message(m) => Some(m.stamp()),
            EntryPayload::Reactions(s) => s.stamp.clone(),
        }
    }

    pub fn into_message(self) -> KernelResult<Message> {
        match self {
            EntryPayload::Message(m) => Ok(m),
            EntryPayload::Reactions(_) => Err(KernelError::Decode("expected a message, found reactions".into())),
        }
    }

    pub fn into_reactions(self) -> KernelResult<ReactionSnapshot> {
        match self {
            EntryPayload::Reactions(s) => Ok(s),
            EntryPayload::Message(_) => Err(KernelError::Decode("expected reactions, found a message".into())),
        }
    }
}
