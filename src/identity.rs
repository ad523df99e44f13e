// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Author identities, the shared topic key and signed slot writes.
//!
//! Two independent keys are involved in every write:
//! - the **topic key**, derived from the public topic string, authorizes the
//!   slot write itself. Anyone who knows the topic can derive it.
//! - the **author key** signs the message body and is the only thing that
//!   proves who wrote it.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::config::{MAX_INDEX, REACTION_STREAM_SUFFIX, TOPIC_KEY_CONTEXT};
use crate::error::{KernelError, KernelResult};
use crate::index::index_bytes;
use crate::types::id::Address;
use crate::types::message::Message;

pub const PUBLIC_KEY_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;
/// `public key || signature`
pub const MESSAGE_SIGNATURE_LEN: usize = PUBLIC_KEY_LEN + SIGNATURE_LEN;

/// Address of a public key: last 20 bytes of its BLAKE3 digest.
pub fn address_of(key: &VerifyingKey) -> Address {
    let digest = blake3::hash(key.as_bytes());
    Address(format!("0x{}", hex::encode(&digest.as_bytes()[12..])))
}

/// Deterministic shared-writer key for a topic.
pub fn derive_topic_key(topic: &str) -> SigningKey {
    let seed = blake3::derive_key(TOPIC_KEY_CONTEXT, topic.as_bytes());
    SigningKey::from_bytes(&seed)
}

/// An author's signing identity.
#[derive(Clone)]
pub struct Identity {
    key: SigningKey,
}

impl Identity {
    pub fn from_bytes(secret: &[u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(secret),
        }
    }

    pub fn from_hex(secret: &str) -> KernelResult<Self> {
        let secret = secret.trim();
        let secret = secret.strip_prefix("0x").unwrap_or(secret);
        let bytes = hex::decode(secret).map_err(|e| KernelError::InvalidKey(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| KernelError::InvalidKey(format!("expected 32 bytes, got {}", v.len())))?;
        Ok(Self::from_bytes(&bytes))
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.key.to_bytes())
    }

    pub fn address(&self) -> Address {
        address_of(&self.key.verifying_key())
    }

    /// Sign `msg` in place. The author field must already be this identity.
    pub fn sign_message(&self, msg: &mut Message) -> KernelResult<()> {
        if msg.author != self.address() {
            return Err(KernelError::AuthorMismatch {
                claimed: msg.author.0.clone(),
                recovered: self.address().0,
            });
        }
        let digest = msg.signing_digest()?;
        let sig = self.key.sign(&digest);
        let mut bytes = Vec::with_capacity(MESSAGE_SIGNATURE_LEN);
        bytes.extend_from_slice(self.key.verifying_key().as_bytes());
        bytes.extend_from_slice(&sig.to_bytes());
        msg.signature = bytes;
        msg.legacy = false;
        Ok(())
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity").field("address", &self.address()).finish()
    }
}

/// One of the two streams of a topic. Both are owned by the topic key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamId {
    pub owner: Address,
    /// Hex BLAKE3 digest of the stream name.
    pub name: String,
}

impl StreamId {
    pub fn messages(topic: &str) -> Self {
        Self::named(topic, topic)
    }

    pub fn reactions(topic: &str) -> Self {
        Self::named(topic, &format!("{topic}{REACTION_STREAM_SUFFIX}"))
    }

    fn named(topic: &str, name: &str) -> Self {
        let owner = address_of(&derive_topic_key(topic).verifying_key());
        Self {
            owner,
            name: blake3::hash(name.as_bytes()).to_hex().to_string(),
        }
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner.bare(), &self.name[..12.min(self.name.len())])
    }
}

/// A slot write authorized by the topic key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotWrite {
    pub stream: StreamId,
    pub index: u64,
    pub payload: Vec<u8>,
    pub feed_key: [u8; 32],
    pub signature: Vec<u8>,
}

fn slot_digest(stream: &StreamId, index: u64, payload: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(stream.owner.as_str().as_bytes());
    hasher.update(stream.name.as_bytes());
    hasher.update(&index_bytes(index));
    hasher.update(payload);
    *hasher.finalize().as_bytes()
}

impl SlotWrite {
    pub fn sign(feed_key: &SigningKey, stream: StreamId, index: u64, payload: Vec<u8>) -> Self {
        let sig = feed_key.sign(&slot_digest(&stream, index, &payload));
        Self {
            stream,
            index,
            payload,
            feed_key: feed_key.verifying_key().to_bytes(),
            signature: sig.to_bytes().to_vec(),
        }
    }

    /// Checks the slot is addressable, the feed key owns the stream and signed
    /// this exact slot.
    pub fn verify(&self) -> KernelResult<()> {
        if self.index > MAX_INDEX {
            return Err(KernelError::InvalidIndex(self.index.to_string()));
        }
        let key = VerifyingKey::from_bytes(&self.feed_key)
            .map_err(|e| KernelError::InvalidKey(e.to_string()))?;
        let owner = address_of(&key);
        if owner != self.stream.owner {
            return Err(KernelError::AuthorMismatch {
                claimed: self.stream.owner.0.clone(),
                recovered: owner.0,
            });
        }
        let sig: [u8; SIGNATURE_LEN] = self
            .signature
            .as_slice()
            .try_into()
            .map_err(|_| KernelError::MalformedSignature(self.signature.len()))?;
        key.verify(&slot_digest(&self.stream, self.index, &self.payload), &Signature::from_bytes(&sig))
            .map_err(|_| KernelError::SignatureMismatch)
    }
}
