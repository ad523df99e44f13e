// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Signature validation.
//!
//! A message carries `public key || signature` over its signing digest. The
//! validator recomputes the digest, verifies the signature against the embedded
//! key and derives the address from that key. The message is authentic only if
//! the derived address equals the claimed `author`.
//!
//! Messages flagged `legacy` predate signing and are always accepted.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::error::{KernelError, KernelResult};
use crate::identity::{address_of, MESSAGE_SIGNATURE_LEN, PUBLIC_KEY_LEN, SIGNATURE_LEN};
use crate::types::message::Message;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Signed,
    Legacy,
}

pub fn verify_message(msg: &Message) -> KernelResult<Verdict> {
    if msg.legacy {
        return Ok(Verdict::Legacy);
    }
    if msg.signature.len() != MESSAGE_SIGNATURE_LEN {
        return Err(KernelError::MalformedSignature(msg.signature.len()));
    }
    let (key_bytes, sig_bytes) = msg.signature.split_at(PUBLIC_KEY_LEN);
    let key_bytes: [u8; PUBLIC_KEY_LEN] = key_bytes
        .try_into()
        .map_err(|_| KernelError::MalformedSignature(msg.signature.len()))?;
    let sig_bytes: [u8; SIGNATURE_LEN] = sig_bytes
        .try_into()
        .map_err(|_| KernelError::MalformedSignature(msg.signature.len()))?;

    let key = VerifyingKey::from_bytes(&key_bytes).map_err(|e| KernelError::InvalidKey(e.to_string()))?;
    let recovered = address_of(&key);
    if recovered != msg.author {
        return Err(KernelError::AuthorMismatch {
            claimed: msg.author.0.clone(),
            recovered: recovered.0,
        });
    }

    let digest = msg.signing_digest()?;
    key.verify(&digest, &Signature::from_bytes(&sig_bytes))
        .map_err(|_| KernelError::SignatureMismatch)?;
    Ok(Verdict::Signed)
}

pub fn is_authentic(msg: &Message) -> bool {
    verify_message(msg).is_ok()
}
