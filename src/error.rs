// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// A textual index could not be parsed.
    #[error("invalid index: {0:?}")]
    InvalidIndex(String),
    /// Slot payload framing or body decoding failed.
    #[error("decode error: {0}")]
    Decode(String),
    /// Canonical encoding failed.
    #[error("encode error: {0}")]
    Encode(String),
    /// Signature bytes are not `public key || signature`.
    #[error("malformed signature ({0} bytes)")]
    MalformedSignature(usize),
    /// The embedded signature does not verify over the message digest.
    #[error("signature does not match message digest")]
    SignatureMismatch,
    /// The signing key does not belong to the claimed author.
    #[error("author mismatch: claimed {claimed}, recovered {recovered}")]
    AuthorMismatch { claimed: String, recovered: String },
    /// Key material was rejected.
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// Operation requires a message of a different kind.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
}

pub type KernelResult<T> = core::result::Result<T, KernelError>;
