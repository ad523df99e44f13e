// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Identity types.

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::config::ABSENT_INDEX;
use crate::error::{KernelError, KernelResult};

/// Opaque, globally unique message identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        MessageId(s.to_string())
    }
}

/// `0x`-prefixed, lowercase hex address derived from a public key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Address without the `0x` prefix, used as a URL path segment.
    pub fn bare(&self) -> &str {
        self.0.strip_prefix("0x").unwrap_or(&self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position in a stream. `-1` is the reserved "absent" sentinel: the message has
/// not been placed yet, or the stream is empty or unknown. No real entry lives
/// at `-1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeqIndex(i64);

impl SeqIndex {
    pub const ABSENT: SeqIndex = SeqIndex(ABSENT_INDEX);
    pub const FIRST: SeqIndex = SeqIndex(0);

    pub fn new(index: u64) -> Self {
        SeqIndex(index.min(i64::MAX as u64) as i64)
    }

    /// Accepts any raw value `>= -1`.
    pub fn from_raw(raw: i64) -> KernelResult<Self> {
        if raw < ABSENT_INDEX {
            return Err(KernelError::InvalidIndex(raw.to_string()));
        }
        Ok(SeqIndex(raw))
    }

    pub fn raw(self) -> i64 {
        self.0
    }

    pub fn get(self) -> Option<u64> {
        if self.is_absent() {
            None
        } else {
            Some(self.0 as u64)
        }
    }

    pub fn is_absent(self) -> bool {
        self.0 == ABSENT_INDEX
    }

    /// The slot after this one; the slot after "absent" is the first slot.
    /// Saturates at `i64::MAX`.
    pub fn next(self) -> u64 {
        self.0.saturating_add(1) as u64
    }
}

impl Default for SeqIndex {
    fn default() -> Self {
        SeqIndex::ABSENT
    }
}

impl From<Option<u64>> for SeqIndex {
    fn from(v: Option<u64>) -> Self {
        v.map(SeqIndex::new).unwrap_or(SeqIndex::ABSENT)
    }
}

impl fmt::Display for SeqIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
