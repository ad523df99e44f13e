// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Configuration constants.

/// Raw value of the reserved "not placed / stream empty" index.
pub const ABSENT_INDEX: i64 = -1;

/// First slot of every stream.
pub const FIRST_INDEX: u64 = 0;

/// Highest writable slot. Its successor still fits a signed index.
pub const MAX_INDEX: u64 = i64::MAX as u64 - 1;

/// Default number of messages per history page.
pub const DEFAULT_PAGE_WIDTH: u64 = 9;

/// Width of the fixed-size hexadecimal index encoding (8 bytes, big-endian).
pub const HEX_INDEX_WIDTH: usize = 16;

/// Magic prefix of every slot payload.
pub const ENVELOPE_MAGIC: &[u8; 4] = b"GFT1";

/// Key derivation context for the shared topic signing key.
pub const TOPIC_KEY_CONTEXT: &str = "graffiti 2025-01 topic feed key";

/// Stream name suffix distinguishing the reaction stream from the message stream.
pub const REACTION_STREAM_SUFFIX: &str = "/reactions";

/// Maximum accepted message body, in bytes.
pub const MAX_BODY_SIZE: usize = 16 * 1024;
