// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Index codec.
//!
//! Storage nodes and callers hand us stream indices in more than one textual
//! form: plain decimal (`"12"`), the fixed-width feed index header
//! (`"000000000000000c"`, 8 bytes big-endian) and `0x`-prefixed hex. Everything
//! is normalized to a [`SeqIndex`].
//!
//! # Sentinel
//! `"-1"` and the all-ones header `"ffffffffffffffff"` both decode to
//! [`SeqIndex::ABSENT`].

use byteorder::{BigEndian, ByteOrder};

use crate::config::HEX_INDEX_WIDTH;
use crate::error::{KernelError, KernelResult};
use crate::types::id::SeqIndex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexEncoding {
    Decimal,
    Hex,
}

/// Decode with auto-detected encoding.
///
/// Hex is chosen for a `0x` prefix, for a 16-character value with a leading
/// zero (decimal never pads), and for values containing `a-f`. Anything else is
/// decimal. Indices at or above 2^60 written as unprefixed all-digit hex are
/// ambiguous; use [`decode_index_as`] for those.
pub fn decode_index(raw: &str) -> KernelResult<SeqIndex> {
    let s = raw.trim();
    if s == "-1" {
        return Ok(SeqIndex::ABSENT);
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return decode_index_as(hex, IndexEncoding::Hex);
    }
    let all_hex = !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit());
    let all_digits = !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if all_hex && (!all_digits || (s.len() == HEX_INDEX_WIDTH && s.starts_with('0'))) {
        return decode_index_as(s, IndexEncoding::Hex);
    }
    decode_index_as(s, IndexEncoding::Decimal)
}

/// Decode with a known encoding.
pub fn decode_index_as(raw: &str, encoding: IndexEncoding) -> KernelResult<SeqIndex> {
    let s = raw.trim();
    if s == "-1" {
        return Ok(SeqIndex::ABSENT);
    }
    let invalid = || KernelError::InvalidIndex(raw.to_string());
    let value = match encoding {
        IndexEncoding::Decimal => {
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            s.parse::<u64>().map_err(|_| invalid())?
        }
        IndexEncoding::Hex => {
            let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
            if s.is_empty() || s.len() > HEX_INDEX_WIDTH {
                return Err(invalid());
            }
            u64::from_str_radix(s, 16).map_err(|_| invalid())?
        }
    };
    if value == u64::MAX {
        return Ok(SeqIndex::ABSENT);
    }
    if value > i64::MAX as u64 {
        return Err(invalid());
    }
    Ok(SeqIndex::new(value))
}

pub fn encode_decimal(index: u64) -> String {
    index.to_string()
}

/// Fixed-width feed index header: 16 lowercase hex characters.
pub fn encode_hex(index: u64) -> String {
    hex::encode(index_bytes(index))
}

/// Encode a possibly-absent index as a header value.
pub fn encode_header(index: SeqIndex) -> String {
    match index.get() {
        Some(i) => encode_hex(i),
        None => encode_hex(u64::MAX),
    }
}

/// Big-endian 8-byte form, the form that is signed into slot writes.
pub fn index_bytes(index: u64) -> [u8; 8] {
    let mut buf = [0u8; 8];
    BigEndian::write_u64(&mut buf, index);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_and_header_agree() {
        assert_eq!(decode_index("12").unwrap(), SeqIndex::new(12));
        assert_eq!(decode_index("000000000000000c").unwrap(), SeqIndex::new(12));
        assert_eq!(decode_index("0xc").unwrap(), SeqIndex::new(12));
        assert_eq!(decode_index("  0X0C ").unwrap(), SeqIndex::new(12));
        assert_eq!(decode_index("ff").unwrap(), SeqIndex::new(255));
    }

    #[test]
    fn test_sentinels() {
        assert!(decode_index("-1").unwrap().is_absent());
        assert!(decode_index("ffffffffffffffff").unwrap().is_absent());
        assert_eq!(encode_header(SeqIndex::ABSENT), "ffffffffffffffff");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(decode_index("").is_err());
        assert!(decode_index("-2").is_err());
        assert!(decode_index("12z").is_err());
        assert!(decode_index_as("0a", IndexEncoding::Decimal).is_err());
        assert!(decode_index_as("00000000000000000c", IndexEncoding::Hex).is_err());
    }

    #[test]
    fn test_round_trip_both_encodings() {
        let samples = [0u64, 1, 9, 10, 15, 16, 255, 4096, 1_000_000, 1 << 40, (1 << 60) - 1];
        for i in samples {
            assert_eq!(decode_index(&encode_decimal(i)).unwrap(), SeqIndex::new(i), "decimal {i}");
            assert_eq!(decode_index(&encode_hex(i)).unwrap(), SeqIndex::new(i), "hex {i}");
        }
        let big = i64::MAX as u64;
        assert_eq!(decode_index_as(&encode_hex(big), IndexEncoding::Hex).unwrap(), SeqIndex::new(big));
        assert_eq!(decode_index_as(&encode_decimal(big), IndexEncoding::Decimal).unwrap(), SeqIndex::new(big));
    }

    #[test]
    fn test_index_bytes_big_endian() {
        assert_eq!(index_bytes(1), [0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(encode_hex(1), "0000000000000001");
    }
}
