// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! History page arithmetic.
//!
//! The cursor is the oldest index already delivered. A previous page covers the
//! `width` slots below it, clamped at slot 0; a negative index is never produced.

use crate::types::id::SeqIndex;

/// Inclusive slot range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRange {
    pub from: u64,
    pub to: u64,
}

impl PageRange {
    pub fn len(&self) -> u64 {
        self.to - self.from + 1
    }
}

/// Page below `cursor`, or `None` when nothing older exists.
pub fn previous_page(cursor: SeqIndex, width: u64) -> Option<PageRange> {
    let cursor = cursor.get()?;
    if cursor == 0 || width == 0 {
        return None;
    }
    Some(PageRange {
        from: cursor.saturating_sub(width),
        to: cursor - 1,
    })
}

/// Newest page ending at `tip`.
pub fn latest_page(tip: u64, width: u64) -> PageRange {
    let width = width.max(1);
    PageRange {
        from: (tip + 1).saturating_sub(width),
        to: tip,
    }
}

pub fn has_previous(cursor: SeqIndex) -> bool {
    cursor.raw() > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_page() {
        let page = previous_page(SeqIndex::new(12), 9).unwrap();
        assert_eq!(page, PageRange { from: 3, to: 11 });
        assert_eq!(page.len(), 9);
    }

    #[test]
    fn test_page_clamped_at_zero() {
        let page = previous_page(SeqIndex::new(5), 9).unwrap();
        assert_eq!(page, PageRange { from: 0, to: 4 });
        assert_eq!(page.len(), 5);
    }

    #[test]
    fn test_no_page_at_start() {
        assert_eq!(previous_page(SeqIndex::new(0), 9), None);
        assert_eq!(previous_page(SeqIndex::ABSENT, 9), None);
        assert!(!has_previous(SeqIndex::new(0)));
        assert!(!has_previous(SeqIndex::ABSENT));
        assert!(has_previous(SeqIndex::new(1)));
    }

    #[test]
    fn test_latest_page() {
        assert_eq!(latest_page(20, 9), PageRange { from: 12, to: 20 });
        assert_eq!(latest_page(3, 9), PageRange { from: 0, to: 3 });
    }
}
