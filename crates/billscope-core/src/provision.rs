//! Article numbers and their legal sort order.
//!
//! Inserted articles carry a letter suffix ("Art. 12A" sits between 12 and
//! 13). Plain string ordering gets this wrong ("Art. 10" < "Art. 9"), so
//! listings sort on [`ArticleNumber::sort_key`] instead.

use std::cmp::Ordering;
use std::fmt;

/// Article base number and suffix rank, compared as a tuple.
pub type SortKey = (u32, u32);

/// A parsed article number: integer base plus optional letter suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleNumber {
    pub base: u32,
    pub suffix: String,
}

impl ArticleNumber {
    /// Parse "12", "12A" or a full label such as "Art. 12A".
    ///
    /// Returns `None` when no digit is present.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let start = s.find(|c: char| c.is_ascii_digit())?;
        let rest = &s[start..];
        let digit_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let base = rest[..digit_end].parse().ok()?;
        let suffix: String = rest[digit_end..]
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        Some(Self { base, suffix })
    }

    /// Sort key `(base, suffix_rank)`: (12, 0) for 12, (12, 10) for 12A.
    ///
    /// A first suffix letter maps to A=10 .. Z=260; a second letter adds
    /// A=1 .. I=9 so "12AB" sorts after "12A" and before "12B".
    pub fn sort_key(&self) -> SortKey {
        let mut letters = self.suffix.bytes().filter(u8::is_ascii_uppercase);
        let first = letters.next().map_or(0, |b| u32::from(b - b'A') + 1) * 10;
        let second = letters.next().map_or(0, |b| (u32::from(b - b'A') + 1).min(9));
        (self.base, first + second)
    }
}

impl fmt::Display for ArticleNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.suffix)
    }
}

impl PartialOrd for ArticleNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ArticleNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// Sort key for an article label; labels without a number sort first.
pub fn label_sort_key(label: &str) -> SortKey {
    ArticleNumber::parse(label).map_or((0, 0), |n| n.sort_key())
}
