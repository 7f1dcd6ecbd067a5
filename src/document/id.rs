//! Item identifiers and the allocator that issues them

use super::{DocumentError, DocumentResult};
use serde::{Deserialize, Serialize};
use std::num::{IntErrorKind, ParseIntError};
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of a chart or folder
///
/// Serializes as a plain string. Identifiers minted by an [`IdAllocator`]
/// are always canonical integer strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ItemId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

static SHARED: IdAllocator = IdAllocator::new();

/// Issues unique, monotonically increasing identifiers.
///
/// Explicit identifiers (e.g. read from a file) are kept, and the counter
/// moves past them so later auto-generated identifiers never collide.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    /// Create an allocator starting at 0
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create an allocator whose first auto-generated id is `first`
    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// The process-wide allocator used by the convenience loaders.
    ///
    /// It is never reset, so documents loaded through it in one process
    /// get disjoint auto-generated identifiers.
    pub fn shared() -> &'static IdAllocator {
        &SHARED
    }

    /// The value the next auto-generated id will have
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }

    /// Mint a fresh identifier from the counter
    pub fn next_id(&self) -> ItemId {
        ItemId::from(self.next.fetch_add(1, Ordering::SeqCst))
    }

    /// Return `explicit` in canonical form, or mint a fresh id when absent.
    pub fn allocate(&self, explicit: Option<&str>) -> DocumentResult<ItemId> {
        match explicit {
            None => Ok(self.next_id()),
            Some(value) => {
                let n = self.reserve(value)?;
                Ok(ItemId(n.to_string()))
            }
        }
    }

    /// Advance the counter past an explicit id without allocating anything.
    ///
    /// Returns the parsed value. Ids beyond the counter's range pin it at
    /// `u64::MAX`.
    pub fn reserve(&self, value: &str) -> DocumentResult<i128> {
        let n: i128 = value.trim().parse().map_err(|e: ParseIntError| match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                DocumentError::IdentifierOutOfRange(value.to_string())
            }
            _ => DocumentError::InvalidIdentifier(value.to_string()),
        })?;
        if n >= 0 {
            let next = u64::try_from(n.saturating_add(1)).unwrap_or(u64::MAX);
            self.next.fetch_max(next, Ordering::SeqCst);
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_ids_count_up() {
        let ids = IdAllocator::new();
        assert_eq!(ids.next_id().as_str(), "0");
        assert_eq!(ids.next_id().as_str(), "1");
        assert_eq!(ids.allocate(None).unwrap().as_str(), "2");
        assert_eq!(ids.peek(), 3);
    }

    #[test]
    fn explicit_id_advances_counter() {
        let ids = IdAllocator::new();
        assert_eq!(ids.allocate(Some("10")).unwrap().as_str(), "10");
        assert_eq!(ids.next_id().as_str(), "11");
    }

    #[test]
    fn lower_explicit_id_keeps_counter() {
        let ids = IdAllocator::starting_at(20);
        assert_eq!(ids.allocate(Some("5")).unwrap().as_str(), "5");
        assert_eq!(ids.next_id().as_str(), "20");
    }

    #[test]
    fn explicit_id_is_canonicalized() {
        let ids = IdAllocator::new();
        assert_eq!(ids.allocate(Some("007")).unwrap().as_str(), "7");
        assert_eq!(ids.peek(), 8);
    }

    #[test]
    fn negative_id_is_accepted_without_moving_counter() {
        let ids = IdAllocator::new();
        assert_eq!(ids.allocate(Some("-4")).unwrap().as_str(), "-4");
        assert_eq!(ids.peek(), 0);
    }

    #[test]
    fn non_numeric_id_is_rejected() {
        let ids = IdAllocator::new();
        let err = ids.allocate(Some("chart-1")).unwrap_err();
        assert!(matches!(err, DocumentError::InvalidIdentifier(ref v) if v == "chart-1"));
        assert_eq!(ids.peek(), 0);
    }

    #[test]
    fn ids_beyond_64_bits_are_accepted() {
        let ids = IdAllocator::new();
        let huge = "18446744073709551616"; // u64::MAX + 1
        assert_eq!(ids.allocate(Some(huge)).unwrap().as_str(), huge);
        assert_eq!(ids.peek(), u64::MAX);

        let negative = "-9223372036854775809"; // i64::MIN - 1
        assert_eq!(ids.allocate(Some(negative)).unwrap().as_str(), negative);
    }

    #[test]
    fn ids_beyond_128_bits_are_out_of_range() {
        let ids = IdAllocator::new();
        let value = "1".repeat(45);
        let err = ids.allocate(Some(&value)).unwrap_err();
        assert!(matches!(err, DocumentError::IdentifierOutOfRange(ref v) if *v == value));
        assert!(err.to_string().contains("out of range"));
        assert_eq!(ids.peek(), 0);
    }

    #[test]
    fn next_id_exceeds_all_explicit_ids() {
        let ids = IdAllocator::new();
        ids.allocate(Some("3")).unwrap();
        ids.allocate(Some("42")).unwrap();
        ids.allocate(Some("17")).unwrap();
        let next: u64 = ids.next_id().as_str().parse().unwrap();
        assert!(next > 42);
    }
}
