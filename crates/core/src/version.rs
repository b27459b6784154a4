//! Optimistic concurrency primitives for single-document writes.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Per-document revision counter.
///
/// Revision `0` means "no document". Stores assign `1` on creation and bump it
/// by one on every successful write.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(u64);

impl Revision {
    /// Revision of a document that does not exist.
    pub const ABSENT: Revision = Revision(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub fn is_absent(self) -> bool {
        self.0 == 0
    }

    /// Revision a successful write produces on top of this one.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl core::fmt::Display for Revision {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Optimistic concurrency expectation for a document write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (plain upsert / unconditional delete).
    Any,
    /// Require the document to be at an exact revision (`Revision::ABSENT` = must not exist).
    Exact(Revision),
}

impl ExpectedVersion {
    pub fn matches(self, actual: Revision) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: Revision) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_matches_every_revision() {
        assert!(ExpectedVersion::Any.matches(Revision::ABSENT));
        assert!(ExpectedVersion::Any.matches(Revision::new(42)));
    }

    #[test]
    fn exact_rejects_other_revisions() {
        let expected = ExpectedVersion::Exact(Revision::new(3));
        assert!(expected.matches(Revision::new(3)));
        assert!(!expected.matches(Revision::new(4)));

        match expected.check(Revision::ABSENT) {
            Err(DomainError::Conflict(msg)) => assert!(msg.contains("actual: 0")),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn next_revision_starts_at_one() {
        assert_eq!(Revision::ABSENT.next(), Revision::new(1));
        assert!(Revision::ABSENT.is_absent());
        assert!(!Revision::ABSENT.next().is_absent());
    }
}
