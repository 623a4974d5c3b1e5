//! Core identifier types and the canonical code representation
//!
//! A document code is semantically an unordered multiset of terms. Every
//! component compares codes through [`CanonicalCode`], the non-decreasing
//! sorted form of the multiset with padding removed, so that two emission
//! orders of the same terms are indistinguishable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// Opaque term identifier from the external vocabulary
pub type TermId = u32;

/// Document identifier; `fit` assigns these by corpus position
pub type DocId = u32;

/// Padding sentinel used when none is configured (the all-ones bit pattern of `-1i32`)
pub const DEFAULT_PAD_TOKEN: TermId = u32::MAX;

// ============================================================================
// CanonicalCode
// ============================================================================

/// Sorted multiset of terms; the sole key for indexing, legality and merging
///
/// Invariant: `terms` is non-decreasing. Duplicate terms are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CanonicalCode {
    terms: Vec<TermId>,
}

impl CanonicalCode {
    /// The empty multiset
    pub fn empty() -> Self {
        CanonicalCode { terms: Vec::new() }
    }

    /// Canonicalize terms given in any order
    pub fn from_terms<I: IntoIterator<Item = TermId>>(terms: I) -> Self {
        let mut terms: Vec<TermId> = terms.into_iter().collect();
        terms.sort_unstable();
        CanonicalCode { terms }
    }

    /// Wrap terms that are already sorted
    ///
    /// Returns `None` when the input is not non-decreasing.
    pub fn from_sorted(terms: Vec<TermId>) -> Option<Self> {
        if terms.windows(2).all(|w| w[0] <= w[1]) {
            Some(CanonicalCode { terms })
        } else {
            None
        }
    }

    /// Strip padding (and an optional leading start token), then sort
    pub fn from_raw(raw: &[TermId], pad: TermId, start: Option<TermId>) -> Self {
        let body = match (start, raw.first()) {
            (Some(s), Some(&first)) if first == s => &raw[1..],
            _ => raw,
        };
        Self::from_terms(body.iter().copied().filter(|&t| t != pad))
    }

    /// New multiset with `term` added, keeping the sort order
    pub fn with_term(&self, term: TermId) -> Self {
        let pos = self.terms.partition_point(|&t| t <= term);
        let mut terms = Vec::with_capacity(self.terms.len() + 1);
        terms.extend_from_slice(&self.terms[..pos]);
        terms.push(term);
        terms.extend_from_slice(&self.terms[pos..]);
        CanonicalCode { terms }
    }

    /// Number of occurrences of `term`
    pub fn count(&self, term: TermId) -> usize {
        count_sorted(&self.terms, term)
    }

    /// Whether every term of `self` occurs in `other` at least as often
    ///
    /// Both sides are sorted, so this is a single merge pass.
    pub fn is_sub_multiset_of(&self, other: &[TermId]) -> bool {
        if self.terms.len() > other.len() {
            return false;
        }
        let mut j = 0;
        for &t in &self.terms {
            while j < other.len() && other[j] < t {
                j += 1;
            }
            if j == other.len() || other[j] != t {
                return false;
            }
            j += 1;
        }
        true
    }

    /// Terms of `full` left over after removing `self` (multiset difference)
    ///
    /// `self` must be a sub-multiset of `full`.
    pub fn remainder<'a>(&'a self, full: &'a [TermId]) -> impl Iterator<Item = TermId> + 'a {
        let mut i = 0;
        full.iter().copied().filter(move |&t| {
            while i < self.terms.len() && self.terms[i] < t {
                i += 1;
            }
            if i < self.terms.len() && self.terms[i] == t {
                i += 1;
                false
            } else {
                true
            }
        })
    }

    /// Sorted terms
    pub fn as_slice(&self) -> &[TermId] {
        &self.terms
    }

    /// Consume into the sorted term vector
    pub fn into_vec(self) -> Vec<TermId> {
        self.terms
    }
}

impl Deref for CanonicalCode {
    type Target = [TermId];

    fn deref(&self) -> &[TermId] {
        &self.terms
    }
}

impl fmt::Display for CanonicalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, t) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", t)?;
        }
        write!(f, "}}")
    }
}

/// Occurrences of `term` in a sorted slice
pub fn count_sorted(sorted: &[TermId], term: TermId) -> usize {
    let lo = sorted.partition_point(|&t| t < term);
    let hi = sorted.partition_point(|&t| t <= term);
    hi - lo
}
