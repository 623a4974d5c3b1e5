//! Term -> code posting lists
//!
//! The trie answers "which codes start with this sorted prefix". Emission
//! order is arbitrary, so legality also needs "which codes contain this
//! multiset", answered here by intersecting posting lists.

use crate::trie::CodeId;
use rustc_hash::FxHashMap;
use setcode_core::{CanonicalCode, TermId};

// ============================================================================
// PostingList
// ============================================================================

/// Codes containing a term, ascending by code id, each code listed once
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    /// Code ids
    pub codes: Vec<CodeId>,
}

impl PostingList {
    /// Create a new empty posting list
    pub fn new() -> Self {
        PostingList { codes: vec![] }
    }

    /// Append a code; codes arrive in ascending id order during fit
    pub fn add(&mut self, code: CodeId) {
        debug_assert!(self.codes.last().map_or(true, |&last| last < code));
        self.codes.push(code);
    }

    /// Number of codes containing this term
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Check if posting list is empty
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

// ============================================================================
// CodePostings
// ============================================================================

/// Inverted map from term to the codes using it
#[derive(Debug, Clone, Default)]
pub(crate) struct CodePostings {
    lists: FxHashMap<TermId, PostingList>,
}

impl CodePostings {
    pub(crate) fn new() -> Self {
        CodePostings {
            lists: FxHashMap::default(),
        }
    }

    /// Register every distinct term of a newly created code
    pub(crate) fn add_code(&mut self, code: CodeId, terms: &CanonicalCode) {
        let mut prev = None;
        for &term in terms.iter() {
            if prev == Some(term) {
                continue;
            }
            prev = Some(term);
            self.lists.entry(term).or_default().add(code);
        }
    }

    /// Codes containing `term`; empty when the term is unused
    pub(crate) fn codes(&self, term: TermId) -> &[CodeId] {
        self.lists
            .get(&term)
            .map(|list| list.codes.as_slice())
            .unwrap_or(&[])
    }

    /// Every term used by at least one code, ascending
    pub(crate) fn terms(&self) -> Vec<TermId> {
        let mut terms: Vec<TermId> = self.lists.keys().copied().collect();
        terms.sort_unstable();
        terms
    }

    /// Shortest posting list among the distinct terms of a non-empty multiset
    pub(crate) fn rarest<'a>(&'a self, multiset: &CanonicalCode) -> &'a [CodeId] {
        let mut best: Option<&[CodeId]> = None;
        for &term in multiset.iter() {
            let list = self.codes(term);
            if best.map_or(true, |b| list.len() < b.len()) {
                best = Some(list);
            }
        }
        best.unwrap_or(&[])
    }
}
