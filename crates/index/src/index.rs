//! Term-set index
//!
//! Maps canonical (sorted, padding-free) codes to the documents sharing
//! them. Built once per corpus with [`TermSetIndex::fit`] or restored with
//! [`TermSetIndex::load`](crate::format), then read-only: every query method
//! takes `&self`, so one index can back any number of concurrent decodes.
//!
//! # Structure
//!
//! - A canonical trie answers prefix questions (`children`, `leaves`).
//! - Term posting lists answer containment questions (`extensions`,
//!   `codes_containing`) for multisets emitted in arbitrary order.
//!
//! Canonical collisions (several documents with the same term multiset) are
//! kept: the leaf holds every document id in corpus order.

use crate::postings::CodePostings;
use crate::trie::{CanonicalTrie, CodeId};
use rayon::prelude::*;
use setcode_core::{CanonicalCode, DocId, Error, IndexConfig, Result, TermId};

// ============================================================================
// CodeEntry
// ============================================================================

/// One distinct canonical code and the documents that share it
#[derive(Debug, Clone)]
pub(crate) struct CodeEntry {
    pub(crate) terms: CanonicalCode,
    pub(crate) docs: Vec<DocId>,
}

// ============================================================================
// IndexStats
// ============================================================================

/// Summary counters for a fitted index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexStats {
    /// Documents indexed
    pub documents: usize,
    /// Distinct canonical codes
    pub codes: usize,
    /// Documents beyond the first on a shared code
    pub collisions: usize,
    /// Trie nodes, root included
    pub nodes: usize,
    /// Longest canonical code
    pub max_depth: usize,
}

// ============================================================================
// TermSetIndex
// ============================================================================

/// Immutable-after-build index of canonical document codes
#[derive(Debug, Clone)]
pub struct TermSetIndex {
    config: IndexConfig,
    trie: CanonicalTrie,
    codes: Vec<CodeEntry>,
    postings: CodePostings,
    documents: usize,
}

impl TermSetIndex {
    /// Create an empty index for `config`
    pub fn new(config: IndexConfig) -> Result<Self> {
        config.validate()?;
        Ok(TermSetIndex {
            config,
            trie: CanonicalTrie::new(),
            codes: Vec::new(),
            postings: CodePostings::new(),
            documents: 0,
        })
    }

    /// Build an index from per-document codes
    ///
    /// Document `i` of `codes` gets id `i`. Each code has its padding and
    /// leading start token stripped, is sorted, and is appended to its leaf
    /// in corpus order.
    ///
    /// # Errors
    ///
    /// - `LengthMismatch` if a code has more than `code_length` terms
    /// - `EmptyCode` if a code is all padding
    /// - `TermOutOfVocabulary` if a term id is >= `vocab_size`
    ///
    /// The first offending document in corpus order is reported.
    pub fn fit<C>(config: IndexConfig, codes: &[C]) -> Result<Self>
    where
        C: AsRef<[TermId]> + Sync,
    {
        let mut index = Self::new(config)?;
        if DocId::try_from(codes.len()).is_err() {
            return Err(Error::InvalidConfig(format!(
                "corpus of {} documents exceeds the document id range",
                codes.len()
            )));
        }

        // Canonicalize in parallel, insert sequentially to keep corpus order
        let canonical: Vec<Result<CanonicalCode>> = codes
            .par_iter()
            .enumerate()
            .map(|(i, raw)| canonicalize_checked(&index.config, i as DocId, raw.as_ref()))
            .collect();

        for (i, code) in canonical.into_iter().enumerate() {
            index.insert_canonical(code?, i as DocId);
        }

        let stats = index.stats();
        tracing::info!(
            target: "setcode::index",
            documents = stats.documents,
            codes = stats.codes,
            collisions = stats.collisions,
            nodes = stats.nodes,
            "Term-set index fitted"
        );

        Ok(index)
    }

    /// Add one already-validated canonical code for `doc`
    pub(crate) fn insert_canonical(&mut self, code: CanonicalCode, doc: DocId) {
        let node = self.trie.insert_path(&code);
        match self.trie.code_at(node) {
            Some(existing) => self.codes[existing as usize].docs.push(doc),
            None => {
                let id = self.codes.len() as CodeId;
                self.trie.set_code(node, id);
                self.postings.add_code(id, &code);
                self.codes.push(CodeEntry {
                    terms: code,
                    docs: vec![doc],
                });
            }
        }
        self.documents += 1;
    }

    /// Configuration the index was built for
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Canonicalize a raw corpus-style code with this index's padding rules
    pub fn canonicalize(&self, raw: &[TermId]) -> CanonicalCode {
        CanonicalCode::from_raw(raw, self.config.pad_token_id, self.config.start_token_id)
    }

    // ========================================================================
    // Prefix queries (trie)
    // ========================================================================

    /// Terms that extend a canonical prefix along some corpus code, ascending
    ///
    /// The prefix is sorted before the walk. Every returned term is >= the
    /// last prefix term. An empty result means no corpus code has this prefix.
    pub fn children(&self, prefix: &[TermId]) -> Vec<TermId> {
        let prefix = CanonicalCode::from_terms(prefix.iter().copied());
        match self.trie.walk(&prefix) {
            Some(node) => self.trie.child_terms(node).collect(),
            None => Vec::new(),
        }
    }

    /// Whether some corpus code starts with this canonical prefix
    pub fn is_prefix(&self, prefix: &[TermId]) -> bool {
        let prefix = CanonicalCode::from_terms(prefix.iter().copied());
        self.trie.walk(&prefix).is_some()
    }

    /// Documents whose code is exactly this multiset, in corpus order
    ///
    /// Returns `None` when the multiset is not a complete corpus code.
    pub fn leaves(&self, code: &[TermId]) -> Option<&[DocId]> {
        let code = CanonicalCode::from_terms(code.iter().copied());
        self.code_id(&code).map(|id| self.code_docs(id))
    }

    /// Code id of an exact canonical code
    pub fn code_id(&self, code: &CanonicalCode) -> Option<CodeId> {
        self.trie.walk(code).and_then(|node| self.trie.code_at(node))
    }

    // ========================================================================
    // Containment queries (postings)
    // ========================================================================

    /// Codes containing `multiset` (with multiplicity), ascending by id
    pub fn codes_containing(&self, multiset: &CanonicalCode) -> Vec<CodeId> {
        if multiset.is_empty() {
            return (0..self.codes.len() as CodeId).collect();
        }
        self.postings
            .rarest(multiset)
            .iter()
            .copied()
            .filter(|&id| multiset.is_sub_multiset_of(&self.codes[id as usize].terms))
            .collect()
    }

    /// Terms `c` such that `multiset ∪ {c}` is contained in some corpus code
    ///
    /// This is the legal continuation set for a hypothesis that has emitted
    /// `multiset` in any order. Ascending, without duplicates.
    pub fn extensions(&self, multiset: &CanonicalCode) -> Vec<TermId> {
        if multiset.is_empty() {
            return self.postings.terms();
        }
        let mut terms: Vec<TermId> = self
            .codes_containing(multiset)
            .into_iter()
            .flat_map(|id| multiset.remainder(&self.codes[id as usize].terms))
            .collect();
        terms.sort_unstable();
        terms.dedup();
        terms
    }

    /// Codes containing `term`, ascending by id
    pub fn postings(&self, term: TermId) -> &[CodeId] {
        self.postings.codes(term)
    }

    // ========================================================================
    // Code access
    // ========================================================================

    /// Canonical terms of a code
    pub fn code_terms(&self, id: CodeId) -> &CanonicalCode {
        &self.codes[id as usize].terms
    }

    /// Documents sharing a code, in corpus order
    pub fn code_docs(&self, id: CodeId) -> &[DocId] {
        &self.codes[id as usize].docs
    }

    /// Iterate over `(code id, terms, documents)` in code id order
    pub fn iter_codes(&self) -> impl Iterator<Item = (CodeId, &CanonicalCode, &[DocId])> + '_ {
        self.codes
            .iter()
            .enumerate()
            .map(|(i, c)| (i as CodeId, &c.terms, c.docs.as_slice()))
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    /// Number of distinct canonical codes
    pub fn code_count(&self) -> usize {
        self.codes.len()
    }

    /// Number of documents indexed
    pub fn document_count(&self) -> usize {
        self.documents
    }

    /// Check if the index holds no codes
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Summary counters
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            documents: self.documents,
            codes: self.codes.len(),
            collisions: self.codes.iter().map(|c| c.docs.len() - 1).sum(),
            nodes: self.trie.len(),
            max_depth: self.trie.max_depth(),
        }
    }
}

/// Strip, sort and validate one corpus code
pub(crate) fn canonicalize_checked(
    config: &IndexConfig,
    doc_id: DocId,
    raw: &[TermId],
) -> Result<CanonicalCode> {
    let code = CanonicalCode::from_raw(raw, config.pad_token_id, config.start_token_id);
    if code.is_empty() {
        return Err(Error::EmptyCode { doc_id });
    }
    if code.len() > config.code_length {
        return Err(Error::LengthMismatch {
            doc_id,
            length: code.len(),
            max: config.code_length,
        });
    }
    // Sorted, so the last term is the largest
    if let Some(&term) = code.last() {
        if term >= config.vocab_size {
            return Err(Error::TermOutOfVocabulary {
                doc_id,
                term,
                vocab_size: config.vocab_size,
            });
        }
    }
    Ok(code)
}

// ============================================================================
// Tests
// ============================================================================
