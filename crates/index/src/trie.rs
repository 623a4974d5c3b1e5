//! Canonical trie over sorted term sequences
//!
//! Every root-to-node path spells a non-decreasing term sequence, so all
//! permutations of one multiset share a single path. Nodes live in an arena
//! and refer to each other by index.

use setcode_core::TermId;
use std::collections::BTreeMap;

/// Arena index of a trie node
pub type NodeId = u32;

/// Identifier of a distinct canonical code, assigned in first-insertion order
pub type CodeId = u32;

/// Root node of every trie
pub const ROOT: NodeId = 0;

/// One canonical prefix
#[derive(Debug, Clone, Default)]
pub(crate) struct TrieNode {
    /// Next term -> child; every key is >= the term leading into this node
    pub(crate) children: BTreeMap<TermId, NodeId>,
    /// Set when this prefix is a complete corpus code
    pub(crate) code: Option<CodeId>,
    /// Number of terms on the path from the root
    pub(crate) depth: u32,
}

/// Arena-backed trie of canonical codes
#[derive(Debug, Clone)]
pub(crate) struct CanonicalTrie {
    nodes: Vec<TrieNode>,
}

impl Default for CanonicalTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl CanonicalTrie {
    /// Create a trie holding only the root
    pub(crate) fn new() -> Self {
        CanonicalTrie {
            nodes: vec![TrieNode::default()],
        }
    }

    /// Insert a sorted sequence, returning its terminal node
    ///
    /// The caller guarantees `sorted` is non-decreasing.
    pub(crate) fn insert_path(&mut self, sorted: &[TermId]) -> NodeId {
        debug_assert!(sorted.windows(2).all(|w| w[0] <= w[1]));
        let mut node = ROOT;
        for (depth, &term) in sorted.iter().enumerate() {
            node = match self.nodes[node as usize].children.get(&term) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len() as NodeId;
                    self.nodes.push(TrieNode {
                        children: BTreeMap::new(),
                        code: None,
                        depth: (depth + 1) as u32,
                    });
                    self.nodes[node as usize].children.insert(term, child);
                    child
                }
            };
        }
        node
    }

    /// Mark `node` as the terminal of `code`
    pub(crate) fn set_code(&mut self, node: NodeId, code: CodeId) {
        self.nodes[node as usize].code = Some(code);
    }

    /// Follow a sorted sequence from the root
    ///
    /// Touches at most `sorted.len()` nodes.
    pub(crate) fn walk(&self, sorted: &[TermId]) -> Option<NodeId> {
        let mut node = ROOT;
        for term in sorted {
            node = *self.nodes[node as usize].children.get(term)?;
        }
        Some(node)
    }

    /// Child terms of a node in ascending order
    pub(crate) fn child_terms(&self, node: NodeId) -> impl Iterator<Item = TermId> + '_ {
        self.nodes[node as usize].children.keys().copied()
    }

    /// Code terminating at `node`, if any
    pub(crate) fn code_at(&self, node: NodeId) -> Option<CodeId> {
        self.nodes[node as usize].code
    }

    /// Number of nodes, root included
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Deepest path length
    pub(crate) fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth as usize).max().unwrap_or(0)
    }
}
