//! Term-set index for setcode
//!
//! Stores every corpus code in canonical (sorted) form so that all
//! permutations of one term multiset resolve to the same entry.
//!
//! - `index`: [`TermSetIndex`] construction and read-only queries
//! - `format`: persisted byte format, atomic save and checked load
//! - `trie`: arena-backed canonical trie
//! - `postings`: term -> code posting lists for containment queries

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod format;
pub mod index;
pub mod postings;
pub mod trie;

pub use format::{INDEX_FORMAT_VERSION, INDEX_MAGIC};
pub use index::{IndexStats, TermSetIndex};
pub use postings::PostingList;
pub use trie::{CodeId, NodeId};
