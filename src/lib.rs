//! setcode - generative retrieval over term-set document codes
//!
//! Each document is identified by an unordered multiset of terms (its
//! "code"). A step-wise oracle proposes terms one at a time; setcode decodes
//! a ranked document list from those proposals, allowing only codes present
//! in the corpus and merging every emission order of one multiset into a
//! single, order-independent score.
//!
//! # Quick Start
//!
//! ```ignore
//! use setcode::{DecodeConfig, Decoder, IndexConfig, TermSetIndex};
//!
//! // Build the index once per corpus
//! let index = TermSetIndex::fit(IndexConfig::new(32128, 26), &corpus_codes)?;
//! index.save(Path::new("corpus.tsix"))?;
//!
//! // Decode queries against it with any Oracle implementation
//! let decoder = Decoder::new(&index, &oracle, DecodeConfig::new(10, 26))?;
//! let response = decoder.decode(&query)?;
//! for hit in &response.results {
//!     println!("{} {}", hit.doc_id, hit.score);
//! }
//! ```
//!
//! # Architecture
//!
//! - `setcode-core`: identifiers, canonical codes, distributions, errors, config
//! - `setcode-index`: the term-set index and its persisted format
//! - `setcode-decode`: oracle capability, state tracker, beam pool, decoder, ranker

pub use setcode_core::*;
pub use setcode_decode::*;
pub use setcode_index::*;
