//! Permutation-invariant constrained beam decoding
//!
//! Decodes ranked document lists from a step-wise [`Oracle`], restricted to
//! codes present in a [`TermSetIndex`](setcode_index::TermSetIndex), with
//! every emission order of one term multiset merged into a single entry.
//!
//! - `oracle`: the injected next-term scorer
//! - `tracker`: order-independent legality over canonical multisets
//! - `pool`: grouping by canonical key, log-sum-exp merge, pruning
//! - `decoder`: the step loop and its response
//! - `ranker`: finished groups to scored documents
//! - `batch`: parallel multi-query decoding
//! - `testing`: synthetic oracles

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod decoder;
pub mod oracle;
pub mod pool;
pub mod ranker;
pub mod testing;
pub mod tracker;

pub use decoder::{DecodeResponse, DecodeStats, Decoder, ScoredCode};
pub use oracle::Oracle;
pub use pool::{BeamPool, Group, Hypothesis, MergeOutcome};
pub use ranker::{rank, RankedDoc};
pub use tracker::{CanonicalState, CanonicalTracker, Expansion};
