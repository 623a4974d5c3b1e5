//! Core types for setcode
//!
//! This crate defines the foundational types used throughout the system:
//! - TermId / DocId: opaque vocabulary and document identifiers
//! - CanonicalCode: sorted, padding-free multiset form of a document code
//! - TermDistribution: sparse next-term log-probabilities from the oracle
//! - Log-space helpers: log_sum_exp, log_softmax
//! - Error: Error type hierarchy
//! - Config: IndexConfig, DecodeConfig, `setcode.toml` loading

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod distribution;
pub mod error;
pub mod types;

pub use config::{DecodeConfig, IndexConfig, SetcodeConfig, CONFIG_FILE_NAME, DEFAULT_END_MARKER};
pub use distribution::{log_softmax, log_sum_exp, TermDistribution};
pub use error::{Error, OracleError, Result};
pub use types::{count_sorted, CanonicalCode, DocId, TermId, DEFAULT_PAD_TOKEN};
