//! Error types for setcode
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::types::{DocId, TermId};
use std::io;
use thiserror::Error;

/// Result type alias for setcode operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by an oracle implementation
pub type OracleError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for indexing and decoding
#[derive(Debug, Error)]
pub enum Error {
    /// A corpus code has more non-padding terms than the configured code length
    #[error("Length mismatch: document {doc_id} has {length} terms, code length is {max}")]
    LengthMismatch {
        /// Document whose code was rejected
        doc_id: DocId,
        /// Number of non-padding terms in the code
        length: usize,
        /// Configured code length
        max: usize,
    },

    /// A corpus code contains nothing but padding
    #[error("Empty code: document {doc_id} has no terms after stripping padding")]
    EmptyCode {
        /// Document whose code was rejected
        doc_id: DocId,
    },

    /// A corpus code uses a term id outside the vocabulary
    #[error("Term {term} of document {doc_id} is outside the vocabulary (size {vocab_size})")]
    TermOutOfVocabulary {
        /// Document whose code was rejected
        doc_id: DocId,
        /// Offending term
        term: TermId,
        /// Configured vocabulary size
        vocab_size: u32,
    },

    /// A persisted index was built for a different configuration
    #[error("Index version mismatch on {field}: expected {expected}, got {actual}")]
    IndexVersionMismatch {
        /// Which header field disagreed
        field: &'static str,
        /// Value the caller expects
        expected: u64,
        /// Value found in the persisted index
        actual: u64,
    },

    /// A persisted index could not be decoded
    #[error("Index corrupt: {0}")]
    IndexCorrupt(String),

    /// No active hypothesis is left and no group ever finished
    #[error("No legal path: no group finished and no hypothesis remained after {steps} steps")]
    NoLegalPath {
        /// Number of decoding steps that ran
        steps: usize,
    },

    /// The oracle failed; the query is abandoned without retry
    #[error("Oracle failed at step {step}: {source}")]
    Oracle {
        /// Decoding step of the failed call
        step: usize,
        /// Error reported by the oracle
        #[source]
        source: OracleError,
    },

    /// The oracle answered a batched call with the wrong number of distributions
    #[error("Oracle returned {actual} distributions for {expected} prefixes")]
    OracleShapeMismatch {
        /// Number of prefixes sent
        expected: usize,
        /// Number of distributions received
        actual: usize,
    },

    /// Configuration rejected by validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Wrap an oracle failure observed at `step`
    pub fn oracle(step: usize, source: OracleError) -> Self {
        Error::Oracle { step, source }
    }

    /// Whether this error was raised while loading a persisted index
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Error::IndexVersionMismatch { .. } | Error::IndexCorrupt(_)
        )
    }
}
