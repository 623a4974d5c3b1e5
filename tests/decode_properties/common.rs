//! Shared helpers for the decode property suite

#![allow(dead_code)]

use proptest::prelude::*;
use setcode::{IndexConfig, TermId, TermSetIndex};
use std::sync::Once;

/// Vocabulary used by randomized corpora; 0 and 1 stay reserved
pub const VOCAB: u32 = 12;

/// End marker used throughout the suite
pub const END: TermId = 1;

static TRACING: Once = Once::new();

/// Route `tracing` output to the test harness once per process
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// Fit an index over `codes` with the suite vocabulary
pub fn fit(codes: &[Vec<TermId>], code_length: usize) -> TermSetIndex {
    TermSetIndex::fit(IndexConfig::new(64, code_length), codes).unwrap()
}

/// Random corpus of codes with up to `code_length` terms drawn from `2..VOCAB`
pub fn corpus(code_length: usize) -> impl Strategy<Value = Vec<Vec<TermId>>> {
    prop::collection::vec(prop::collection::vec(2..VOCAB, 1..=code_length), 1..16)
}
