//! Decoder loop
//!
//! Single-threaded controller around one batched oracle call per step:
//!
//! 1. Collect the representatives of every active group.
//! 2. Ask the oracle for all their next-term distributions at once.
//! 3. Expand each hypothesis over its legal candidates (parallel map).
//! 4. Merge by canonical key and prune to the beam width.
//!
//! The loop stops after `min(code_length, max_steps)` steps or as soon as
//! no active group is left. The query fails with `NoLegalPath` only if no
//! group ever finished.

use crate::oracle::Oracle;
use crate::pool::{BeamPool, Hypothesis};
use crate::ranker::{rank, RankedDoc};
use crate::tracker::CanonicalTracker;
use rayon::prelude::*;
use setcode_core::{CanonicalCode, DecodeConfig, DocId, Error, Result, TermId};
use setcode_index::TermSetIndex;
use std::time::Instant;

// ============================================================================
// Response
// ============================================================================

/// Counters for one decoded query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Decoding steps run
    pub steps: usize,
    /// Batched oracle calls made
    pub oracle_calls: usize,
    /// Hypotheses produced by expansion, before merging
    pub expansions: usize,
    /// Hypotheses folded into a group another ordering had opened
    pub merged_orderings: usize,
    /// Groups discarded by the beam width
    pub pruned_groups: usize,
    /// Wall time of the decode
    pub elapsed_micros: u64,
}

/// A finished canonical code with its merged score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCode {
    /// Canonical key
    pub code: CanonicalCode,
    /// Merged log-probability
    pub score: f32,
}

/// Result of decoding one query
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeResponse {
    /// Documents, best first
    pub results: Vec<RankedDoc>,
    /// Finished codes in pool order
    pub codes: Vec<ScoredCode>,
    /// Counters
    pub stats: DecodeStats,
}

impl DecodeResponse {
    /// Document ids in rank order
    pub fn doc_ids(&self) -> Vec<DocId> {
        self.results.iter().map(|r| r.doc_id).collect()
    }

    /// Score of a document, if it was ranked
    pub fn score_of(&self, doc_id: DocId) -> Option<f32> {
        self.results
            .iter()
            .find(|r| r.doc_id == doc_id)
            .map(|r| r.score)
    }
}

// ============================================================================
// Decoder
// ============================================================================

/// Permutation-invariant constrained beam decoder
///
/// Holds only shared references and a config, so one decoder can run any
/// number of queries, concurrently via [`Decoder::decode_batch`].
#[derive(Debug)]
pub struct Decoder<'a, O: Oracle> {
    index: &'a TermSetIndex,
    oracle: &'a O,
    config: DecodeConfig,
}

impl<'a, O: Oracle> Decoder<'a, O> {
    /// Create a decoder
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the config fails validation, its code length
    /// differs from the index's, or its end marker occurs in a corpus code.
    pub fn new(index: &'a TermSetIndex, oracle: &'a O, config: DecodeConfig) -> Result<Self> {
        config.validate()?;
        if config.code_length != index.config().code_length {
            return Err(Error::InvalidConfig(format!(
                "decode.code_length {} does not match index code_length {}",
                config.code_length,
                index.config().code_length
            )));
        }
        let clashing = index.postings(config.end_marker_id).len();
        if clashing > 0 {
            return Err(Error::InvalidConfig(format!(
                "decode.end_marker_id {} occurs in {} corpus codes",
                config.end_marker_id, clashing
            )));
        }
        Ok(Decoder {
            index,
            oracle,
            config,
        })
    }

    /// Decoding parameters
    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Index this decoder is constrained by
    pub fn index(&self) -> &'a TermSetIndex {
        self.index
    }

    /// Decode one query into a ranked document list
    ///
    /// # Errors
    ///
    /// - `Oracle` if the oracle fails (no retry)
    /// - `OracleShapeMismatch` if a batched call returns the wrong count
    /// - `NoLegalPath` if every hypothesis is pruned and none ever finished
    pub fn decode(&self, query: &O::Query) -> Result<DecodeResponse> {
        let started = Instant::now();
        let (pool, mut stats) = self.search(query)?;

        let results = rank(self.index, pool.finished_groups());
        let codes = pool
            .finished_groups()
            .iter()
            .map(|g| ScoredCode {
                code: g.key.clone(),
                score: g.score,
            })
            .collect();
        stats.elapsed_micros = started.elapsed().as_micros() as u64;

        tracing::debug!(
            target: "setcode::decode",
            steps = stats.steps,
            oracle_calls = stats.oracle_calls,
            groups = pool.len(),
            documents = results.len(),
            elapsed_micros = stats.elapsed_micros,
            "Decode finished"
        );

        Ok(DecodeResponse {
            results,
            codes,
            stats,
        })
    }

    /// Run the beam search, returning the final pool
    fn search(&self, query: &O::Query) -> Result<(BeamPool, DecodeStats)> {
        let tracker = CanonicalTracker::new(self.index, &self.config);
        let mut stats = DecodeStats::default();
        let mut pool = BeamPool::root();

        for step in 0..self.config.effective_steps() {
            let active: Vec<&Hypothesis> = pool.active_hypotheses().collect();
            if active.is_empty() {
                break;
            }

            let prefixes: Vec<&[TermId]> = active.iter().map(|h| h.raw.as_slice()).collect();
            let distributions = self
                .oracle
                .next_term_log_probabilities_batch(query, &prefixes)
                .map_err(|source| Error::oracle(step, source))?;
            stats.oracle_calls += 1;
            if distributions.len() != prefixes.len() {
                return Err(Error::OracleShapeMismatch {
                    expected: prefixes.len(),
                    actual: distributions.len(),
                });
            }

            let expansions: Vec<Hypothesis> = active
                .par_iter()
                .zip(distributions.par_iter())
                .map(|(hyp, dist)| {
                    tracker
                        .expand(&hyp.state, dist, step)
                        .into_iter()
                        .map(|e| {
                            let mut raw = hyp.raw.clone();
                            if !e.ends {
                                raw.push(e.term);
                            }
                            Hypothesis {
                                raw,
                                log_prob: hyp.log_prob + e.log_prob,
                                state: e.state,
                                finished: e.finished,
                            }
                        })
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
                .into_iter()
                .flatten()
                .collect();
            stats.expansions += expansions.len();

            let (next, outcome) = pool.merge_and_prune(
                expansions,
                self.config.beam_width,
                self.config.retained_orderings,
            );
            pool = next;
            stats.steps = step + 1;
            stats.merged_orderings += outcome.merged_orderings;
            stats.pruned_groups += outcome.pruned_groups;

            tracing::debug!(
                target: "setcode::decode",
                step,
                groups = pool.len(),
                finished = pool.finished_groups().len(),
                merged = outcome.merged_orderings,
                pruned = outcome.pruned_groups,
                "Beam step"
            );

            if pool.all_finished() {
                break;
            }
        }

        if pool.finished_groups().is_empty() {
            tracing::warn!(
                target: "setcode::decode",
                steps = stats.steps,
                "No legal path"
            );
            return Err(Error::NoLegalPath { steps: stats.steps });
        }
        Ok((pool, stats))
    }
}

// ============================================================================
// Tests
// ============================================================================
