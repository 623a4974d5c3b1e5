//! Synthetic oracles for tests and benches
//!
//! None of these involve a model. They let the decoder be exercised against
//! exactly known distributions.

use crate::oracle::Oracle;
use rustc_hash::FxHashMap;
use setcode_core::{log_softmax, log_sum_exp, OracleError, TermDistribution, TermId};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Error raised by [`FailingOracle`]
#[derive(Debug, Error)]
#[error("synthetic oracle failure on call {call}")]
pub struct OracleFailure {
    /// Zero-based batched call that failed
    pub call: usize,
}

// ============================================================================
// ScriptedOracle
// ============================================================================

/// Fixed distribution per exact raw prefix, with a fallback
///
/// Assigns arbitrary per-order log-probabilities, so two emission orders of
/// the same multiset can be scored differently.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOracle {
    steps: FxHashMap<Vec<TermId>, TermDistribution>,
    fallback: TermDistribution,
}

impl ScriptedOracle {
    /// Oracle answering `fallback` for every unscripted prefix
    pub fn new(fallback: TermDistribution) -> Self {
        ScriptedOracle {
            steps: FxHashMap::default(),
            fallback,
        }
    }

    /// Script the distribution after `prefix`
    pub fn with_step(mut self, prefix: &[TermId], pairs: &[(TermId, f32)]) -> Self {
        self.steps.insert(
            prefix.to_vec(),
            TermDistribution::from_pairs(pairs.iter().copied()),
        );
        self
    }
}

impl Oracle for ScriptedOracle {
    type Query = ();

    fn next_term_log_probabilities(
        &self,
        _query: &(),
        prefix: &[TermId],
    ) -> Result<TermDistribution, OracleError> {
        Ok(self.steps.get(prefix).unwrap_or(&self.fallback).clone())
    }
}

// ============================================================================
// PreferenceOracle
// ============================================================================

/// Query for [`PreferenceOracle`]: one `(term, logit)` slot per wanted term
pub type Preferences = Vec<(TermId, f32)>;

/// Query-driven oracle favoring the query's own terms
///
/// Each emitted term consumes one matching slot of the query. The next-term
/// distribution is the log-softmax over the remaining slots plus the end
/// marker at logit 0.
#[derive(Debug, Clone, Copy)]
pub struct PreferenceOracle {
    end_marker: TermId,
}

impl PreferenceOracle {
    /// Oracle emitting `end_marker` as its stop term
    pub fn new(end_marker: TermId) -> Self {
        PreferenceOracle { end_marker }
    }
}

impl Oracle for PreferenceOracle {
    type Query = Preferences;

    fn next_term_log_probabilities(
        &self,
        query: &Preferences,
        prefix: &[TermId],
    ) -> Result<TermDistribution, OracleError> {
        let mut remaining: Vec<(TermId, f32)> = query.clone();
        for term in prefix {
            if let Some(pos) = remaining.iter().position(|(t, _)| t == term) {
                remaining.remove(pos);
            }
        }

        // Duplicate slots of one term pool their mass
        let mut logits: FxHashMap<TermId, Vec<f32>> = FxHashMap::default();
        for (term, logit) in remaining {
            logits.entry(term).or_default().push(logit);
        }
        logits.entry(self.end_marker).or_default().push(0.0);

        let mut terms: Vec<TermId> = logits.keys().copied().collect();
        terms.sort_unstable();
        let merged: Vec<f32> = terms
            .iter()
            .map(|t| log_sum_exp(logits[t].iter().copied()))
            .collect();
        Ok(terms.into_iter().zip(log_softmax(&merged)).collect())
    }
}

// ============================================================================
// UniformOracle
// ============================================================================

/// Every term of the vocabulary equally likely at every step
#[derive(Debug, Clone, Copy)]
pub struct UniformOracle {
    vocab_size: u32,
}

impl UniformOracle {
    /// Uniform over `0..vocab_size`
    pub fn new(vocab_size: u32) -> Self {
        UniformOracle { vocab_size }
    }
}

impl Oracle for UniformOracle {
    type Query = ();

    fn next_term_log_probabilities(
        &self,
        _query: &(),
        _prefix: &[TermId],
    ) -> Result<TermDistribution, OracleError> {
        Ok(TermDistribution::from_logits(&vec![0.0; self.vocab_size as usize]))
    }
}

// ============================================================================
// FailingOracle
// ============================================================================

/// Answers a fixed distribution for `ok_calls` batched calls, then fails
#[derive(Debug)]
pub struct FailingOracle {
    ok_calls: usize,
    calls: AtomicUsize,
    distribution: TermDistribution,
}

impl FailingOracle {
    /// Succeed `ok_calls` times with `distribution`, fail afterwards
    pub fn after_calls(ok_calls: usize, distribution: TermDistribution) -> Self {
        FailingOracle {
            ok_calls,
            calls: AtomicUsize::new(0),
            distribution,
        }
    }

    /// Batched calls observed so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Oracle for FailingOracle {
    type Query = ();

    fn next_term_log_probabilities(
        &self,
        query: &(),
        prefix: &[TermId],
    ) -> Result<TermDistribution, OracleError> {
        let mut out = self.next_term_log_probabilities_batch(query, &[prefix])?;
        Ok(out.pop().unwrap_or_default())
    }

    fn next_term_log_probabilities_batch(
        &self,
        _query: &(),
        prefixes: &[&[TermId]],
    ) -> Result<Vec<TermDistribution>, OracleError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.ok_calls {
            return Err(Box::new(OracleFailure { call }));
        }
        Ok(vec![self.distribution.clone(); prefixes.len()])
    }
}
