//! Next-term distributions and log-space arithmetic
//!
//! Oracles hand the decoder a sparse mapping from term to log-probability.
//! Absent terms are treated as impossible (log-probability of -inf).

use crate::types::TermId;
use rustc_hash::FxHashMap;

/// Sparse mapping from term to log-probability for one decoding step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermDistribution {
    log_probs: FxHashMap<TermId, f32>,
}

impl TermDistribution {
    /// Create an empty distribution
    pub fn new() -> Self {
        TermDistribution {
            log_probs: FxHashMap::default(),
        }
    }

    /// Build from `(term, log_prob)` pairs; later duplicates overwrite earlier ones
    pub fn from_pairs<I: IntoIterator<Item = (TermId, f32)>>(pairs: I) -> Self {
        TermDistribution {
            log_probs: pairs.into_iter().collect(),
        }
    }

    /// Build from dense logits indexed by term id, normalized with log-softmax
    pub fn from_logits(logits: &[f32]) -> Self {
        let normalized = log_softmax(logits);
        TermDistribution {
            log_probs: normalized
                .into_iter()
                .enumerate()
                .filter(|(_, lp)| lp.is_finite())
                .map(|(i, lp)| (i as TermId, lp))
                .collect(),
        }
    }

    /// Set the log-probability of a term
    pub fn insert(&mut self, term: TermId, log_prob: f32) {
        self.log_probs.insert(term, log_prob);
    }

    /// Log-probability of a term, `None` when the oracle did not propose it
    pub fn get(&self, term: TermId) -> Option<f32> {
        self.log_probs.get(&term).copied()
    }

    /// Number of proposed terms
    pub fn len(&self) -> usize {
        self.log_probs.len()
    }

    /// Whether no term was proposed
    pub fn is_empty(&self) -> bool {
        self.log_probs.is_empty()
    }

    /// Iterate over `(term, log_prob)` in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (TermId, f32)> + '_ {
        self.log_probs.iter().map(|(&t, &lp)| (t, lp))
    }

    /// The `k` most probable terms, ties broken by lower term id
    pub fn top_k(&self, k: usize) -> Vec<(TermId, f32)> {
        let mut ranked: Vec<(TermId, f32)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(k);
        ranked
    }
}

impl FromIterator<(TermId, f32)> for TermDistribution {
    fn from_iter<I: IntoIterator<Item = (TermId, f32)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

// ============================================================================
// Log-space helpers
// ============================================================================

/// Numerically stable `ln(sum(exp(x)))`
///
/// Returns `-inf` for an empty input or when every input is `-inf`.
pub fn log_sum_exp<I: IntoIterator<Item = f32>>(values: I) -> f32 {
    let values: Vec<f64> = values.into_iter().map(f64::from).collect();
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f32::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f32::INFINITY;
    }
    let sum: f64 = values.iter().map(|&v| (v - max).exp()).sum();
    (max + sum.ln()) as f32
}

/// Log-softmax: `log(softmax(x))`
pub fn log_softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }
    let lse = log_sum_exp(logits.iter().copied());
    logits.iter().map(|&v| v - lse).collect()
}
