//! Canonical state tracker
//!
//! Legality of a candidate term depends only on the multiset emitted so far,
//! never on emission order. A [`CanonicalState`] keeps that multiset in
//! sorted form together with the corpus codes that still contain it, so each
//! advance only filters the surviving codes instead of searching the index.
//!
//! A candidate `c` is legal for multiset `S` iff `S ∪ {c}` is contained in
//! some corpus code. The end marker is legal iff `S` is itself a complete
//! code.

use setcode_core::{count_sorted, log_softmax, CanonicalCode, DecodeConfig, TermDistribution, TermId};
use setcode_index::{CodeId, TermSetIndex};

// ============================================================================
// CanonicalState
// ============================================================================

/// Sorted emitted multiset plus the corpus codes still reachable from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalState {
    multiset: CanonicalCode,
    /// Codes containing `multiset`, ascending; `None` at the root (every code)
    codes: Option<Vec<CodeId>>,
}

impl CanonicalState {
    /// State before any term is emitted
    pub fn root() -> Self {
        CanonicalState {
            multiset: CanonicalCode::empty(),
            codes: None,
        }
    }

    /// Canonical key of this state
    pub fn multiset(&self) -> &CanonicalCode {
        &self.multiset
    }

    /// Number of emitted terms
    pub fn len(&self) -> usize {
        self.multiset.len()
    }

    /// State after emitting `term`, or `None` if the result is illegal
    pub fn advance(&self, index: &TermSetIndex, term: TermId) -> Option<CanonicalState> {
        let multiset = self.multiset.with_term(term);
        let needed = multiset.count(term);
        let source = match &self.codes {
            Some(codes) => codes.as_slice(),
            None => index.postings(term),
        };
        let codes: Vec<CodeId> = source
            .iter()
            .copied()
            .filter(|&id| count_sorted(index.code_terms(id), term) >= needed)
            .collect();
        if codes.is_empty() {
            return None;
        }
        Some(CanonicalState {
            multiset,
            codes: Some(codes),
        })
    }

    /// Every term that may legally follow, ascending
    pub fn legal_terms(&self, index: &TermSetIndex) -> Vec<TermId> {
        match &self.codes {
            None => index.extensions(&self.multiset),
            Some(codes) => {
                let mut terms: Vec<TermId> = codes
                    .iter()
                    .flat_map(|&id| self.multiset.remainder(index.code_terms(id)))
                    .collect();
                terms.sort_unstable();
                terms.dedup();
                terms
            }
        }
    }

    /// The corpus code equal to this multiset, if there is one
    pub fn complete_code(&self, index: &TermSetIndex) -> Option<CodeId> {
        let codes = self.codes.as_ref()?;
        codes
            .iter()
            .copied()
            .find(|&id| index.code_terms(id).len() == self.multiset.len())
    }

    /// Whether this multiset is a complete corpus code
    pub fn is_complete(&self, index: &TermSetIndex) -> bool {
        self.complete_code(index).is_some()
    }

    /// Whether some corpus code strictly contains this multiset
    pub fn is_extendable(&self, index: &TermSetIndex) -> bool {
        match &self.codes {
            None => !index.is_empty(),
            Some(codes) => codes
                .iter()
                .any(|&id| index.code_terms(id).len() > self.multiset.len()),
        }
    }
}

// ============================================================================
// Expansion
// ============================================================================

/// One legal continuation of a hypothesis
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    /// Emitted term; the end marker when `ends` is set
    pub term: TermId,
    /// Step log-probability after renormalization (if enabled)
    pub log_prob: f32,
    /// Canonical state after the step
    pub state: CanonicalState,
    /// The hypothesis emitted the end marker
    pub ends: bool,
    /// The hypothesis is finished after this step
    pub finished: bool,
}

/// Legal candidate filter for one decode request
#[derive(Debug, Clone, Copy)]
pub struct CanonicalTracker<'a> {
    index: &'a TermSetIndex,
    config: &'a DecodeConfig,
}

impl<'a> CanonicalTracker<'a> {
    /// Create a tracker over a shared index
    pub fn new(index: &'a TermSetIndex, config: &'a DecodeConfig) -> Self {
        CanonicalTracker { index, config }
    }

    /// Legal continuations of `state` at `step`, best first
    ///
    /// Candidates are the legal terms the oracle proposed. At the final step
    /// only terms landing on a complete code survive. Then, in order:
    /// optional renormalization over the survivors, the optional beam
    /// threshold, and the per-hypothesis cap (ties: lower term id first).
    pub fn expand(
        &self,
        state: &CanonicalState,
        distribution: &TermDistribution,
        step: usize,
    ) -> Vec<Expansion> {
        let final_step = step + 1 >= self.config.effective_steps();
        let early_stop = self.config.early_stop_start.is_some_and(|s| step >= s);
        let end_marker = self.config.end_marker_id;
        let mut out = Vec::new();

        if state.is_complete(self.index) {
            if let Some(lp) = distribution.get(end_marker) {
                out.push(Expansion {
                    term: end_marker,
                    log_prob: lp,
                    state: state.clone(),
                    ends: true,
                    finished: true,
                });
            }
        }

        for term in state.legal_terms(self.index) {
            if term == end_marker {
                continue;
            }
            let Some(lp) = distribution.get(term) else {
                continue;
            };
            let Some(next) = state.advance(self.index, term) else {
                continue;
            };
            let complete = next.is_complete(self.index);
            if final_step && !complete {
                continue;
            }
            let finished =
                final_step || (early_stop && complete && !next.is_extendable(self.index));
            out.push(Expansion {
                term,
                log_prob: lp,
                state: next,
                ends: false,
                finished,
            });
        }

        if self.config.renormalize && !out.is_empty() {
            let raw: Vec<f32> = out.iter().map(|e| e.log_prob).collect();
            for (e, lp) in out.iter_mut().zip(log_softmax(&raw)) {
                e.log_prob = lp;
            }
        }

        if let Some(threshold) = self.config.beam_threshold {
            if step >= self.config.threshold_start_step {
                out.retain(|e| e.log_prob >= threshold);
            }
        }

        out.sort_by(|a, b| b.log_prob.total_cmp(&a.log_prob).then(a.term.cmp(&b.term)));
        out.truncate(self.config.candidate_cap());
        out
    }
}

// ============================================================================
// Tests
// ============================================================================
