//! Beam pool: merge by canonical key, then prune
//!
//! After each step every new hypothesis is grouped by `(canonical key,
//! finished)`. A group's score is the log-sum-exp of every raw ordering that
//! reached it this step, plus the carried score of the same finished group
//! from earlier steps. Each group keeps at most `retained_orderings` raw
//! orderings to continue expansion.
//!
//! Active and finished groups are pruned separately, each to `beam_width`.
//! A finished group is only ever displaced by a better finished group.
//!
//! Ordering is total and deterministic:
//! - groups: score descending, then canonical key ascending
//! - representatives: log-probability descending, then raw sequence ascending

use crate::tracker::CanonicalState;
use rustc_hash::FxHashMap;
use setcode_core::{log_sum_exp, CanonicalCode, TermId};
use std::cmp::Ordering;

// ============================================================================
// Hypothesis
// ============================================================================

/// One raw emission order with its cumulative oracle log-probability
#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    /// Emitted terms in emission order (the end marker is not recorded)
    pub raw: Vec<TermId>,
    /// Sum of step log-probabilities along `raw`
    pub log_prob: f32,
    /// Canonical state reached by `raw`
    pub state: CanonicalState,
    /// No further expansion
    pub finished: bool,
}

impl Hypothesis {
    /// The empty hypothesis every decode starts from
    pub fn root() -> Self {
        Hypothesis {
            raw: Vec::new(),
            log_prob: 0.0,
            state: CanonicalState::root(),
            finished: false,
        }
    }

    /// Canonical key of this hypothesis
    pub fn key(&self) -> &CanonicalCode {
        self.state.multiset()
    }
}

fn representative_order(a: &Hypothesis, b: &Hypothesis) -> Ordering {
    b.log_prob
        .total_cmp(&a.log_prob)
        .then_with(|| a.raw.cmp(&b.raw))
}

// ============================================================================
// Group
// ============================================================================

/// Hypotheses sharing one canonical key and finished flag
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Canonical key
    pub key: CanonicalCode,
    /// Whether this group's hypotheses are finished
    pub finished: bool,
    /// Merged log-probability mass of every ordering explored
    pub score: f32,
    /// Retained raw orderings, best first
    pub representatives: Vec<Hypothesis>,
}

fn group_order(a: &Group, b: &Group) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.key.cmp(&b.key))
}

/// Counters from one merge-and-prune step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Hypotheses folded into a group another ordering already opened
    pub merged_orderings: usize,
    /// Active and finished groups discarded by the beam width
    pub pruned_groups: usize,
}

// ============================================================================
// BeamPool
// ============================================================================

/// Bounded sets of active and finished groups for one decoding step
#[derive(Debug, Clone, Default)]
pub struct BeamPool {
    active: Vec<Group>,
    finished: Vec<Group>,
}

impl BeamPool {
    /// Pool holding only the root hypothesis
    pub fn root() -> Self {
        BeamPool {
            active: vec![Group {
                key: CanonicalCode::empty(),
                finished: false,
                score: 0.0,
                representatives: vec![Hypothesis::root()],
            }],
            finished: Vec::new(),
        }
    }

    /// Groups still expanding, best first
    pub fn active_groups(&self) -> &[Group] {
        &self.active
    }

    /// Finished groups, best first
    pub fn finished_groups(&self) -> &[Group] {
        &self.finished
    }

    /// Number of groups, active and finished
    pub fn len(&self) -> usize {
        self.active.len() + self.finished.len()
    }

    /// Whether every hypothesis has been pruned
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.finished.is_empty()
    }

    /// Whether no group is left to expand
    pub fn all_finished(&self) -> bool {
        self.active.is_empty()
    }

    /// Representatives of active groups, in pool order
    pub fn active_hypotheses(&self) -> impl Iterator<Item = &Hypothesis> + '_ {
        self.active.iter().flat_map(|g| g.representatives.iter())
    }

    /// Next pool from this step's expansions
    ///
    /// Finished groups of `self` carry over with their score and absorb
    /// later finished orderings of the same key. Active groups of `self`
    /// are replaced by their expansions. Each side is pruned to
    /// `beam_width` on its own.
    pub fn merge_and_prune(
        self,
        expansions: Vec<Hypothesis>,
        beam_width: usize,
        retained_orderings: usize,
    ) -> (BeamPool, MergeOutcome) {
        struct Pending {
            mass: Vec<f32>,
            representatives: Vec<Hypothesis>,
        }

        let mut outcome = MergeOutcome::default();
        let mut order: Vec<(CanonicalCode, bool)> = Vec::new();
        let mut pending: FxHashMap<(CanonicalCode, bool), Pending> = FxHashMap::default();

        for group in self.finished {
            let slot = (group.key, true);
            order.push(slot.clone());
            pending.insert(
                slot,
                Pending {
                    mass: vec![group.score],
                    representatives: group.representatives,
                },
            );
        }

        for hyp in expansions {
            let slot = (hyp.key().clone(), hyp.finished);
            match pending.get_mut(&slot) {
                Some(p) => {
                    outcome.merged_orderings += 1;
                    p.mass.push(hyp.log_prob);
                    p.representatives.push(hyp);
                }
                None => {
                    order.push(slot.clone());
                    pending.insert(
                        slot,
                        Pending {
                            mass: vec![hyp.log_prob],
                            representatives: vec![hyp],
                        },
                    );
                }
            }
        }

        let (finished, active): (Vec<Group>, Vec<Group>) = order
            .into_iter()
            .filter_map(|slot| {
                let p = pending.remove(&slot)?;
                let mut representatives = p.representatives;
                representatives.sort_by(representative_order);
                representatives.truncate(retained_orderings.max(1));
                Some(Group {
                    key: slot.0,
                    finished: slot.1,
                    score: log_sum_exp(p.mass),
                    representatives,
                })
            })
            .partition(|g| g.finished);

        let active = prune(active, beam_width, &mut outcome);
        let finished = prune(finished, beam_width, &mut outcome);
        (BeamPool { active, finished }, outcome)
    }
}

fn prune(mut groups: Vec<Group>, beam_width: usize, outcome: &mut MergeOutcome) -> Vec<Group> {
    groups.sort_by(group_order);
    if groups.len() > beam_width {
        outcome.pruned_groups += groups.len() - beam_width;
        for dropped in &groups[beam_width..] {
            tracing::trace!(
                target: "setcode::decode",
                key = %dropped.key,
                finished = dropped.finished,
                score = dropped.score,
                "Pruned group"
            );
        }
        groups.truncate(beam_width);
    }
    groups
}

// ============================================================================
// Tests
// ============================================================================
