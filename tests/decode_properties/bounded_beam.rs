//! After every step the pool holds at most `beam_width` active groups and
//! at most `beam_width` finished groups

use crate::common::{corpus, fit, END, VOCAB};
use proptest::prelude::*;
use setcode::testing::UniformOracle;
use setcode::{
    BeamPool, CanonicalTracker, DecodeConfig, Decoder, Hypothesis, Oracle, TermId,
};

/// Drive the pool by hand so every intermediate step can be observed
fn step_sizes(
    index: &setcode::TermSetIndex,
    config: &DecodeConfig,
    oracle: &UniformOracle,
) -> Vec<(usize, usize)> {
    let tracker = CanonicalTracker::new(index, config);
    let mut pool = BeamPool::root();
    let mut sizes = Vec::new();

    for step in 0..config.effective_steps() {
        let active: Vec<&Hypothesis> = pool.active_hypotheses().collect();
        if active.is_empty() {
            break;
        }
        let mut expansions = Vec::new();
        for hyp in active {
            let dist = oracle.next_term_log_probabilities(&(), &hyp.raw).unwrap();
            for e in tracker.expand(&hyp.state, &dist, step) {
                let mut raw: Vec<TermId> = hyp.raw.clone();
                if !e.ends {
                    raw.push(e.term);
                }
                expansions.push(Hypothesis {
                    raw,
                    log_prob: hyp.log_prob + e.log_prob,
                    state: e.state,
                    finished: e.finished,
                });
            }
        }
        let (next, _) =
            pool.merge_and_prune(expansions, config.beam_width, config.retained_orderings);
        pool = next;
        sizes.push((pool.active_groups().len(), pool.finished_groups().len()));
    }
    sizes
}

#[test]
fn test_wide_corpus_is_pruned_to_beam() {
    let codes: Vec<Vec<TermId>> = (2..10).flat_map(|a| (2..10).map(move |b| vec![a, b])).collect();
    let index = fit(&codes, 2);
    let config = DecodeConfig::new(3, 2).with_end_marker(END);
    let oracle = UniformOracle::new(VOCAB);

    let sizes = step_sizes(&index, &config, &oracle);
    assert_eq!(sizes, vec![(3, 0), (0, 3)]);

    let response = Decoder::new(&index, &oracle, config).unwrap().decode(&()).unwrap();
    assert!(response.codes.len() <= 3);
    assert!(response.stats.pruned_groups > 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_group_count_bounded(
        codes in corpus(3),
        beam_width in 1usize..5,
        retained in 1usize..3,
    ) {
        let index = fit(&codes, 3);
        let config = DecodeConfig::new(beam_width, 3)
            .with_end_marker(END)
            .with_retained_orderings(retained);
        let oracle = UniformOracle::new(VOCAB);

        for (active, finished) in step_sizes(&index, &config, &oracle) {
            prop_assert!(active <= beam_width);
            prop_assert!(finished <= beam_width);
        }

        let response = Decoder::new(&index, &oracle, config).unwrap().decode(&()).unwrap();
        prop_assert!(response.codes.len() <= beam_width);
        let reachable: usize = response
            .codes
            .iter()
            .map(|c| index.leaves(&c.code).map_or(0, |docs| docs.len()))
            .sum();
        prop_assert!(response.results.len() <= reachable);
    }
}
