//! Only corpus codes can be decoded, whatever the oracle prefers

use crate::common::{corpus, fit, END, VOCAB};
use proptest::prelude::*;
use setcode::testing::{ScriptedOracle, UniformOracle};
use setcode::{CanonicalCode, DecodeConfig, Decoder, Error, TermDistribution, TermId};

#[test]
fn test_children_non_empty_until_leaf() {
    let codes = vec![vec![3, 9, 4], vec![3, 4], vec![8]];
    let index = fit(&codes, 3);
    for code in &codes {
        let canonical = CanonicalCode::from_terms(code.iter().copied());
        for cut in 0..canonical.len() {
            let children = index.children(&canonical[..cut]);
            assert!(children.contains(&canonical[cut]));
        }
        assert!(index.leaves(&canonical).is_some());
    }
}

#[test]
fn test_unextendable_term_never_emitted() {
    let index = fit(&[vec![2, 3], vec![4, 5]], 2);
    // Most of the mass on 7, which no code contains
    let oracle = ScriptedOracle::new(TermDistribution::from_pairs([
        (7, -0.01),
        (2, -6.0),
        (3, -6.5),
        (5, -7.0),
    ]));
    let config = DecodeConfig::new(4, 2).with_end_marker(END);
    let response = Decoder::new(&index, &oracle, config).unwrap().decode(&()).unwrap();

    assert_eq!(response.doc_ids(), vec![0]);
    for code in &response.codes {
        assert!(!code.code.contains(&7));
    }
}

#[test]
fn test_oracle_without_legal_terms_fails_cleanly() {
    let index = fit(&[vec![2, 3]], 2);
    let oracle = ScriptedOracle::new(TermDistribution::from_pairs([(7, -0.01), (END, -0.5)]));
    let config = DecodeConfig::new(4, 2).with_end_marker(END);
    let err = Decoder::new(&index, &oracle, config).unwrap().decode(&()).unwrap_err();
    assert!(matches!(err, Error::NoLegalPath { steps: 1 }));
}

#[test]
fn test_cross_code_mix_is_illegal() {
    // {2,5} is a prefix of neither code even though each term is used
    let index = fit(&[vec![2, 3], vec![4, 5]], 2);
    let oracle = ScriptedOracle::new(TermDistribution::new())
        .with_step(&[], &[(2, -0.1), (4, -3.0)])
        .with_step(&[2], &[(5, -0.01), (3, -4.0)])
        .with_step(&[4], &[(5, -0.2)]);
    let config = DecodeConfig::new(4, 2).with_end_marker(END);
    let response = Decoder::new(&index, &oracle, config).unwrap().decode(&()).unwrap();
    assert_eq!(response.doc_ids(), vec![1, 0]);
    assert!((response.score_of(0).unwrap() - (-4.1)).abs() < 1e-6);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_decoded_codes_exist_in_corpus(codes in corpus(3), beam_width in 1usize..6) {
        let index = fit(&codes, 3);
        let oracle = UniformOracle::new(VOCAB);
        let config = DecodeConfig::new(beam_width, 3).with_end_marker(END);
        let response = Decoder::new(&index, &oracle, config).unwrap().decode(&()).unwrap();

        prop_assert!(!response.results.is_empty());
        for scored in &response.codes {
            let canonical: Vec<TermId> = scored.code.to_vec();
            let in_corpus = codes.iter().any(|c| {
                let mut sorted = c.clone();
                sorted.sort_unstable();
                sorted == canonical
            });
            prop_assert!(in_corpus);
        }
        for hit in &response.results {
            prop_assert!((hit.doc_id as usize) < codes.len());
        }
    }
}
