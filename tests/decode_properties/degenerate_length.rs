//! Code length 1: decoding is single-step top-k over raw log-probabilities

use crate::common::{fit, END};
use setcode::testing::ScriptedOracle;
use setcode::{DecodeConfig, Decoder, RankedDoc, TermDistribution};

#[test]
fn test_single_step_top_k_with_raw_scores() {
    let index = fit(&[vec![5], vec![7], vec![9], vec![7]], 1);
    let oracle = ScriptedOracle::new(TermDistribution::from_pairs([
        (5, -0.5),
        (7, -1.0),
        (9, -2.0),
        (11, -0.1),
        (END, -0.05),
    ]));
    let config = DecodeConfig::new(2, 1).with_end_marker(END);
    let response = Decoder::new(&index, &oracle, config).unwrap().decode(&()).unwrap();

    assert_eq!(
        response.results,
        vec![
            RankedDoc { doc_id: 0, score: -0.5 },
            RankedDoc { doc_id: 1, score: -1.0 },
            RankedDoc { doc_id: 3, score: -1.0 },
        ]
    );
    assert_eq!(response.stats.steps, 1);
    assert_eq!(response.stats.oracle_calls, 1);
    assert_eq!(response.stats.merged_orderings, 0);
}

#[test]
fn test_single_step_respects_beam_width() {
    let index = fit(&[vec![2], vec![3], vec![4], vec![5]], 1);
    let oracle = ScriptedOracle::new(TermDistribution::from_pairs([
        (2, -3.0),
        (3, -1.0),
        (4, -2.0),
        (5, -4.0),
    ]));
    for beam_width in 1..=4 {
        let config = DecodeConfig::new(beam_width, 1).with_end_marker(END);
        let response = Decoder::new(&index, &oracle, config).unwrap().decode(&()).unwrap();
        let expected: Vec<u32> = vec![1, 2, 0, 3].into_iter().take(beam_width).collect();
        assert_eq!(response.doc_ids(), expected);
    }
}
