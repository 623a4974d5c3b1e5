//! Documents sharing a term multiset share a leaf and tie in the ranking

use crate::common::init_tracing;
use setcode::testing::PreferenceOracle;
use setcode::{DecodeConfig, Decoder, IndexConfig, TermSetIndex};

const END: u32 = 0;

fn index() -> TermSetIndex {
    TermSetIndex::fit(
        IndexConfig::new(16, 3),
        &[vec![1, 2, 3], vec![2, 3, 1], vec![4, 5, 6]],
    )
    .unwrap()
}

#[test]
fn test_leaves_keep_both_documents_in_corpus_order() {
    let index = index();
    assert_eq!(index.leaves(&[1, 2, 3]), Some(&[0, 1][..]));
    assert_eq!(index.leaves(&[3, 1, 2]), Some(&[0, 1][..]));
    assert_eq!(index.stats().collisions, 1);
}

#[test]
fn test_colliding_documents_rank_with_identical_score() {
    init_tracing();
    let index = index();
    let oracle = PreferenceOracle::new(END);
    let config = DecodeConfig::new(4, 3).with_end_marker(END);
    let decoder = Decoder::new(&index, &oracle, config).unwrap();

    let query = vec![(1, 3.0), (2, 3.0), (3, 3.0), (5, 0.5)];
    let response = decoder.decode(&query).unwrap();

    assert_eq!(&response.doc_ids()[..2], &[0, 1]);
    assert_eq!(response.results[0].score, response.results[1].score);
    assert!(response.codes.iter().any(|c| c.code.as_slice() == [1, 2, 3]));
}

#[test]
fn test_collision_may_exceed_beam_width() {
    let index = index();
    let oracle = PreferenceOracle::new(END);
    let config = DecodeConfig::new(1, 3).with_end_marker(END);
    let decoder = Decoder::new(&index, &oracle, config).unwrap();

    let response = decoder.decode(&vec![(1, 3.0), (2, 3.0), (3, 3.0)]).unwrap();
    assert_eq!(response.codes.len(), 1);
    assert_eq!(response.doc_ids(), vec![0, 1]);
}
