//! A saved and reloaded index answers every query like the original

use crate::common::{corpus, fit, END, VOCAB};
use proptest::prelude::*;
use setcode::testing::UniformOracle;
use setcode::{CanonicalCode, DecodeConfig, Decoder, Error, IndexConfig, TermSetIndex};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_reloaded_index_is_identical(codes in corpus(4)) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.tsix");
        let index = fit(&codes, 4);
        index.save(&path).unwrap();
        let loaded = TermSetIndex::load(&path, index.config()).unwrap();

        prop_assert_eq!(loaded.stats(), index.stats());
        for code in &codes {
            let canonical = CanonicalCode::from_terms(code.iter().copied());
            for cut in 0..=canonical.len() {
                let prefix = &canonical[..cut];
                prop_assert_eq!(loaded.children(prefix), index.children(prefix));
                prop_assert_eq!(loaded.leaves(prefix), index.leaves(prefix));
            }
        }

        let oracle = UniformOracle::new(VOCAB);
        let config = DecodeConfig::new(3, 4).with_end_marker(END);
        let before = Decoder::new(&index, &oracle, config.clone()).unwrap().decode(&()).unwrap();
        let after = Decoder::new(&loaded, &oracle, config).unwrap().decode(&()).unwrap();
        prop_assert_eq!(before.results, after.results);
        prop_assert_eq!(before.codes, after.codes);
    }
}

#[test]
fn test_load_rejects_other_vocabulary_and_length() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.tsix");
    fit(&[vec![2, 3], vec![4]], 2).save(&path).unwrap();

    let err = TermSetIndex::load(&path, &IndexConfig::new(65, 2)).unwrap_err();
    assert!(matches!(err, Error::IndexVersionMismatch { field: "vocab_size", .. }));

    let err = TermSetIndex::load(&path, &IndexConfig::new(64, 3)).unwrap_err();
    assert!(matches!(err, Error::IndexVersionMismatch { field: "code_length", .. }));

    assert!(TermSetIndex::load(&path, &IndexConfig::new(64, 2)).is_ok());
}

#[test]
fn test_load_rejects_corrupted_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.tsix");
    fit(&[vec![2, 3], vec![4]], 2).save(&path).unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x5A;
    std::fs::write(&path, bytes).unwrap();

    let err = TermSetIndex::load(&path, &IndexConfig::new(64, 2)).unwrap_err();
    assert!(matches!(err, Error::IndexCorrupt(_)));
}
