use proptest::prelude::*;
use xorbreak::blocks::{join_bytestrings, nblocks, transpose, uniform_length};
use xorbreak::join::{cardinality, join, ByteConcat, ByteStringConcat, Minimum, Product};
use xorbreak::{ByteString, CutOff, FuzzySet};

fn byte_guess() -> impl Strategy<Value = FuzzySet<u8>> {
    prop::collection::btree_map(any::<u8>(), 0.0f64..=1.0, 1..4)
        .prop_map(|m| FuzzySet::from_pairs(m).unwrap())
}

/// Short words over a two-letter alphabet, so that different combinations
/// often concatenate to the same value
fn word_guess() -> impl Strategy<Value = FuzzySet<ByteString>> {
    let quarter = (0u8..=4).prop_map(|n| n as f64 / 4.0);
    prop::collection::btree_map("[ab]{1,3}", quarter, 1..4).prop_map(|m| {
        FuzzySet::from_pairs(m.into_iter().map(|(w, s)| (ByteString::from(w.as_str()), s))).unwrap()
    })
}

/// Every combination with its product score, ranked
fn brute_force_join(sets: &[FuzzySet<u8>]) -> Vec<(ByteString, f64)> {
    let mut all: Vec<(Vec<u8>, f64)> = vec![(Vec::new(), 1.0)];
    for set in sets {
        let mut next = Vec::new();
        for (prefix, score) in &all {
            for (byte, s) in set.iter() {
                let mut value = prefix.clone();
                value.push(*byte);
                next.push((value, score * s));
            }
        }
        all = next;
    }
    let mut ranked: Vec<(ByteString, f64)> = all
        .into_iter()
        .map(|(v, s)| (ByteString::new(v), s))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

proptest! {
    #[test]
    fn xor_is_self_inverse(
        (a, b) in (1usize..64).prop_flat_map(|n| (
            prop::collection::vec(any::<u8>(), n),
            prop::collection::vec(any::<u8>(), n),
        ))
    ) {
        let a = ByteString::new(a);
        let b = ByteString::new(b);
        prop_assert_eq!(a.xor(&b).unwrap().xor(&b).unwrap(), a);
    }

    #[test]
    fn repeating_key_xor_is_self_inverse(
        data in prop::collection::vec(any::<u8>(), 0..200),
        key in prop::collection::vec(any::<u8>(), 1..16),
    ) {
        let data = ByteString::new(data);
        let key = ByteString::new(key).inf().unwrap();
        prop_assert_eq!(data.xor_stream(&key).xor_stream(&key), data);
    }

    #[test]
    fn nblocks_partitions_the_input(
        data in prop::collection::vec(any::<u8>(), 0..200),
        n in 1usize..20,
    ) {
        let s = ByteString::new(data);
        let blocks = nblocks(&s, n).unwrap();
        prop_assert_eq!(join_bytestrings(&blocks), s.clone());
        prop_assert!(blocks.iter().rev().skip(1).all(|b| b.len() == n));
        prop_assert_eq!(blocks.len(), (s.len() + n - 1) / n);
    }

    #[test]
    fn transpose_twice_is_identity(
        data in prop::collection::vec(any::<u8>(), 0..200),
        n in 1usize..20,
    ) {
        let s = ByteString::new(data);
        let blocks = uniform_length(&nblocks(&s, n).unwrap(), n);
        let columns = transpose(&blocks, false).unwrap();
        if blocks.is_empty() {
            prop_assert!(columns.is_empty());
        } else {
            prop_assert_eq!(transpose(&columns, false).unwrap(), blocks);
        }
    }

    #[test]
    fn unpruned_join_size_is_the_cardinality(sets in prop::collection::vec(byte_guess(), 1..5)) {
        let joined = join(&sets, CutOff::All, &ByteConcat, &Product).unwrap();
        prop_assert_eq!(Some(joined.len() as u128), cardinality(&sets));
    }

    #[test]
    fn top_k_join_matches_brute_force(
        sets in prop::collection::vec(byte_guess(), 1..5),
        k in 1usize..10,
    ) {
        let joined = join(&sets, CutOff::Top(k), &ByteConcat, &Product).unwrap();
        let expected: Vec<(ByteString, f64)> = brute_force_join(&sets).into_iter().take(k).collect();
        let got: Vec<(ByteString, f64)> = joined.iter().map(|(v, s)| (v.clone(), s)).collect();
        prop_assert_eq!(got.len(), expected.len());
        for ((gv, gs), (ev, es)) in got.iter().zip(expected.iter()) {
            prop_assert_eq!(gv, ev);
            prop_assert!((gs - es).abs() < 1e-12);
        }
    }

    #[test]
    fn threshold_join_matches_brute_force(
        sets in prop::collection::vec(byte_guess(), 1..5),
        threshold in 0.0f64..=1.0,
    ) {
        let joined = join(&sets, CutOff::Threshold(threshold), &ByteConcat, &Product).unwrap();
        let expected: Vec<ByteString> = brute_force_join(&sets)
            .into_iter()
            .filter(|(_, s)| *s >= threshold)
            .map(|(v, _)| v)
            .collect();
        let got: Vec<ByteString> = joined.iter().map(|(v, _)| v.clone()).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn variable_width_joins_match_the_full_join(
        sets in prop::collection::vec(word_guess(), 1..4),
        k in 1usize..8,
        threshold in 0.0f64..=1.0,
    ) {
        let full = join(&sets, CutOff::All, &ByteStringConcat, &Product).unwrap();

        let mut expected = full.clone();
        expected.cut_off(CutOff::Top(k));
        let top = join(&sets, CutOff::Top(k), &ByteStringConcat, &Product).unwrap();
        prop_assert_eq!(top.sorted(), expected.sorted());

        let mut expected = full.clone();
        expected.cut_off(CutOff::Threshold(threshold));
        let above = join(&sets, CutOff::Threshold(threshold), &ByteStringConcat, &Product).unwrap();
        prop_assert_eq!(above.sorted(), expected.sorted());

        let mut expected = join(&sets, CutOff::All, &ByteStringConcat, &Minimum).unwrap();
        expected.cut_off(CutOff::Top(k));
        let weakest = join(&sets, CutOff::Top(k), &ByteStringConcat, &Minimum).unwrap();
        prop_assert_eq!(weakest.sorted(), expected.sorted());
    }

    #[test]
    fn base_encodings_decode_back(data in prop::collection::vec(any::<u8>(), 0..100)) {
        use xorbreak::conv::Base;
        let s = ByteString::new(data);
        for base in [Base::Base16, Base::Base32, Base::Base64] {
            prop_assert_eq!(ByteString::decode(&s.encode(base), base).unwrap(), s.clone());
        }
    }
}
