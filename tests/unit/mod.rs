use xorbreak::conv::{as_bytes, Base, ByteSource, TextEncoding};
use xorbreak::join::{cardinality, join, join_bytes, Minimum, SeparatedConcat};
use xorbreak::{ByteString, CrackError, CutOff, FuzzySet};

#[test]
fn bytestring_slicing_follows_python_rules() {
    let s = ByteString::from("ABCDEFGH");
    assert_eq!(s.get(-1).unwrap(), b'H');
    assert!(matches!(
        s.get(8),
        Err(CrackError::IndexOutOfRange { index: 8, len: 8 })
    ));
    assert_eq!(s.slice(2..5).unwrap(), ByteString::from("CDE"));
    assert_eq!(
        s.slice_stepped(None, None, -1).unwrap(),
        ByteString::from("HGFEDCBA")
    );
    assert_eq!(
        s.slice_stepped(Some(1), None, 3).unwrap(),
        ByteString::from("BEH")
    );
    assert!(s.slice_stepped(None, None, 0).is_err());
}

#[test]
fn xor_requires_equal_lengths() {
    let a = ByteString::from("abc");
    let b = ByteString::from("ab");
    assert!(matches!(
        a.xor(&b),
        Err(CrackError::LengthMismatch { left: 3, right: 2 })
    ));
    assert_eq!(
        ByteString::from([1u8, 2, 3])
            .xor_stream(&ByteString::from([0xffu8]).inf().unwrap()),
        ByteString::from([0xfeu8, 0xfd, 0xfc])
    );
}

#[test]
fn byte_sources_build_the_same_bytes() {
    let expected = ByteString::from("Hi");
    let sources = vec![
        ByteSource::Raw(b"Hi".to_vec()),
        ByteSource::Text {
            text: "Hi".into(),
            encoding: TextEncoding::Ascii,
        },
        ByteSource::Integers(vec![72, 105]),
        ByteSource::Encoded {
            text: "SGk=".into(),
            base: Base::Base64,
        },
        ByteSource::Encoded {
            text: "4869".into(),
            base: Base::Base16,
        },
    ];
    for source in sources {
        assert_eq!(as_bytes(source).unwrap(), expected);
    }
}

#[test]
fn fuzzy_set_operations() {
    let a = FuzzySet::from_pairs([('x', 0.2), ('y', 0.9)]).unwrap();
    let b = FuzzySet::from_pairs([('y', 0.4), ('z', 0.5)]).unwrap();

    let union = a.union(&b);
    assert_eq!(union.len(), 3);
    assert_eq!(union.score(&'y'), 0.9);

    let inter = a.intersection(&b);
    assert_eq!(inter.len(), 1);
    assert_eq!(inter.score(&'y'), 0.4);
    assert!(inter.is_subset(&a));

    let mut top = union.clone();
    top.cut_off(CutOff::Top(2));
    assert_eq!(top.most_likely_n(2), vec![&'y', &'z']);
}

#[test]
fn joining_two_guesses_into_words() {
    let first = FuzzySet::from_pairs([(b'A', 0.8), (b'B', 0.3)]).unwrap();
    let second = FuzzySet::from_pairs([(b' ', 0.9), (b'x', 0.2)]).unwrap();
    let sets = vec![first, second];

    assert_eq!(cardinality(&sets), Some(4));
    let joined = join_bytes(&sets, CutOff::All).unwrap();
    assert_eq!(joined.len(), 4);
    assert_eq!(joined.most_likely().unwrap(), &ByteString::from("A "));
    assert!((joined.score(&ByteString::from("A ")) - 0.72).abs() < 1e-12);

    let best = join_bytes(&sets, CutOff::Top(1)).unwrap();
    assert_eq!(best.len(), 1);
}

#[test]
fn joining_words_with_a_separator_by_minimum() {
    let words = |pairs: &[(&str, f64)]| {
        FuzzySet::from_pairs(pairs.iter().map(|(w, s)| (ByteString::from(*w), *s))).unwrap()
    };
    let sets = vec![
        words(&[("attack", 0.9), ("attach", 0.4)]),
        words(&[("at", 0.8), ("as", 0.3)]),
        words(&[("dawn", 0.7), ("down", 0.6)]),
    ];
    let joined = join(&sets, CutOff::Threshold(0.6), &SeparatedConcat::new(" "), &Minimum).unwrap();
    assert_eq!(
        joined.most_likely().unwrap(),
        &ByteString::from("attack at dawn")
    );
    assert!(joined.iter().all(|(_, s)| s >= 0.6));
    assert_eq!(joined.len(), 2);
}

#[test]
fn join_rejects_empty_positions() {
    let sets = vec![
        FuzzySet::from_pairs([(b'a', 0.5)]).unwrap(),
        FuzzySet::new(),
    ];
    assert!(matches!(
        join_bytes(&sets, CutOff::All),
        Err(CrackError::EmptyInput(_))
    ));
    assert!(matches!(
        join_bytes(&[], CutOff::All),
        Err(CrackError::EmptyInput(_))
    ));
}
