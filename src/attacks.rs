//! Attacks on XOR ciphers built from guess sets.
//!
//! Each column of a repeating-key ciphertext is a single-byte XOR, so the
//! full attack guesses the key length, breaks every column on its own and
//! joins the per-column guesses into whole keys.

use crate::blocks::{nblocks, transpose, uniform_length};
use crate::bytestring::ByteString;
use crate::error::{CrackError, Result};
use crate::fuzzy::{CutOff, FuzzySet};
use crate::join::{join, ByteStringConcat, Product};
use crate::scoring::{
    check_key_length, english_score, key_length_by_hamming_distance, key_length_by_ic,
    key_length_by_kasiski, KasiskiGaps, KASISKI_MIN_NGRAM,
};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// Largest key length `KeySpace::Length` will enumerate
const MAX_ENUMERATED_KEY_LEN: usize = 3;

/// Keys to try in a brute force
#[derive(Debug, Clone)]
pub enum KeySpace {
    /// Every key of exactly this many bytes
    Length(usize),
    /// An explicit list of keys, all equally likely
    Keys(Vec<ByteString>),
    /// Keys with a prior likelihood that weights their score
    Weighted(FuzzySet<ByteString>),
}

/// Decrypt `ciphertext` with every key of `key_space` and score the
/// plaintext with `score`
///
/// Each key scores `score(plaintext) * prior`; keys below `min_score`
/// are left out.
pub fn brute_force<F>(
    ciphertext: &ByteString,
    score: F,
    key_space: KeySpace,
    min_score: f64,
) -> Result<FuzzySet<ByteString>>
where
    F: Fn(&ByteString) -> f64,
{
    let mut guess = FuzzySet::with_min_membership(min_score)?;
    let mut try_key = |key: ByteString, prior: f64| -> Result<()> {
        let plaintext = ciphertext.xor_stream(&key.inf()?);
        let s = score(&plaintext) * prior;
        guess.insert(key, s)
    };

    match key_space {
        KeySpace::Length(n) => {
            if n == 0 || n > MAX_ENUMERATED_KEY_LEN {
                return Err(CrackError::InvalidArgument(format!(
                    "brute force enumerates keys of 1 to {} bytes, got {}",
                    MAX_ENUMERATED_KEY_LEN, n
                )));
            }
            for k in 0..(1u32 << (8 * n)) {
                let bytes = k.to_be_bytes();
                try_key(ByteString::from(&bytes[4 - n..]), 1.0)?;
            }
        }
        KeySpace::Keys(keys) => {
            for key in keys {
                try_key(key, 1.0)?;
            }
        }
        KeySpace::Weighted(prior) => {
            for (key, p) in prior.iter() {
                try_key(key.clone(), p)?;
            }
        }
    }
    Ok(guess)
}

/// Propose keys by matching the most common n-grams of the ciphertext
/// against the most common n-grams of the plaintext language
///
/// A key `c ^ p` scores the likelihood of the plain n-gram `p`. The
/// n-gram length is the length of the plain n-grams, which must agree.
pub fn freq_attack(
    ciphertext: &ByteString,
    most_common_plain: &FuzzySet<ByteString>,
    cipher_ngram_top: usize,
) -> Result<FuzzySet<ByteString>> {
    let lengths: BTreeSet<usize> = most_common_plain.values().map(ByteString::len).collect();
    let n = match (lengths.len(), lengths.iter().next()) {
        (1, Some(&n)) if n > 0 => n,
        (0, _) => {
            return Err(CrackError::EmptyInput(
                "no plaintext n-grams to match".into(),
            ))
        }
        _ => {
            return Err(CrackError::InvalidArgument(
                "plaintext n-grams must all have the same non-zero length".into(),
            ))
        }
    };

    let mut counts: HashMap<ByteString, usize> = HashMap::new();
    for gram in ciphertext.ngrams(n)? {
        *counts.entry(gram).or_default() += 1;
    }
    let mut ranked: Vec<(ByteString, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut keys = FuzzySet::new();
    for (cipher_gram, _) in ranked.into_iter().take(cipher_ngram_top) {
        for (plain_gram, p) in most_common_plain.iter() {
            keys.insert(cipher_gram.xor(plain_gram)?, p)?;
        }
    }
    debug!(n, proposed = keys.len(), "frequency attack");
    Ok(keys)
}

/// Scoring method for key lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyLengthMethod {
    /// Mean index of coincidence of the columns
    #[default]
    Ic,
    /// Normalized Hamming distance between consecutive blocks
    Hamming,
    /// Gaps between repeated n-grams
    Kasiski,
}

impl KeyLengthMethod {
    pub fn score(&self, ciphertext: &ByteString, length: usize) -> Result<f64> {
        match self {
            Self::Ic => key_length_by_ic(ciphertext, length),
            Self::Hamming => key_length_by_hamming_distance(ciphertext, length),
            Self::Kasiski => key_length_by_kasiski(ciphertext, length),
        }
    }

    /// Score every length in `lengths`, see [`guess_key_length`]
    pub fn guess<I>(&self, ciphertext: &ByteString, lengths: I, min_score: f64) -> Result<FuzzySet<usize>>
    where
        I: IntoIterator<Item = usize>,
    {
        match self {
            Self::Kasiski => {
                let gaps = KasiskiGaps::new(ciphertext, KASISKI_MIN_NGRAM)?;
                guess_key_length(
                    ciphertext,
                    lengths,
                    |ct, l| {
                        check_key_length(ct, l)?;
                        Ok(gaps.score(l))
                    },
                    min_score,
                )
            }
            _ => guess_key_length(ciphertext, lengths, |ct, l| self.score(ct, l), min_score),
        }
    }

    /// Whether multiples of the key length score as well as the key
    /// length itself
    pub fn favors_multiples(&self) -> bool {
        match self {
            Self::Ic | Self::Hamming => true,
            Self::Kasiski => false,
        }
    }
}

impl std::str::FromStr for KeyLengthMethod {
    type Err = CrackError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ic" | "coincidence" => Ok(Self::Ic),
            "hamming" | "hd" => Ok(Self::Hamming),
            "kasiski" => Ok(Self::Kasiski),
            _ => Err(CrackError::InvalidArgument(format!(
                "key length method: {}",
                s
            ))),
        }
    }
}

/// Score every candidate key length
///
/// Lengths the ciphertext is too short to judge are skipped.
pub fn guess_key_length<I, F>(
    ciphertext: &ByteString,
    lengths: I,
    score: F,
    min_score: f64,
) -> Result<FuzzySet<usize>>
where
    I: IntoIterator<Item = usize>,
    F: Fn(&ByteString, usize) -> Result<f64>,
{
    let mut guess = FuzzySet::with_min_membership(min_score)?;
    for length in lengths {
        match score(ciphertext, length) {
            Ok(s) => guess.insert(length, s)?,
            Err(e) => warn!(length, "skipping key length: {}", e),
        }
    }
    Ok(guess)
}

/// Options for [`break_repeating_xor`]
#[derive(Debug, Clone)]
pub struct BreakOptions {
    pub max_key_len: usize,
    pub method: KeyLengthMethod,
    /// Best-scoring key lengths to attack, each reduced to its shortest
    /// period
    pub lengths: usize,
    /// Best bytes kept per column before joining
    pub column_candidates: usize,
    /// Keys kept in the final guess
    pub keys: usize,
}

impl Default for BreakOptions {
    fn default() -> Self {
        Self {
            max_key_len: 40,
            method: KeyLengthMethod::Ic,
            lengths: 3,
            column_candidates: 3,
            keys: 5,
        }
    }
}

/// Outcome of a repeating-key XOR attack
#[derive(Debug, Clone, Serialize)]
pub struct XorBreak {
    pub key_lengths: FuzzySet<usize>,
    pub keys: FuzzySet<ByteString>,
}

impl XorBreak {
    pub fn best_key(&self) -> Result<&ByteString> {
        self.keys.most_likely()
    }

    pub fn plaintext(&self, ciphertext: &ByteString) -> Result<ByteString> {
        decrypt(ciphertext, self.best_key()?)
    }
}

/// Undo a repeating-key XOR
pub fn decrypt(ciphertext: &ByteString, key: &ByteString) -> Result<ByteString> {
    Ok(ciphertext.xor_stream(&key.inf()?))
}

fn divisors(n: usize) -> impl Iterator<Item = usize> {
    (1..=n).filter(move |d| n % d == 0)
}

/// Share of its own score a divisor needs to stand in for a length
const PERIOD_SCORE_RATIO: f64 = 0.7;

/// Multiples of the key length score as well as the key length itself
/// and give fewer bytes per column, so a length is replaced by its
/// smallest divisor that scores nearly as well. Scores are first
/// rescaled to [0, 1] across all the scored lengths.
fn shortest_period(length: usize, scores: &FuzzySet<usize>) -> usize {
    let (lo, hi) = scores
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, s)| {
            (lo.min(s), hi.max(s))
        });
    if hi <= lo {
        return length;
    }
    let rescaled = |l: usize| {
        if scores.contains(&l) {
            (scores.score(&l) - lo) / (hi - lo)
        } else {
            0.0
        }
    };
    let target = PERIOD_SCORE_RATIO * rescaled(length);
    divisors(length)
        .find(|&d| rescaled(d) >= target)
        .unwrap_or(length)
}

/// Guess the key of a repeating-key XOR over English text
///
/// Keys are ranked by how English the full decryption looks; keys that
/// decrypt to the same text (a key and its repetitions) tie and the
/// shortest wins.
pub fn break_repeating_xor(ciphertext: &ByteString, options: &BreakOptions) -> Result<XorBreak> {
    if ciphertext.is_empty() {
        return Err(CrackError::EmptyInput("ciphertext is empty".into()));
    }
    if options.lengths == 0 || options.column_candidates == 0 || options.keys == 0 {
        return Err(CrackError::InvalidArgument(
            "lengths, column candidates and keys must be greater than zero".into(),
        ));
    }

    // four blocks at least so the column statistics mean something
    let max_len = options.max_key_len.min(ciphertext.len() / 4).max(1);
    let method = options.method;
    let key_lengths = method.guess(ciphertext, 1..=max_len, 0.0)?;
    if key_lengths.is_empty() {
        return Err(CrackError::EmptyGuess);
    }

    let candidates: BTreeSet<usize> = key_lengths
        .most_likely_n(options.lengths)
        .into_iter()
        .map(|&l| {
            if method.favors_multiples() {
                shortest_period(l, &key_lengths)
            } else {
                l
            }
        })
        .collect();
    info!(
        ?candidates,
        method = ?options.method,
        "attacking key lengths"
    );

    let mut keys = FuzzySet::new();
    for &length in &candidates {
        match keys_for_length(ciphertext, length, options) {
            Ok(found) => {
                for (key, _) in found.iter() {
                    let plaintext = decrypt(ciphertext, key)?;
                    keys.insert(key.clone(), english_score(&plaintext))?;
                }
            }
            Err(e) => warn!(length, "skipping key length: {}", e),
        }
    }
    keys.cut_off(CutOff::Top(options.keys));
    if let Ok(best) = keys.most_likely() {
        info!(key = %best, score = keys.score(best), "best key");
    }

    Ok(XorBreak { key_lengths, keys })
}

fn keys_for_length(
    ciphertext: &ByteString,
    length: usize,
    options: &BreakOptions,
) -> Result<FuzzySet<ByteString>> {
    let blocks = uniform_length(&nblocks(ciphertext, length)?, length);
    let columns = transpose(&blocks, false)?;
    if columns.is_empty() {
        return Err(CrackError::EmptyInput(format!(
            "no complete block of {} bytes",
            length
        )));
    }

    let mut guesses = Vec::with_capacity(columns.len());
    for (position, column) in columns.iter().enumerate() {
        let mut guess = brute_force(column, english_score, KeySpace::Length(1), 0.0)?;
        guess.cut_off(CutOff::Top(options.column_candidates));
        debug!(length, position, guess = %guess, "column guess");
        guesses.push(guess);
    }
    join(
        &guesses,
        CutOff::Top(options.keys),
        &ByteStringConcat,
        &Product,
    )
}
