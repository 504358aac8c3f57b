use crate::blocks::{nblocks, transpose, uniform_length};
use crate::bytestring::ByteString;
use crate::error::{CrackError, Result};
use crate::fuzzy::{CutOff, FuzzySet};
use std::collections::HashMap;

/// Case-sensitive letter counts from the NYT corpus: (letter, uppercase, lowercase)
/// Jones & Mewhort, "Case-sensitive letter and bigram frequency counts
/// from large-scale English corpora"
static EN_LETTER_COUNTS: [(u8, u64, u64); 26] = [
    (b'a', 280937, 5263779),
    (b'b', 169474, 866156),
    (b'c', 229363, 1960412),
    (b'd', 129632, 2369820),
    (b'e', 138443, 7741842),
    (b'f', 100751, 1296925),
    (b'g', 93212, 1206747),
    (b'h', 123632, 2955858),
    (b'i', 223312, 4527332),
    (b'j', 78706, 65856),
    (b'k', 46580, 460788),
    (b'l', 106984, 2553152),
    (b'm', 259474, 1467376),
    (b'n', 205409, 4535545),
    (b'o', 105700, 4729266),
    (b'p', 144239, 1255579),
    (b'q', 11659, 54221),
    (b'r', 146448, 4137949),
    (b's', 304971, 4186210),
    (b't', 325462, 5507692),
    (b'u', 57488, 1613323),
    (b'v', 31053, 653370),
    (b'w', 107195, 1015656),
    (b'x', 7578, 123577),
    (b'y', 94297, 1062040),
    (b'z', 5610, 66423),
];

/// English word counts by word length, in millions (norvig.com/mayzner.html)
static EN_WORD_LENGTH_COUNTS: [(u32, f64); 23] = [
    (1, 22301.22),
    (2, 131293.85),
    (3, 152568.38),
    (4, 109988.33),
    (5, 79589.32),
    (6, 62391.21),
    (7, 59052.66),
    (8, 44207.29),
    (9, 33006.93),
    (10, 22883.84),
    (11, 13098.06),
    (12, 7124.15),
    (13, 3850.58),
    (14, 1653.08),
    (15, 565.24),
    (16, 151.22),
    (17, 72.81),
    (18, 28.62),
    (19, 8.51),
    (20, 6.35),
    (21, 0.13),
    (22, 0.81),
    (23, 0.32),
];

/// Probability of a space in English text (one per word)
pub fn space_freq() -> f64 {
    let words: f64 = EN_WORD_LENGTH_COUNTS.iter().map(|(_, c)| c).sum();
    let letters: f64 = EN_WORD_LENGTH_COUNTS
        .iter()
        .map(|(len, c)| *len as f64 * c)
        .sum();
    words / (words + letters)
}

fn letter_table(upper: bool, lower: bool) -> Vec<(u8, f64)> {
    let mut entries = Vec::with_capacity(52);
    for &(letter, ucount, lcount) in EN_LETTER_COUNTS.iter() {
        if upper {
            entries.push((letter.to_ascii_uppercase(), ucount as f64));
        }
        if lower {
            entries.push((letter, lcount as f64));
        }
    }
    let total: f64 = entries.iter().map(|(_, c)| c).sum();
    entries.into_iter().map(|(b, c)| (b, c / total)).collect()
}

fn table_to_set(table: Vec<(u8, f64)>) -> FuzzySet<u8> {
    let mut set = FuzzySet::new();
    for (byte, p) in table {
        // probabilities of a normalized table are always in [0, 1]
        set.insert_raw(byte, p);
    }
    set
}

/// Frequency of uppercase letters among uppercase letters
pub fn en_upper_letter_freq() -> FuzzySet<u8> {
    table_to_set(letter_table(true, false))
}

/// Frequency of lowercase letters among lowercase letters
pub fn en_lower_letter_freq() -> FuzzySet<u8> {
    table_to_set(letter_table(false, true))
}

/// Frequency of each letter, both cases, among all letters
pub fn en_letter_freq() -> FuzzySet<u8> {
    table_to_set(letter_table(true, true))
}

/// The `n` most frequent lowercase letters, plus the space if asked
pub fn etaoin_shrdlu(include_space: bool, n: usize) -> FuzzySet<u8> {
    let mut set = en_lower_letter_freq();
    let mut keep = n;
    if include_space {
        let space = space_freq();
        set = table_to_set(
            set.iter()
                .map(|(b, p)| (*b, p * (1.0 - space)))
                .chain(std::iter::once((b' ', space)))
                .collect(),
        );
        keep += 1;
    }
    set.cut_off(CutOff::Top(keep));
    set
}

/// 1 if every byte is printable ASCII (or common whitespace), else 0
pub fn all_ascii_printable(m: &ByteString) -> f64 {
    let printable = m
        .iter()
        .all(|&b| (32..=126).contains(&b) || (9..=13).contains(&b));
    if printable {
        1.0
    } else {
        0.0
    }
}

/// 1 if every byte belongs to `alphabet`, else 0
pub fn all_in_alphabet(m: &ByteString, alphabet: &[u8]) -> f64 {
    let mut allowed = [false; 256];
    for &b in alphabet {
        allowed[b as usize] = true;
    }
    if m.iter().all(|&b| allowed[b as usize]) {
        1.0
    } else {
        0.0
    }
}

/// Weight of a byte in English text, in [0, space_freq]
fn english_weight(byte: u8, lower: &[f64; 256], space: f64) -> f64 {
    match byte {
        b' ' => space,
        b'a'..=b'z' => lower[byte as usize],
        b'A'..=b'Z' => lower[byte.to_ascii_lowercase() as usize] * 0.5,
        b'\n' | b'\r' | b'\t' => space * 0.1,
        0x21..=0x7e => 0.002,
        _ => 0.0,
    }
}

/// How English-like a byte string looks, in [0, 1]
///
/// Mean per-byte English weight relative to the space, the most common
/// symbol. English prose scores around 0.35, random bytes well below 0.05.
pub fn english_score(m: &ByteString) -> f64 {
    if m.is_empty() {
        return 0.0;
    }
    let space = space_freq();
    let mut lower = [0.0f64; 256];
    for (byte, p) in letter_table(false, true) {
        lower[byte as usize] = p * (1.0 - space);
    }
    let total: f64 = m.iter().map(|&b| english_weight(b, &lower, space)).sum();
    (total / (m.len() as f64 * space)).min(1.0)
}

/// Pairs of equal symbols between two sequences under every alignment,
/// or within one sequence (each symbol against every other) when `other`
/// is `None`
pub fn count_coincidences(data: &ByteString, other: Option<&ByteString>) -> u64 {
    let f1 = data.freq();
    match other {
        None => f1
            .iter()
            .map(|&c| c as u64 * (c as u64).saturating_sub(1))
            .sum(),
        Some(other) => {
            let f2 = other.freq();
            f1.iter()
                .zip(f2.iter())
                .map(|(&a, &b)| a as u64 * b as u64)
                .sum()
        }
    }
}

/// Probability that two bytes picked at random are equal
pub fn index_of_coincidence(data: &ByteString) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let numerator = count_coincidences(data, None);
    let denominator = (data.len() * (data.len() - 1)) as f64;
    numerator as f64 / denominator
}

pub(crate) fn check_key_length(ciphertext: &ByteString, length: usize) -> Result<()> {
    if length == 0 {
        return Err(CrackError::InvalidArgument(
            "key length must be greater than zero".into(),
        ));
    }
    if ciphertext.len() < length * 2 {
        return Err(CrackError::InvalidArgument(format!(
            "The ciphertext is too short to see if a key of {} bytes could be possible",
            length
        )));
    }
    Ok(())
}

fn columns_for(ciphertext: &ByteString, length: usize) -> Result<Vec<ByteString>> {
    check_key_length(ciphertext, length)?;
    let blocks = uniform_length(&nblocks(ciphertext, length)?, length);
    transpose(&blocks, false)
}

/// Score a key length by the mean index of coincidence of the columns
/// the key would produce
pub fn key_length_by_ic(ciphertext: &ByteString, length: usize) -> Result<f64> {
    let columns = columns_for(ciphertext, length)?;
    let total: f64 = columns.iter().map(index_of_coincidence).sum();
    Ok(total / columns.len() as f64)
}

/// Score a key length by the Hamming distance between consecutive blocks
///
/// Bytes encrypted with the same key byte differ as much as the
/// plaintexts do, so the right length gives the smallest normalized
/// distance. The score is one minus the mean normalized distance.
pub fn key_length_by_hamming_distance(ciphertext: &ByteString, length: usize) -> Result<f64> {
    check_key_length(ciphertext, length)?;
    let blocks = uniform_length(&nblocks(ciphertext, length)?, length);
    let mut total = 0.0;
    let mut pairs = 0usize;
    for pair in blocks.windows(2) {
        total += pair[0].hamming_distance(&pair[1])? as f64 / (length * 8) as f64;
        pairs += 1;
    }
    Ok(1.0 - total / pairs as f64)
}

/// Longest repeated n-gram a Kasiski examination follows
const MAX_KASISKI_NGRAM: usize = 32;

/// Shortest repeated n-gram counted as evidence
pub const KASISKI_MIN_NGRAM: usize = 3;

/// Gaps between repeated n-grams, the evidence of a Kasiski examination
///
/// A plaintext fragment that repeats at a distance multiple of the key
/// length encrypts to the same ciphertext fragment, so the gaps between
/// repeated ciphertext n-grams cluster on multiples of the key length.
#[derive(Debug, Clone, Default)]
pub struct KasiskiGaps {
    histograms: Vec<HashMap<usize, usize>>,
}

impl KasiskiGaps {
    /// Count the gaps between consecutive occurrences of every repeated
    /// n-gram, one histogram per n-gram length from `start` bytes up
    pub fn new(data: &ByteString, start: usize) -> Result<Self> {
        if start == 0 {
            return Err(CrackError::InvalidArgument(
                "n-gram length must be greater than zero".into(),
            ));
        }
        let bytes = data.as_bytes();
        let mut histograms = Vec::new();
        let mut n = start;
        let mut positions: Vec<usize> = (0..bytes.len().saturating_sub(n - 1)).collect();
        while !positions.is_empty() && n <= MAX_KASISKI_NGRAM {
            let mut by_ngram: HashMap<&[u8], Vec<usize>> = HashMap::new();
            for &p in &positions {
                if let Some(ngram) = bytes.get(p..p + n) {
                    by_ngram.entry(ngram).or_default().push(p);
                }
            }

            let mut gaps = HashMap::new();
            let mut repeated = Vec::new();
            for found in by_ngram.values().filter(|found| found.len() > 1) {
                for pair in found.windows(2) {
                    *gaps.entry(pair[1] - pair[0]).or_insert(0) += 1;
                }
                repeated.extend_from_slice(found);
            }
            if gaps.is_empty() {
                break;
            }
            histograms.push(gaps);

            // an (n+1)-gram can only repeat where its leading n-gram does
            repeated.sort_unstable();
            positions = repeated;
            n += 1;
        }
        Ok(Self { histograms })
    }

    /// Gap histograms, the first for n-grams of `start` bytes
    pub fn histograms(&self) -> &[HashMap<usize, usize>] {
        &self.histograms
    }

    /// Gap counts weighted by how long the repeated n-grams were
    ///
    /// The k-th histogram counts k times: a long repeat is much less
    /// likely to be chance than a short one.
    pub fn weighted(&self) -> HashMap<usize, usize> {
        let mut weighted = HashMap::new();
        for (level, histogram) in self.histograms.iter().enumerate() {
            for (&gap, &count) in histogram {
                *weighted.entry(gap).or_insert(0) += count * (level + 1);
            }
        }
        weighted
    }

    /// Share of the weighted gaps that are multiples of `length`, less
    /// the share expected by chance (`1 / length`), floored at 0
    ///
    /// Divisors of the key length see the same multiples but expect more
    /// of them by chance, so the key length outscores them.
    pub fn score(&self, length: usize) -> f64 {
        if length == 0 {
            return 0.0;
        }
        let weighted = self.weighted();
        let total: usize = weighted.values().sum();
        if total == 0 {
            return 0.0;
        }
        let aligned: usize = weighted
            .iter()
            .filter(|(gap, _)| *gap % length == 0)
            .map(|(_, w)| w)
            .sum();
        (aligned as f64 / total as f64 - 1.0 / length as f64).max(0.0)
    }
}

/// Score a key length by a Kasiski examination of the ciphertext
///
/// Rebuilds the gap table on every call; [`KasiskiGaps`] scores many
/// lengths from one table.
pub fn key_length_by_kasiski(ciphertext: &ByteString, length: usize) -> Result<f64> {
    check_key_length(ciphertext, length)?;
    Ok(KasiskiGaps::new(ciphertext, KASISKI_MIN_NGRAM)?.score(length))
}

/// p-value of a chi-square goodness of fit of the bytes of `m` against
/// the expected byte probabilities of `model`
///
/// Bytes not in the model are pooled into one extra category whose
/// expected probability is whatever the model leaves out.
pub fn fit_freq_score(m: &ByteString, model: &FuzzySet<u8>) -> f64 {
    if m.is_empty() || model.is_empty() {
        return 0.0;
    }
    let n = m.len() as f64;
    let counts = m.freq();

    let mut expected: Vec<f64> = Vec::with_capacity(model.len() + 1);
    let mut observed: Vec<f64> = Vec::with_capacity(model.len() + 1);
    let mut covered = 0usize;
    for (byte, p) in model.iter() {
        expected.push(p * n);
        observed.push(counts[*byte as usize] as f64);
        covered += counts[*byte as usize];
    }
    let min_expected = expected.iter().copied().fold(f64::INFINITY, f64::min) / 16.0;
    let rest: f64 = expected.iter().sum();
    expected.push((n - rest).max(min_expected));
    observed.push((m.len() - covered) as f64);

    let chi_square: f64 = expected
        .iter()
        .zip(observed.iter())
        .filter(|(e, _)| **e > 0.0)
        .map(|(e, o)| (o - e) * (o - e) / e)
        .sum();
    chi_square_p_value(chi_square, expected.len() - 1)
}

/// Upper tail of the chi-square distribution (Fisher's normal approximation)
pub fn chi_square_p_value(chi_square: f64, df: usize) -> f64 {
    if df == 0 {
        return 1.0;
    }
    let z = (2.0 * chi_square).sqrt() - (2.0 * df as f64 - 1.0).sqrt();
    (0.5 * (1.0 - erf(z / std::f64::consts::SQRT_2))).clamp(0.0, 1.0)
}

fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();
    sign * y
}
