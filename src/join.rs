//! Combination of per-position guess sets into one guess over the
//! concatenated answer.
//!
//! The join extends a frontier of partial combinations one position at a
//! time. For score rules that can only lower a partial score (product,
//! minimum) the cut-off is applied to the frontier after every extension.
//! A threshold drops partials whose best possible completion is already
//! below it. A top-K cut first runs a bounded search keeping the K best
//! distinct partials, takes the K-th score it reaches as a floor, and then
//! joins again with that floor as a threshold, so every value tied with
//! the K-th survives until the final cut. Both give exactly the result of
//! pruning the full cross product, whatever the width of the pieces and
//! even when different combinations concatenate to the same value.

use crate::bytestring::ByteString;
use crate::error::{CrackError, Result};
use crate::fuzzy::{rank, CutOff, FuzzySet};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use tracing::debug;

/// Builds a combined value from per-position pieces, in order
pub trait Concatenator<T> {
    type Output: Clone + Eq + Hash + Ord + fmt::Debug;

    fn start(&self, first: &T) -> Self::Output;

    fn extend(&self, prefix: &Self::Output, next: &T) -> Self::Output;
}

/// Joins single bytes into a byte string
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteConcat;

impl Concatenator<u8> for ByteConcat {
    type Output = ByteString;

    fn start(&self, first: &u8) -> ByteString {
        ByteString::from(*first)
    }

    fn extend(&self, prefix: &ByteString, next: &u8) -> ByteString {
        let mut out = Vec::with_capacity(prefix.len() + 1);
        out.extend_from_slice(prefix.as_bytes());
        out.push(*next);
        ByteString::new(out)
    }
}

/// Joins byte strings back to back
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteStringConcat;

impl Concatenator<ByteString> for ByteStringConcat {
    type Output = ByteString;

    fn start(&self, first: &ByteString) -> ByteString {
        first.clone()
    }

    fn extend(&self, prefix: &ByteString, next: &ByteString) -> ByteString {
        prefix.concat(next)
    }
}

/// Joins byte strings with a separator between pieces
#[derive(Debug, Clone, Default)]
pub struct SeparatedConcat {
    separator: ByteString,
}

impl SeparatedConcat {
    pub fn new(separator: impl Into<ByteString>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl Concatenator<ByteString> for SeparatedConcat {
    type Output = ByteString;

    fn start(&self, first: &ByteString) -> ByteString {
        first.clone()
    }

    fn extend(&self, prefix: &ByteString, next: &ByteString) -> ByteString {
        prefix.concat(&self.separator).concat(next)
    }
}

/// Folds per-position scores into a combined score
pub trait ScoreRule {
    fn combine(&self, acc: f64, next: f64) -> f64;

    /// Whether the frontier may be pruned between positions
    ///
    /// Only valid when, for scores in `[0, 1]`, `combine(a, x) <= a` and
    /// `combine` is non-decreasing in both arguments.
    fn prunes_partials(&self) -> bool {
        false
    }
}

/// Independent evidence: scores multiply
#[derive(Debug, Clone, Copy, Default)]
pub struct Product;

impl ScoreRule for Product {
    fn combine(&self, acc: f64, next: f64) -> f64 {
        acc * next
    }

    fn prunes_partials(&self) -> bool {
        true
    }
}

/// A combination is as good as its weakest piece
#[derive(Debug, Clone, Copy, Default)]
pub struct Minimum;

impl ScoreRule for Minimum {
    fn combine(&self, acc: f64, next: f64) -> f64 {
        acc.min(next)
    }

    fn prunes_partials(&self) -> bool {
        true
    }
}

impl<F> ScoreRule for F
where
    F: Fn(f64, f64) -> f64,
{
    fn combine(&self, acc: f64, next: f64) -> f64 {
        self(acc, next)
    }
}

/// Number of combinations of a join, `None` if it overflows u128
pub fn cardinality<T>(sets: &[FuzzySet<T>]) -> Option<u128>
where
    T: Clone + Eq + Hash + Ord + fmt::Debug,
{
    sets.iter()
        .try_fold(1u128, |acc, set| acc.checked_mul(set.len() as u128))
}

/// Base-2 logarithm of the number of combinations of a join
pub fn log2_cardinality<T>(sets: &[FuzzySet<T>]) -> f64
where
    T: Clone + Eq + Hash + Ord + fmt::Debug,
{
    sets.iter().map(|set| (set.len() as f64).log2()).sum()
}

/// Pruning applied to the frontier after every extension
#[derive(Debug, Clone, Copy)]
enum Prune {
    Never,
    /// Drop partials whose best completion scores below the threshold
    Below(f64),
    /// Keep the `k` best partials by score
    Top(usize),
}

/// The `k` best distinct partials seen so far
///
/// Entries are collected with their best score and compacted back to `k`
/// once the map doubles; the floor is the k-th score at the last compaction.
struct BestK<V> {
    k: usize,
    best: HashMap<V, f64>,
    floor: f64,
}

impl<V: Clone + Eq + Hash + Ord> BestK<V> {
    fn new(k: usize) -> Self {
        Self {
            k,
            best: HashMap::new(),
            floor: f64::NEG_INFINITY,
        }
    }

    fn push(&mut self, value: V, score: f64) {
        if score < self.floor {
            return;
        }
        let slot = self.best.entry(value).or_insert(score);
        if score > *slot {
            *slot = score;
        }
        if self.best.len() >= self.k.saturating_mul(2).saturating_add(16) {
            self.compact();
        }
    }

    fn compact(&mut self) {
        let mut ranked: Vec<(V, f64)> = self.best.drain().collect();
        ranked.sort_by(|a, b| rank((&a.0, a.1), (&b.0, b.1)));
        ranked.truncate(self.k);
        if ranked.len() == self.k {
            if let Some((_, score)) = ranked.last() {
                self.floor = *score;
            }
        }
        self.best.extend(ranked);
    }

    fn into_vec(mut self) -> Vec<(V, f64)> {
        self.compact();
        self.best.into_iter().collect()
    }
}

/// Partial combinations retained between two extensions
enum Frontier<V> {
    /// Every partial, repeated values included
    Unbounded(Vec<(V, f64)>),
    /// One entry per value, at its best score
    Threshold(f64, HashMap<V, f64>),
    Top(BestK<V>),
}

impl<V: Clone + Eq + Hash + Ord> Frontier<V> {
    fn new(prune: Prune) -> Self {
        match prune {
            Prune::Never => Frontier::Unbounded(Vec::new()),
            Prune::Below(t) => Frontier::Threshold(t, HashMap::new()),
            Prune::Top(k) => Frontier::Top(BestK::new(k)),
        }
    }

    /// Whether a partial scoring `score` can still enter, given the best
    /// scores of the positions after it
    fn admits<R: ScoreRule>(&self, score: f64, rule: &R, rest: &[f64]) -> bool {
        match self {
            Frontier::Unbounded(_) => true,
            Frontier::Threshold(t, _) => completion_bound(rule, score, rest) >= *t,
            Frontier::Top(top) => score >= top.floor,
        }
    }

    fn push(&mut self, value: V, score: f64) {
        match self {
            Frontier::Unbounded(items) => items.push((value, score)),
            Frontier::Threshold(_, items) => {
                let slot = items.entry(value).or_insert(score);
                if score > *slot {
                    *slot = score;
                }
            }
            Frontier::Top(top) => top.push(value, score),
        }
    }

    fn into_vec(self) -> Vec<(V, f64)> {
        match self {
            Frontier::Unbounded(items) => items,
            Frontier::Threshold(_, items) => items.into_iter().collect(),
            Frontier::Top(top) => top.into_vec(),
        }
    }
}

/// Highest score any completion of a partial can reach
fn completion_bound<R: ScoreRule>(rule: &R, score: f64, rest: &[f64]) -> f64 {
    rest.iter().fold(score, |acc, &best| rule.combine(acc, best))
}

/// Extend the frontier over every position, pruning after each step
fn sweep<T, C, R>(sets: &[FuzzySet<T>], concat: &C, rule: &R, prune: Prune) -> Vec<(C::Output, f64)>
where
    T: Clone + Eq + Hash + Ord + fmt::Debug,
    C: Concatenator<T>,
    R: ScoreRule,
{
    let best: Vec<f64> = sets
        .iter()
        .map(|set| set.iter().map(|(_, s)| s).fold(f64::NEG_INFINITY, f64::max))
        .collect();

    let mut partials: Vec<(C::Output, f64)> = Vec::new();
    for (position, set) in sets.iter().enumerate() {
        let rest = &best[position + 1..];
        let ranked = set.sorted();
        let mut extended = Frontier::new(prune);
        if position == 0 {
            for &(value, score) in &ranked {
                if !extended.admits(score, rule, rest) {
                    break;
                }
                extended.push(concat.start(value), score);
            }
        } else {
            for (prefix, prefix_score) in &partials {
                for &(value, score) in &ranked {
                    let combined = rule.combine(*prefix_score, score);
                    if !extended.admits(combined, rule, rest) {
                        // ranked by descending score: the rest of the row cannot enter
                        break;
                    }
                    extended.push(concat.extend(prefix, value), combined);
                }
            }
        }
        partials = extended.into_vec();
        debug!(position, retained = partials.len(), "frontier extended");
    }
    partials
}

/// Combine guess sets, one per position, into a guess over the
/// concatenation of the positions
///
/// Every combination scores the left fold of `rule` over its pieces'
/// scores, and a value reached by several combinations keeps the best of
/// them. `cut_off` prunes the final result (and the intermediate frontier
/// when the rule allows it).
pub fn join<T, C, R>(
    sets: &[FuzzySet<T>],
    cut_off: CutOff,
    concat: &C,
    rule: &R,
) -> Result<FuzzySet<C::Output>>
where
    T: Clone + Eq + Hash + Ord + fmt::Debug,
    C: Concatenator<T>,
    R: ScoreRule,
{
    cut_off.validate()?;
    if sets.is_empty() {
        return Err(CrackError::EmptyInput("no guess sets to join".into()));
    }
    if let Some(position) = sets.iter().position(FuzzySet::is_empty) {
        return Err(CrackError::EmptyInput(format!(
            "guess set at position {} is empty",
            position
        )));
    }

    let prune = rule.prunes_partials();
    debug!(
        positions = sets.len(),
        log2_combinations = log2_cardinality(sets),
        prune,
        "joining guess sets"
    );

    let partials = match cut_off {
        CutOff::Top(0) => Vec::new(),
        CutOff::Top(k) if prune => {
            // the k-th best score among k distinct values found by a bounded
            // search can only be at or below the true k-th score
            let found = sweep(sets, concat, rule, Prune::Top(k));
            let mut scores: Vec<f64> = found.iter().map(|(_, s)| *s).collect();
            scores.sort_by(|a, b| b.total_cmp(a));
            let floor = scores.get(k - 1).copied().unwrap_or(f64::NEG_INFINITY);
            debug!(k, floor, "top-k floor found");
            sweep(sets, concat, rule, Prune::Below(floor))
        }
        CutOff::Threshold(t) if prune => sweep(sets, concat, rule, Prune::Below(t)),
        _ => sweep(sets, concat, rule, Prune::Never),
    };

    let mut result = FuzzySet::new();
    for (value, score) in partials {
        result.insert_raw(value, score);
    }
    result.cut_off(cut_off);
    Ok(result)
}

/// Join per-position byte guesses into byte strings scored by product
pub fn join_bytes(sets: &[FuzzySet<u8>], cut_off: CutOff) -> Result<FuzzySet<ByteString>> {
    join(sets, cut_off, &ByteConcat, &Product)
}
