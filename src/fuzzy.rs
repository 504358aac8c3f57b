use crate::error::{CrackError, Result};
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Pruning policy for a guess set
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CutOff {
    /// Keep every candidate
    All,
    /// Drop candidates scoring strictly below the threshold
    Threshold(f64),
    /// Keep only the N best candidates
    Top(usize),
}

impl CutOff {
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            CutOff::Threshold(t) if t.is_nan() => Err(CrackError::InvalidArgument(
                "cut-off threshold cannot be NaN".into(),
            )),
            _ => Ok(()),
        }
    }
}

impl From<f64> for CutOff {
    fn from(threshold: f64) -> Self {
        CutOff::Threshold(threshold)
    }
}

impl From<usize> for CutOff {
    fn from(n: usize) -> Self {
        CutOff::Top(n)
    }
}

/// Ranking order: higher score first, ties to the smaller value
pub(crate) fn rank<T: Ord>(a: (&T, f64), b: (&T, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

fn check_score<T: fmt::Debug>(value: &T, score: f64) -> Result<()> {
    if (0.0..=1.0).contains(&score) {
        Ok(())
    } else {
        Err(CrackError::InvalidScore {
            candidate: format!("{:?}", value),
            score,
        })
    }
}

/// A scored set of candidate answers
///
/// Each value appears once with a score in `[0, 1]`. Scores rank the
/// candidates; they are not required to sum to one. Candidates scoring
/// below `min_membership` are never kept.
#[derive(Clone)]
pub struct FuzzySet<T> {
    items: HashMap<T, f64>,
    min_membership: f64,
}

impl<T: Eq + Hash> PartialEq for FuzzySet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.min_membership == other.min_membership && self.items == other.items
    }
}

impl<T> Default for FuzzySet<T> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
            min_membership: 0.0,
        }
    }
}

impl<T> FuzzySet<T>
where
    T: Clone + Eq + Hash + Ord + fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_membership(min_membership: f64) -> Result<Self> {
        let mut set = Self::new();
        set.set_min_membership(min_membership)?;
        Ok(set)
    }

    /// Build from `(value, score)` pairs; repeated values keep the best score
    pub fn from_pairs<I: IntoIterator<Item = (T, f64)>>(pairs: I) -> Result<Self> {
        let mut set = Self::new();
        for (value, score) in pairs {
            set.insert(value, score)?;
        }
        Ok(set)
    }

    /// Build from keys sharing the same score
    pub fn from_keys<I: IntoIterator<Item = T>>(keys: I, score: f64) -> Result<Self> {
        Self::from_pairs(keys.into_iter().map(|k| (k, score)))
    }

    pub fn min_membership(&self) -> f64 {
        self.min_membership
    }

    /// Change the membership floor, dropping anything now below it
    pub fn set_min_membership(&mut self, min_membership: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&min_membership) {
            return Err(CrackError::InvalidArgument(format!(
                "The minimum membership is {:.4} but it must be a value between 0 and 1",
                min_membership
            )));
        }
        self.min_membership = min_membership;
        self.items.retain(|_, score| *score >= min_membership);
        Ok(())
    }

    /// Add a candidate; an existing one keeps the higher of both scores
    pub fn insert(&mut self, value: T, score: f64) -> Result<()> {
        self.insert_with(value, score, f64::max)
    }

    /// Add a candidate combining with an existing score through `rule`
    pub fn insert_with<F>(&mut self, value: T, score: f64, rule: F) -> Result<()>
    where
        F: Fn(f64, f64) -> f64,
    {
        check_score(&value, score)?;
        let combined = match self.items.get(&value) {
            Some(&old) => rule(old, score),
            None => score,
        };
        check_score(&value, combined)?;
        self.store(value, combined);
        Ok(())
    }

    /// Assign a score, replacing any previous one
    pub fn set(&mut self, value: T, score: f64) -> Result<()> {
        check_score(&value, score)?;
        self.store(value, score);
        Ok(())
    }

    fn store(&mut self, value: T, score: f64) {
        if score < self.min_membership {
            self.items.remove(&value);
        } else {
            self.items.insert(value, score);
        }
    }

    pub fn remove(&mut self, value: &T) -> Option<f64> {
        self.items.remove(value)
    }

    /// Score of a candidate, 0 when absent
    pub fn score(&self, value: &T) -> f64 {
        self.items.get(value).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.items.contains_key(value)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Best candidate; ties go to the smallest value
    pub fn most_likely(&self) -> Result<&T> {
        self.items
            .iter()
            .map(|(v, &s)| (v, s))
            .min_by(|a, b| rank(*a, *b))
            .map(|(v, _)| v)
            .ok_or(CrackError::EmptyGuess)
    }

    /// The `n` best candidates in ranking order
    pub fn most_likely_n(&self, n: usize) -> Vec<&T> {
        self.sorted().into_iter().take(n).map(|(v, _)| v).collect()
    }

    /// Prune the set in place
    pub fn cut_off(&mut self, cut: CutOff) {
        match cut {
            CutOff::All => {}
            CutOff::Threshold(t) => self.items.retain(|_, score| *score >= t),
            CutOff::Top(n) => {
                if n >= self.items.len() {
                    return;
                }
                let keep: Vec<T> = self
                    .sorted()
                    .into_iter()
                    .take(n)
                    .map(|(v, _)| v.clone())
                    .collect();
                let mut kept = HashMap::with_capacity(keep.len());
                for value in keep {
                    if let Some(score) = self.items.remove(&value) {
                        kept.insert(value, score);
                    }
                }
                self.items = kept;
            }
        }
    }

    /// Candidates by descending score, ties by ascending value
    pub fn sorted(&self) -> Vec<(&T, f64)> {
        let mut items: Vec<(&T, f64)> = self.items.iter().map(|(v, &s)| (v, s)).collect();
        items.sort_by(|a, b| rank(*a, *b));
        items
    }

    pub fn iter(&self) -> std::vec::IntoIter<(&T, f64)> {
        self.sorted().into_iter()
    }

    /// Candidates in no particular order
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.keys()
    }

    /// Multiply every score by `factor`
    pub fn scale(&mut self, factor: f64) -> Result<()> {
        for (value, score) in &self.items {
            check_score(value, score * factor)?;
        }
        for score in self.items.values_mut() {
            *score *= factor;
        }
        let floor = self.min_membership;
        self.items.retain(|_, score| *score >= floor);
        Ok(())
    }

    /// Rescale so the scores sum to one; no-op for an all-zero set
    pub fn normalize(&mut self) {
        let total: f64 = self.items.values().sum();
        if total > 0.0 {
            for score in self.items.values_mut() {
                *score = (*score / total).min(1.0);
            }
            let floor = self.min_membership;
            self.items.retain(|_, score| *score >= floor);
        }
    }

    /// Candidates of either set with the maximum of both scores
    pub fn union(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.update(other);
        out
    }

    /// In-place union
    pub fn update(&mut self, other: &Self) {
        for (value, &score) in &other.items {
            let best = self.score(value).max(score);
            self.store(value.clone(), best);
        }
    }

    /// Candidates present in both sets with the minimum of both scores
    pub fn intersection(&self, other: &Self) -> Self {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut out = Self::new();
        for (value, &score) in &small.items {
            if let Some(&theirs) = large.items.get(value) {
                out.store(value.clone(), score.min(theirs));
            }
        }
        out
    }

    /// Every candidate of `self` is in `other` with at least the same score
    pub fn is_subset(&self, other: &Self) -> bool {
        self.items
            .iter()
            .all(|(value, &score)| other.contains(value) && score <= other.score(value))
    }

    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }

    /// Project every candidate through `f`; collisions keep the best score
    pub fn map<U, F>(&self, f: F) -> FuzzySet<U>
    where
        U: Clone + Eq + Hash + Ord + fmt::Debug,
        F: Fn(&T) -> U,
    {
        let mut out = FuzzySet::new();
        for (value, &score) in &self.items {
            let mapped = f(value);
            let best = out.score(&mapped).max(score);
            out.items.insert(mapped, best);
        }
        out
    }

    /// Insert without range checks for scores produced by a trusted fold
    pub(crate) fn insert_raw(&mut self, value: T, score: f64) {
        let best = match self.items.get(&value) {
            Some(&old) => old.max(score),
            None => score,
        };
        self.store(value, best);
    }
}

impl<T> fmt::Display for FuzzySet<T>
where
    T: Clone + Eq + Hash + Ord + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (value, score)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:?} -> {:.4}", value, score)?;
        }
        f.write_str("}")
    }
}

impl<T> fmt::Debug for FuzzySet<T>
where
    T: Clone + Eq + Hash + Ord + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[derive(Serialize)]
struct RankedEntry<'a, T> {
    value: &'a T,
    score: f64,
}

/// Serialized as a ranked list of `{value, score}` entries
impl<T> Serialize for FuzzySet<T>
where
    T: Clone + Eq + Hash + Ord + fmt::Debug + Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for (value, score) in self.iter() {
            seq.serialize_element(&RankedEntry { value, score })?;
        }
        seq.end()
    }
}
