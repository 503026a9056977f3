//! Outcome distributions and key alignment.
//!
//! An [`OutcomeDistribution`] maps a fixed-width bitstring to a non-negative
//! frequency. The same type carries raw shot counts (as returned by an
//! [`Oracle`](crate::Oracle)) and normalized probabilities (as returned by
//! [`OutcomeDistribution::probabilities`]).
//!
//! Any comparison between two distributions first aligns them over the
//! sorted union of their keys; see [`aligned_keys`] and [`aligned_vector`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{HalError, HalResult};

/// Mapping from measured bitstring to frequency. Keys iterate in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutcomeDistribution {
    entries: BTreeMap<String, f64>,
}

impl OutcomeDistribution {
    /// Create an empty distribution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a distribution from integer shot counts.
    pub fn from_counts<K, I>(counts: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, u64)>,
    {
        counts
            .into_iter()
            .map(|(k, v)| -> (String, f64) { (k.into(), v as f64) })
            .collect()
    }

    /// Set the frequency for an outcome, replacing any previous value.
    pub fn insert(&mut self, outcome: impl Into<String>, frequency: f64) {
        self.entries.insert(outcome.into(), frequency);
    }

    /// Add one observation of `outcome`.
    pub fn increment(&mut self, outcome: &str) {
        self.add(outcome, 1.0);
    }

    /// Add `amount` to the frequency of `outcome`.
    pub fn add(&mut self, outcome: &str, amount: f64) {
        match self.entries.get_mut(outcome) {
            Some(v) => *v += amount,
            None => {
                self.entries.insert(outcome.to_string(), amount);
            }
        }
    }

    /// Frequency of an outcome, 0 when absent.
    pub fn get(&self, outcome: &str) -> f64 {
        self.entries.get(outcome).copied().unwrap_or(0.0)
    }

    /// Whether the outcome appears in the distribution.
    pub fn contains(&self, outcome: &str) -> bool {
        self.entries.contains_key(outcome)
    }

    /// Sum of all frequencies (the shot count for count distributions).
    pub fn total(&self) -> f64 {
        self.entries.values().sum()
    }

    /// Number of distinct outcomes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no outcome has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Outcomes in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// `(outcome, frequency)` pairs in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// The outcome with the highest frequency. Ties go to the smallest key.
    pub fn most_frequent(&self) -> Option<(&str, f64)> {
        self.iter().fold(None, |best, (k, v)| match best {
            Some((_, bv)) if bv >= v => best,
            _ => Some((k, v)),
        })
    }

    /// Normalize into probabilities summing to 1.
    ///
    /// Fails when any frequency is negative or non-finite, or when the total
    /// is not strictly positive.
    pub fn probabilities(&self) -> HalResult<OutcomeDistribution> {
        if let Some((k, v)) = self.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(HalError::Normalization(format!(
                "outcome '{k}' has invalid frequency {v}"
            )));
        }
        let total = self.total();
        if total <= 0.0 || !total.is_finite() {
            return Err(HalError::Normalization(format!(
                "total frequency must be positive, got {total}"
            )));
        }
        Ok(self.iter().map(|(k, v)| (k.to_string(), v / total)).collect())
    }
}

impl FromIterator<(String, f64)> for OutcomeDistribution {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut dist = Self::new();
        for (k, v) in iter {
            dist.add(&k, v);
        }
        dist
    }
}

/// Sorted union of the outcome keys of two distributions.
pub fn aligned_keys(a: &OutcomeDistribution, b: &OutcomeDistribution) -> Vec<String> {
    let union: BTreeSet<&str> = a.keys().chain(b.keys()).collect();
    union.into_iter().map(str::to_string).collect()
}

/// Frequencies of `dist` in `keys` order, using `missing` for absent keys.
pub fn aligned_vector(dist: &OutcomeDistribution, keys: &[String], missing: f64) -> Vec<f64> {
    keys.iter()
        .map(|k| dist.entries.get(k).copied().unwrap_or(missing))
        .collect()
}
