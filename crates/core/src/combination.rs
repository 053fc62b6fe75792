//! Bounded selection from the Cartesian product of per-key candidates.
//!
//! Emission happens in two phases sharing one counter capped at
//! `max_combinations`:
//!
//! 1. Prioritized: the i-th combination takes candidate `i % len` from every
//!    key, for i up to the longest candidate list. Duplicates are dropped.
//!    Every candidate of every key therefore appears early.
//! 2. Remainder: the full product in nested order (first key outermost),
//!    skipping anything already emitted in phase 1.
//!
//! Keys whose candidate list is empty are dropped from every combination.

use std::collections::BTreeMap;

use crate::error::ContractError;

#[derive(Debug, Clone)]
pub struct CombinationSpec<T> {
    keys: Vec<String>,
    candidates: Vec<Vec<T>>,
    max_combinations: usize,
}

impl<T: Clone + PartialEq> CombinationSpec<T> {
    /// Materializes each key's candidates. Fails when `max_combinations` is 0.
    pub fn new<K, I>(
        key_to_candidates: impl IntoIterator<Item = (K, I)>,
        max_combinations: usize,
    ) -> Result<Self, ContractError>
    where
        K: Into<String>,
        I: IntoIterator<Item = T>,
    {
        if max_combinations == 0 {
            return Err(ContractError::InvalidMaxCombinations(max_combinations));
        }
        let mut keys = Vec::new();
        let mut candidates = Vec::new();
        for (key, values) in key_to_candidates {
            let key = key.into();
            let values: Vec<T> = values.into_iter().collect();
            if values.is_empty() {
                tracing::debug!(key = %key, "dropping key with no candidates");
                continue;
            }
            keys.push(key);
            candidates.push(values);
        }
        let total = candidates
            .iter()
            .fold(1usize, |acc, c| acc.saturating_mul(c.len()));
        if total > max_combinations {
            tracing::debug!(
                total,
                max_combinations,
                "combination space exceeds cap, emission will be truncated"
            );
        }
        Ok(CombinationSpec {
            keys,
            candidates,
            max_combinations,
        })
    }

    pub fn max_combinations(&self) -> usize {
        self.max_combinations
    }

    /// Keys that survive (non-empty candidate lists), in order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Phase-1 combinations, deduplicated, not capped.
    pub fn prioritized_combinations(&self) -> Vec<BTreeMap<String, T>> {
        self.prioritized_tuples()
            .into_iter()
            .map(|t| self.to_map(t))
            .collect()
    }

    fn prioritized_tuples(&self) -> Vec<Vec<T>> {
        if self.keys.is_empty() {
            return vec![Vec::new()];
        }
        let longest = self.candidates.iter().map(Vec::len).max().unwrap_or(0);
        let mut tuples: Vec<Vec<T>> = Vec::new();
        for i in 0..longest {
            let tuple: Vec<T> = self
                .candidates
                .iter()
                .map(|c| c[i % c.len()].clone())
                .collect();
            if !tuples.contains(&tuple) {
                tuples.push(tuple);
            }
        }
        tuples
    }

    fn to_map(&self, tuple: Vec<T>) -> BTreeMap<String, T> {
        self.keys.iter().cloned().zip(tuple).collect()
    }

    /// Lazy iterator over the selected combinations.
    pub fn combinations(&self) -> Combinations<T> {
        self.clone().into_iter()
    }
}

impl<T: Clone + PartialEq> IntoIterator for CombinationSpec<T> {
    type Item = BTreeMap<String, T>;
    type IntoIter = Combinations<T>;

    fn into_iter(self) -> Combinations<T> {
        let prioritized = self.prioritized_tuples();
        let odometer = if self.keys.is_empty() {
            None
        } else {
            Some(vec![0; self.keys.len()])
        };
        Combinations {
            spec: self,
            prioritized,
            next_prioritized: 0,
            odometer,
            emitted: 0,
        }
    }
}

/// Iterator returned by [`CombinationSpec::combinations`].
pub struct Combinations<T> {
    spec: CombinationSpec<T>,
    prioritized: Vec<Vec<T>>,
    next_prioritized: usize,
    odometer: Option<Vec<usize>>,
    emitted: usize,
}

impl<T: Clone + PartialEq> Combinations<T> {
    fn advance_odometer(&mut self) {
        let Some(positions) = self.odometer.as_mut() else {
            return;
        };
        for slot in (0..positions.len()).rev() {
            positions[slot] += 1;
            if positions[slot] < self.spec.candidates[slot].len() {
                return;
            }
            positions[slot] = 0;
        }
        self.odometer = None;
    }
}

impl<T: Clone + PartialEq> Iterator for Combinations<T> {
    type Item = BTreeMap<String, T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.emitted >= self.spec.max_combinations {
            return None;
        }
        if self.next_prioritized < self.prioritized.len() {
            let tuple = self.prioritized[self.next_prioritized].clone();
            self.next_prioritized += 1;
            self.emitted += 1;
            return Some(self.spec.to_map(tuple));
        }
        loop {
            let positions = self.odometer.as_ref()?;
            let tuple: Vec<T> = positions
                .iter()
                .zip(&self.spec.candidates)
                .map(|(&i, c)| c[i].clone())
                .collect();
            self.advance_odometer();
            if self.prioritized.contains(&tuple) {
                continue;
            }
            self.emitted += 1;
            return Some(self.spec.to_map(tuple));
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
