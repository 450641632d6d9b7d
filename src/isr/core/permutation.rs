//! RankVal — permutation value with dual representations.
//!
//! Purpose
//! -------
//! Represent a complete rank of fixed size `n` through its two mutually
//! inverse views: the *ordering* (position → item) and the *ranking*
//! (item → position). Every ISR computation reads one view or the other,
//! so both are stored eagerly and kept synchronized.
//!
//! Key behaviors
//! -------------
//! - Validate sequences at construction ([`RankVal::from_ordering`],
//!   [`RankVal::set_ordering`], [`RankVal::set_ranking`]).
//! - Provide a single in-place mutation primitive,
//!   [`RankVal::apply_adjacent_exchange`], that updates both views in O(1).
//! - Order ranks lexicographically on the ordering so they can key
//!   `BTreeMap` / `BTreeSet` containers used by the samplers and statistics.
//!
//! Invariants & assumptions
//! ------------------------
//! - `ordering[ranking[i]] == i` and `ranking[ordering[p]] == p` for every
//!   item `i` and position `p`, at all times.
//! - The size is fixed once constructed; setters reject sequences of a
//!   different length.
//!
//! Conventions
//! -----------
//! - Items and positions are 0-based.
//! - `Display` prints the ordering as a comma separated list, the same
//!   layout the text parser accepts.
use std::fmt;

use crate::isr::errors::{RankError, RankResult};

/// Permutation value with synchronized ordering and ranking views.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RankVal {
    /// `ordering[p]` is the item placed at position `p`.
    ordering: Vec<usize>,
    /// `ranking[item]` is the position of `item`.
    ranking: Vec<usize>,
}

impl RankVal {
    /// Identity rank of size `n` (item `p` at position `p`).
    pub fn identity(n: usize) -> RankVal {
        let ordering: Vec<usize> = (0..n).collect();
        RankVal { ranking: ordering.clone(), ordering }
    }

    /// Build a rank from its ordering (position → item) representation.
    ///
    /// # Errors
    /// - [`RankError::InvalidPermutation`] if `ordering` is not a
    ///   permutation of `0..ordering.len()`.
    pub fn from_ordering(ordering: Vec<usize>) -> RankResult<RankVal> {
        let n = ordering.len();
        let mut ranking = vec![0; n];
        switch_representation_checked(&ordering, &mut ranking)?;
        Ok(RankVal { ordering, ranking })
    }

    /// Build a rank from its ranking (item → position) representation.
    ///
    /// # Errors
    /// - [`RankError::InvalidPermutation`] if `ranking` is not a permutation.
    pub fn from_ranking(ranking: Vec<usize>) -> RankResult<RankVal> {
        let n = ranking.len();
        let mut ordering = vec![0; n];
        switch_representation_checked(&ranking, &mut ordering)?;
        Ok(RankVal { ordering, ranking })
    }

    /// Number of positions (equivalently, of items).
    pub fn len(&self) -> usize {
        self.ordering.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordering.is_empty()
    }

    /// Position → item view.
    pub fn ordering(&self) -> &[usize] {
        &self.ordering
    }

    /// Item → position view.
    pub fn ranking(&self) -> &[usize] {
        &self.ranking
    }

    /// Item at position `p`.
    #[inline]
    pub fn item_at(&self, p: usize) -> usize {
        self.ordering[p]
    }

    /// Position of `item`.
    #[inline]
    pub fn position_of(&self, item: usize) -> usize {
        self.ranking[item]
    }

    /// Replace the ordering, recomputing the ranking.
    ///
    /// # Errors
    /// - [`RankError::SizeMismatch`] if `ordering.len() != self.len()`.
    /// - [`RankError::InvalidPermutation`] if `ordering` is not a permutation;
    ///   `self` is left unchanged in both cases.
    pub fn set_ordering(&mut self, ordering: &[usize]) -> RankResult<()> {
        if ordering.len() != self.len() {
            return Err(RankError::SizeMismatch { expected: self.len(), actual: ordering.len() });
        }
        let mut ranking = vec![0; ordering.len()];
        switch_representation_checked(ordering, &mut ranking)?;
        self.ordering.copy_from_slice(ordering);
        self.ranking = ranking;
        Ok(())
    }

    /// Replace the ranking, recomputing the ordering.
    ///
    /// # Errors
    /// Same as [`RankVal::set_ordering`].
    pub fn set_ranking(&mut self, ranking: &[usize]) -> RankResult<()> {
        if ranking.len() != self.len() {
            return Err(RankError::SizeMismatch { expected: self.len(), actual: ranking.len() });
        }
        let mut ordering = vec![0; ranking.len()];
        switch_representation_checked(ranking, &mut ordering)?;
        self.ranking.copy_from_slice(ranking);
        self.ordering = ordering;
        Ok(())
    }

    /// Exchange the items at positions `p` and `p + 1`.
    ///
    /// Both views are updated in O(1). Applying the same exchange twice
    /// restores the original rank.
    ///
    /// # Panics
    /// - If `p + 1 >= self.len()`; callers iterate over `0..len - 1`.
    pub fn apply_adjacent_exchange(&mut self, p: usize) {
        self.ordering.swap(p, p + 1);
        self.ranking[self.ordering[p]] = p;
        self.ranking[self.ordering[p + 1]] = p + 1;
    }

    /// `true` if `a` is placed before `b` in this rank.
    #[inline]
    pub fn precedes(&self, a: usize, b: usize) -> bool {
        self.ranking[a] < self.ranking[b]
    }
}

impl PartialOrd for RankVal {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankVal {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ordering.cmp(&other.ordering)
    }
}

impl fmt::Display for RankVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (p, item) in self.ordering.iter().enumerate() {
            if p > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

/// Compute the inverse permutation of `input` into `output`.
///
/// Interprets `input` as a map `k → input[k]` and writes `output[input[k]] = k`.
/// Applied to an ordering it yields the ranking and vice versa; applying it
/// twice returns the original sequence.
///
/// # Panics
/// - If `output.len() != input.len()` or `input` holds a value `>= input.len()`.
///   Use [`RankVal::from_ordering`] for validated conversion.
pub fn switch_representation(input: &[usize], output: &mut [usize]) {
    for (k, &v) in input.iter().enumerate() {
        output[v] = k;
    }
}

/// Validated variant of [`switch_representation`].
fn switch_representation_checked(input: &[usize], output: &mut [usize]) -> RankResult<()> {
    let n = input.len();
    let invalid = || RankError::InvalidPermutation { expected: n, values: input.to_vec() };
    if output.len() != n {
        return Err(RankError::SizeMismatch { expected: n, actual: output.len() });
    }
    let mut seen = vec![false; n];
    for &v in input {
        if v >= n || seen[v] {
            return Err(invalid());
        }
        seen[v] = true;
    }
    switch_representation(input, output);
    Ok(())
}
