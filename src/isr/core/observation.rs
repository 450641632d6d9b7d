//! Partial observation descriptors for ranks.
//!
//! Each position of an observed rank carries a [`PositionConstraint`]:
//! the item is known (`Present`), unknown (`Missing`), or known to belong to
//! an explicit finite set (`MissingFiniteValues`). An [`ObservationPattern`]
//! owns one constraint per position and answers the admissibility queries
//! used by enumeration and by the Gibbs completion sampler.
//!
//! ## Invariants
//! - Candidate sets are sorted, duplicate free, contain at least two items,
//!   and only hold items in `0..n`. Single-item sets are expressed as
//!   `Present`.
//! - A pattern of length `n` validates every constraint against `n` at
//!   construction; later queries assume well-formed constraints.
use std::collections::BTreeSet;

use crate::isr::errors::{RankError, RankResult};

/// Constraint on the item held at one position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PositionConstraint {
    /// The item at this position is observed.
    Present(usize),
    /// Nothing is known about this position.
    Missing,
    /// The item is one of a finite candidate set (sorted, ≥ 2 items).
    MissingFiniteValues(Vec<usize>),
}

impl PositionConstraint {
    /// Build a finite-candidates constraint, normalizing order and duplicates.
    ///
    /// A set collapsing to a single item yields `Present(item)`.
    ///
    /// # Errors
    /// - [`RankError::InvalidCandidateSet`] if the set is empty. `position`
    ///   is only used to label the error.
    pub fn finite_values<I>(position: usize, candidates: I) -> RankResult<PositionConstraint>
    where
        I: IntoIterator<Item = usize>,
    {
        let set: Vec<usize> =
            candidates.into_iter().collect::<BTreeSet<usize>>().into_iter().collect();
        match set.len() {
            0 => Err(RankError::InvalidCandidateSet {
                position,
                candidates: Vec::new(),
                reason: "Candidate set must not be empty.",
            }),
            1 => Ok(PositionConstraint::Present(set[0])),
            _ => Ok(PositionConstraint::MissingFiniteValues(set)),
        }
    }

    /// Is `item` admissible at this position?
    pub fn admits(&self, item: usize) -> bool {
        match self {
            PositionConstraint::Present(observed) => *observed == item,
            PositionConstraint::Missing => true,
            PositionConstraint::MissingFiniteValues(candidates) => {
                candidates.binary_search(&item).is_ok()
            }
        }
    }

    /// Can a *different* item be moved into this position?
    ///
    /// `Present` positions are frozen; the other kinds accept `item` if it
    /// is admissible.
    pub fn accepts_move_of(&self, item: usize) -> bool {
        match self {
            PositionConstraint::Present(_) => false,
            other => other.admits(item),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, PositionConstraint::Present(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, PositionConstraint::Missing)
    }
}

/// One constraint per position, validated against the rank size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObservationPattern {
    constraints: Vec<PositionConstraint>,
    all_present: bool,
    all_missing: bool,
}

impl ObservationPattern {
    /// Validate and wrap a constraint vector; `n = constraints.len()`.
    ///
    /// # Errors
    /// - [`RankError::InvalidCandidateSet`] if a `Present` item or a candidate
    ///   lies outside `0..n`, or if a candidate set is unsorted, holds
    ///   duplicates, or has fewer than two items.
    pub fn new(constraints: Vec<PositionConstraint>) -> RankResult<ObservationPattern> {
        let n = constraints.len();
        for (position, constraint) in constraints.iter().enumerate() {
            match constraint {
                PositionConstraint::Present(item) if *item >= n => {
                    return Err(RankError::InvalidCandidateSet {
                        position,
                        candidates: vec![*item],
                        reason: "Observed item lies outside the rank.",
                    });
                }
                PositionConstraint::MissingFiniteValues(candidates) => {
                    validate_candidates(position, candidates, n)?;
                }
                _ => {}
            }
        }
        let all_present = constraints.iter().all(PositionConstraint::is_present);
        let all_missing = constraints.iter().all(PositionConstraint::is_missing);
        Ok(ObservationPattern { constraints, all_present, all_missing })
    }

    /// Pattern where every position is `Missing`.
    pub fn all_missing(n: usize) -> ObservationPattern {
        ObservationPattern {
            constraints: vec![PositionConstraint::Missing; n],
            all_present: n == 0,
            all_missing: true,
        }
    }

    /// Pattern where every position is `Present`, taken from an ordering.
    pub fn fully_observed(ordering: &[usize]) -> ObservationPattern {
        ObservationPattern {
            constraints: ordering.iter().map(|&item| PositionConstraint::Present(item)).collect(),
            all_present: true,
            all_missing: ordering.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn constraints(&self) -> &[PositionConstraint] {
        &self.constraints
    }

    pub fn get(&self, position: usize) -> &PositionConstraint {
        &self.constraints[position]
    }

    /// Every position observed: the completion is fixed.
    pub fn is_all_present(&self) -> bool {
        self.all_present
    }

    /// Nothing observed: every permutation is admissible.
    pub fn is_all_missing(&self) -> bool {
        self.all_missing
    }

    /// Items admissible at `position` among those still `available`.
    ///
    /// Candidates come out in increasing item order, so depth-first
    /// enumeration visits completions lexicographically.
    pub fn candidates(&self, position: usize, available: &BTreeSet<usize>) -> Vec<usize> {
        match &self.constraints[position] {
            PositionConstraint::Present(item) => {
                if available.contains(item) {
                    vec![*item]
                } else {
                    Vec::new()
                }
            }
            PositionConstraint::Missing => available.iter().copied().collect(),
            PositionConstraint::MissingFiniteValues(candidates) => {
                candidates.iter().copied().filter(|c| available.contains(c)).collect()
            }
        }
    }

    /// First position whose constraint rejects the item placed there, if any.
    pub fn first_violation(&self, ordering: &[usize]) -> Option<usize> {
        self.constraints.iter().zip(ordering).position(|(c, &item)| !c.admits(item))
    }
}

fn validate_candidates(position: usize, candidates: &[usize], n: usize) -> RankResult<()> {
    let err = |reason| RankError::InvalidCandidateSet {
        position,
        candidates: candidates.to_vec(),
        reason,
    };
    if candidates.len() < 2 {
        return Err(err("Candidate sets need at least two items; use Present otherwise."));
    }
    if candidates.windows(2).any(|w| w[0] >= w[1]) {
        return Err(err("Candidate sets must be sorted and duplicate free."));
    }
    if candidates.iter().any(|&c| c >= n) {
        return Err(err("Candidate lies outside the rank."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // `finite_values` normalizes its input and collapses singletons.
    fn finite_values_normalizes_and_collapses_singletons() {
        assert_eq!(
            PositionConstraint::finite_values(0, [4, 1, 4]).unwrap(),
            PositionConstraint::MissingFiniteValues(vec![1, 4])
        );
        assert_eq!(
            PositionConstraint::finite_values(0, [2, 2]).unwrap(),
            PositionConstraint::Present(2)
        );
        assert!(matches!(
            PositionConstraint::finite_values(3, []),
            Err(RankError::InvalidCandidateSet { position: 3, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Patterns reject out-of-range items and malformed candidate sets.
    fn pattern_validates_against_rank_size() {
        let bad_present =
            ObservationPattern::new(vec![PositionConstraint::Present(3), PositionConstraint::Missing]);
        assert!(bad_present.is_err());

        let bad_set = ObservationPattern::new(vec![
            PositionConstraint::MissingFiniteValues(vec![0, 5]),
            PositionConstraint::Missing,
        ]);
        assert!(bad_set.is_err());

        let unsorted = ObservationPattern::new(vec![
            PositionConstraint::MissingFiniteValues(vec![1, 0]),
            PositionConstraint::Missing,
        ]);
        assert!(unsorted.is_err());
    }

    #[test]
    // Purpose
    // -------
    // Flags and candidate lists reflect the constraint kinds.
    fn candidates_respect_constraint_kind_and_availability() {
        let pattern = ObservationPattern::new(vec![
            PositionConstraint::Present(2),
            PositionConstraint::Missing,
            PositionConstraint::MissingFiniteValues(vec![0, 2]),
        ])
        .unwrap();
        assert!(!pattern.is_all_present());
        assert!(!pattern.is_all_missing());

        let available: BTreeSet<usize> = [0, 1].into_iter().collect();
        assert_eq!(pattern.candidates(0, &available), Vec::<usize>::new());
        assert_eq!(pattern.candidates(1, &available), vec![0, 1]);
        assert_eq!(pattern.candidates(2, &available), vec![0]);

        assert_eq!(pattern.first_violation(&[2, 1, 0]), None);
        assert_eq!(pattern.first_violation(&[2, 0, 1]), Some(2));
    }
}
