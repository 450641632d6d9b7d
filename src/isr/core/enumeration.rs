//! Bounded enumeration of completions and presentation orders.
//!
//! Purpose
//! -------
//! Provide the exhaustive (and bounded) walks used by the exact ISR
//! computations: every permutation consistent with an
//! [`ObservationPattern`], every presentation order of `n` items, and a
//! randomized depth-first search that finds one consistent completion
//! without enumerating them all.
//!
//! Key behaviors
//! -------------
//! - Depth-first search over per-position candidate lists. Candidates are
//!   visited in increasing item order, so results come out sorted
//!   lexicographically on the ordering view.
//! - Enumeration never truncates: it fails with
//!   [`RankError::ConstraintTooLarge`] as soon as the result would exceed
//!   the bound.
//! - Every step checks, by bipartite matching of the remaining constrained
//!   positions against the remaining items, that the prefix still admits a
//!   completion; dead ends are never explored.
//! - Contradictory patterns yield an empty result rather than an error.
//! - [`ln_completion_count`] counts completions without listing them.
use std::collections::{BTreeMap, BTreeSet};

use rand::{Rng, seq::SliceRandom};

use crate::{
    isr::{
        core::{
            observation::{ObservationPattern, PositionConstraint},
            permutation::RankVal,
            validation::checked_factorial,
        },
        errors::{RankError, RankResult},
    },
    numerical_stability::ln_factorial,
};

/// Every completion consistent with `pattern`, sorted lexicographically.
///
/// Prefixes that no longer admit a completion are pruned, so the work is
/// proportional to the number of completions returned.
///
/// Parameters
/// ----------
/// - `pattern`: `&ObservationPattern`
///   Per-position constraints of the individual.
/// - `bound`: `usize`
///   Maximum number of completions returned.
///
/// Returns
/// -------
/// `RankResult<Vec<RankVal>>`
///   - One value when every position is present.
///   - `n!` values when every position is missing.
///   - An empty vector when the constraints are contradictory.
///
/// Errors
/// ------
/// - `RankError::ConstraintTooLarge`
///   Returned when more than `bound` completions exist. For fully missing
///   patterns the exact count `n!` is reported (saturated to `usize::MAX`).
pub fn enumerate_completions(pattern: &ObservationPattern, bound: usize) -> RankResult<Vec<RankVal>> {
    let n = pattern.len();
    if pattern.is_all_missing() {
        let count = checked_factorial(n).unwrap_or(usize::MAX);
        if count > bound {
            return Err(RankError::ConstraintTooLarge { count, bound });
        }
    }

    let mut available: BTreeSet<usize> = (0..n).collect();
    let mut current = Vec::with_capacity(n);
    let mut out = Vec::new();
    if is_feasible(pattern, &available, 0) {
        exhaustive_dfs(pattern, &mut available, &mut current, &mut out, bound)?;
    }
    Ok(out)
}

/// Every presentation order of `n` items, in lexicographic order.
///
/// # Errors
/// - [`RankError::ConstraintTooLarge`] when `n! > bound`.
pub fn enumerate_orders(n: usize, bound: usize) -> RankResult<Vec<Vec<usize>>> {
    let ranks = enumerate_completions(&ObservationPattern::all_missing(n), bound)?;
    Ok(ranks.into_iter().map(|r| r.ordering().to_vec()).collect())
}

/// One consistent completion found by a randomized depth-first search.
///
/// Candidates are shuffled at each depth and infeasible prefixes are
/// pruned, so the search never backtracks and any consistent completion can
/// be returned, though not with uniform probability. Returns `None` when
/// the pattern is unsatisfiable.
pub fn random_completion<R>(pattern: &ObservationPattern, rng: &mut R) -> Option<Vec<usize>>
where
    R: Rng + ?Sized,
{
    let n = pattern.len();
    let mut available: BTreeSet<usize> = (0..n).collect();
    let mut current = Vec::with_capacity(n);
    if !is_feasible(pattern, &available, 0) {
        return None;
    }
    if randomized_dfs(pattern, &mut available, &mut current, rng) { Some(current) } else { None }
}

/// Smallest completion in lexicographic order, or `None` if unsatisfiable.
pub fn first_completion(pattern: &ObservationPattern) -> Option<Vec<usize>> {
    let n = pattern.len();
    let mut available: BTreeSet<usize> = (0..n).collect();
    let mut current = Vec::with_capacity(n);
    let mut out = Vec::new();
    if !is_feasible(pattern, &available, 0) {
        return None;
    }
    // A bound of one stops the walk right after the first leaf.
    match exhaustive_dfs(pattern, &mut available, &mut current, &mut out, 1) {
        Ok(()) | Err(RankError::ConstraintTooLarge { .. }) => {
            out.into_iter().next().map(|r| r.ordering().to_vec())
        }
        Err(_) => None,
    }
}

/// Natural log of the number of completions consistent with `pattern`.
///
/// Missing positions take the items left over once the observed and
/// finite-candidate positions are filled, so the count is
/// `m! · #matchings` with `m` the number of missing positions; matchings
/// of the finite-candidate positions are counted by dynamic programming
/// over the sets of items already used.
///
/// Returns `-∞` when the pattern is unsatisfiable.
///
/// # Errors
/// - [`RankError::ConstraintTooLarge`] when the number of distinct partial
///   assignments tracked by the count exceeds `bound` (`count` then
///   reports that number, not the number of completions).
pub fn ln_completion_count(pattern: &ObservationPattern, bound: usize) -> RankResult<f64> {
    let n = pattern.len();
    let all: BTreeSet<usize> = (0..n).collect();
    if !is_feasible(pattern, &all, 0) {
        return Ok(f64::NEG_INFINITY);
    }

    let observed: BTreeSet<usize> = pattern
        .constraints()
        .iter()
        .filter_map(|c| match c {
            PositionConstraint::Present(item) => Some(*item),
            _ => None,
        })
        .collect();
    let free: BTreeSet<usize> = all.difference(&observed).copied().collect();
    let nb_missing = pattern.constraints().iter().filter(|c| c.is_missing()).count();
    let words = n.div_ceil(64).max(1);

    let mut states: BTreeMap<Vec<u64>, f64> = BTreeMap::new();
    states.insert(vec![0; words], 1.0);
    for position in 0..n {
        if !matches!(pattern.get(position), PositionConstraint::MissingFiniteValues(_)) {
            continue;
        }
        let candidates = pattern.candidates(position, &free);
        let mut next: BTreeMap<Vec<u64>, f64> = BTreeMap::new();
        for (used, ways) in &states {
            for &item in &candidates {
                let (word, bit) = (item / 64, 1u64 << (item % 64));
                if used[word] & bit != 0 {
                    continue;
                }
                let mut key = used.clone();
                key[word] |= bit;
                *next.entry(key).or_default() += ways;
            }
        }
        if next.len() > bound {
            return Err(RankError::ConstraintTooLarge { count: next.len(), bound });
        }
        states = next;
    }

    let matchings: f64 = states.values().sum();
    Ok(matchings.ln() + ln_factorial(nb_missing))
}

/// `true` if positions `from..n` can receive distinct items of `available`.
///
/// Missing positions accept any item, so only the constrained positions
/// need a matching into `available` (augmenting paths); the leftover
/// items then fill the missing positions.
fn is_feasible(pattern: &ObservationPattern, available: &BTreeSet<usize>, from: usize) -> bool {
    let adjacency: Vec<Vec<usize>> = (from..pattern.len())
        .filter(|&p| !pattern.get(p).is_missing())
        .map(|p| pattern.candidates(p, available))
        .collect();
    if adjacency.iter().any(Vec::is_empty) {
        return false;
    }
    let mut owner: Vec<Option<usize>> = vec![None; pattern.len()];
    for p in 0..adjacency.len() {
        let mut visited = vec![false; pattern.len()];
        if !augment(p, &adjacency, &mut owner, &mut visited) {
            return false;
        }
    }
    true
}

fn augment(p: usize, adjacency: &[Vec<usize>], owner: &mut [Option<usize>], visited: &mut [bool]) -> bool {
    for &item in &adjacency[p] {
        if visited[item] {
            continue;
        }
        visited[item] = true;
        let holder = owner[item];
        if holder.is_none_or(|q| augment(q, adjacency, owner, visited)) {
            owner[item] = Some(p);
            return true;
        }
    }
    false
}

/// Depth-first walk that only descends into prefixes which still admit a
/// completion, so every branch ends on a leaf.
fn exhaustive_dfs(
    pattern: &ObservationPattern, available: &mut BTreeSet<usize>, current: &mut Vec<usize>,
    out: &mut Vec<RankVal>, bound: usize,
) -> RankResult<()> {
    let position = current.len();
    if position == pattern.len() {
        if out.len() >= bound {
            return Err(RankError::ConstraintTooLarge { count: out.len() + 1, bound });
        }
        out.push(RankVal::from_ordering(current.clone())?);
        return Ok(());
    }
    for item in pattern.candidates(position, available) {
        available.remove(&item);
        if is_feasible(pattern, available, position + 1) {
            current.push(item);
            let res = exhaustive_dfs(pattern, available, current, out, bound);
            current.pop();
            if res.is_err() {
                available.insert(item);
                return res;
            }
        }
        available.insert(item);
    }
    Ok(())
}

fn randomized_dfs<R>(
    pattern: &ObservationPattern, available: &mut BTreeSet<usize>, current: &mut Vec<usize>,
    rng: &mut R,
) -> bool
where
    R: Rng + ?Sized,
{
    let position = current.len();
    if position == pattern.len() {
        return true;
    }
    let mut candidates = pattern.candidates(position, available);
    candidates.shuffle(rng);
    for item in candidates {
        available.remove(&item);
        if is_feasible(pattern, available, position + 1) {
            current.push(item);
            if randomized_dfs(pattern, available, current, rng) {
                return true;
            }
            current.pop();
        }
        available.insert(item);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isr::core::observation::PositionConstraint::{self, *};
    use rand::{SeedableRng, rngs::StdRng};

    fn pattern(constraints: Vec<PositionConstraint>) -> ObservationPattern {
        ObservationPattern::new(constraints).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Cardinalities on the canonical patterns.
    //
    // Given
    // -----
    // - A fully observed rank of size 5, a fully missing pattern of size 5,
    //   and a pattern repeating the same observed item twice.
    //
    // Expect
    // ------
    // - 1, 120 and 0 completions respectively.
    fn enumeration_cardinalities() {
        // Arrange
        let full = ObservationPattern::fully_observed(&[3, 0, 4, 1, 2]);
        let missing = ObservationPattern::all_missing(5);
        let duplicated = pattern(vec![Present(1), Present(1), Missing]);

        // Act / Assert
        let one = enumerate_completions(&full, 1_000).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].ordering(), &[3, 0, 4, 1, 2]);
        assert_eq!(enumerate_completions(&missing, 1_000).unwrap().len(), 120);
        assert!(enumerate_completions(&duplicated, 1_000).unwrap().is_empty());
    }

    #[test]
    // Purpose
    // -------
    // Mixed patterns enumerate exactly their admissible completions, in
    // lexicographic order.
    fn mixed_pattern_yields_sorted_admissible_completions() {
        // Arrange: position 0 in {0, 2}, position 1 missing, position 2 observed as 1.
        let p = pattern(vec![MissingFiniteValues(vec![0, 2]), Missing, Present(1)]);

        // Act
        let all = enumerate_completions(&p, 100).unwrap();

        // Assert
        let orderings: Vec<&[usize]> = all.iter().map(|r| r.ordering()).collect();
        assert_eq!(orderings, vec![&[0, 2, 1][..], &[2, 0, 1][..]]);
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    // Purpose
    // -------
    // The bound is enforced without truncation.
    fn bound_is_enforced() {
        let missing = ObservationPattern::all_missing(5);
        assert_eq!(
            enumerate_completions(&missing, 24),
            Err(RankError::ConstraintTooLarge { count: 120, bound: 24 })
        );

        let partial = pattern(vec![Missing, Missing, Missing, Present(0)]);
        assert!(matches!(
            enumerate_completions(&partial, 5),
            Err(RankError::ConstraintTooLarge { bound: 5, .. })
        ));
        assert_eq!(enumerate_completions(&partial, 6).unwrap().len(), 6);
    }

    #[test]
    fn orders_are_lexicographic_permutations() {
        let orders = enumerate_orders(3, 6).unwrap();
        assert_eq!(
            orders,
            vec![
                vec![0, 1, 2],
                vec![0, 2, 1],
                vec![1, 0, 2],
                vec![1, 2, 0],
                vec![2, 0, 1],
                vec![2, 1, 0]
            ]
        );
        assert!(enumerate_orders(4, 23).is_err());
    }

    #[test]
    // Purpose
    // -------
    // Randomized search returns consistent completions and detects
    // unsatisfiable patterns.
    fn random_completion_is_consistent() {
        // Arrange
        let mut rng = StdRng::seed_from_u64(5);
        let p = pattern(vec![
            MissingFiniteValues(vec![0, 1]),
            Missing,
            MissingFiniteValues(vec![1, 2]),
            Present(3),
            MissingFiniteValues(vec![3, 4]),
        ]);
        let dead = pattern(vec![MissingFiniteValues(vec![0, 1]), MissingFiniteValues(vec![0, 1]), Present(1)]);

        // Act / Assert
        for _ in 0..50 {
            let c = random_completion(&p, &mut rng).unwrap();
            assert_eq!(p.first_violation(&c), None);
            assert!(RankVal::from_ordering(c).is_ok());
        }
        assert_eq!(random_completion(&dead, &mut rng), None);
        assert_eq!(first_completion(&dead), None);
        assert_eq!(first_completion(&p), Some(vec![0, 1, 2, 3, 4]));
    }

    #[test]
    // Purpose
    // -------
    // One two-item candidate set with every other position missing admits
    // `2 · (n − 1)!` completions.
    //
    // Given
    // -----
    // - n = 5, position 2 in {1, 3}, the other positions missing.
    //
    // Expect
    // ------
    // - 48 completions, each holding 1 or 3 at position 2.
    fn single_finite_set_among_missing_counts_two_factorial() {
        // Arrange
        let p = pattern(vec![Missing, Missing, MissingFiniteValues(vec![1, 3]), Missing, Missing]);

        // Act
        let all = enumerate_completions(&p, 1_000).unwrap();

        // Assert
        assert_eq!(all.len(), 2 * 24);
        assert!(all.iter().all(|r| matches!(r.item_at(2), 1 | 3)));
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    // Purpose
    // -------
    // The closed-form count agrees with the enumerated cardinality.
    fn completion_count_matches_enumeration() {
        let cases = vec![
            ObservationPattern::all_missing(5),
            ObservationPattern::fully_observed(&[2, 0, 1]),
            pattern(vec![MissingFiniteValues(vec![0, 1]), MissingFiniteValues(vec![0, 1]), Missing, Missing]),
            pattern(vec![Missing, MissingFiniteValues(vec![1, 3]), Missing, Missing, Missing]),
            pattern(vec![
                MissingFiniteValues(vec![0, 1]),
                Missing,
                MissingFiniteValues(vec![1, 2]),
                Present(3),
                MissingFiniteValues(vec![3, 4]),
            ]),
            pattern(vec![
                MissingFiniteValues(vec![0, 1, 2]),
                MissingFiniteValues(vec![1, 2]),
                Present(2),
                Missing,
                Missing,
            ]),
        ];
        for p in &cases {
            let enumerated = enumerate_completions(p, 1_000).unwrap().len() as f64;
            let counted = ln_completion_count(p, 1_000).unwrap().exp();
            assert!((counted - enumerated).abs() < 1e-9, "{p:?}: counted {counted}, enumerated {enumerated}");
        }

        let dead = pattern(vec![Present(0), MissingFiniteValues(vec![0, 1]), Present(1)]);
        assert_eq!(ln_completion_count(&dead, 1_000).unwrap(), f64::NEG_INFINITY);
        let overlapping = pattern(vec![MissingFiniteValues(vec![0, 1, 2, 3]); 4]);
        assert!(matches!(
            ln_completion_count(&overlapping, 3),
            Err(RankError::ConstraintTooLarge { bound: 3, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Constraints that only bite on the last positions do not make the
    // search explore dead prefixes.
    //
    // Given
    // -----
    // - n = 16: fourteen missing positions followed by two positions in {0, 1}.
    //
    // Expect
    // ------
    // - The first completion is [2, 3, …, 15, 0, 1]; random completions are
    //   consistent; a small bound fails with `ConstraintTooLarge` right away;
    //   the count is 2 · 14!.
    fn late_constraints_are_resolved_without_backtracking() {
        // Arrange
        let n = 16;
        let mut constraints = vec![Missing; n - 2];
        constraints.push(MissingFiniteValues(vec![0, 1]));
        constraints.push(MissingFiniteValues(vec![0, 1]));
        let p = pattern(constraints);
        let mut rng = StdRng::seed_from_u64(13);

        // Act
        let first = first_completion(&p).unwrap();

        // Assert
        let mut expected: Vec<usize> = (2..n).collect();
        expected.extend([0, 1]);
        assert_eq!(first, expected);
        for _ in 0..20 {
            let c = random_completion(&p, &mut rng).unwrap();
            assert_eq!(p.first_violation(&c), None);
        }
        assert!(matches!(
            enumerate_completions(&p, 100),
            Err(RankError::ConstraintTooLarge { count: 101, bound: 100 })
        ));
        let expected_ln = 2f64.ln() + ln_factorial(14);
        assert!((ln_completion_count(&p, 100).unwrap() - expected_ln).abs() < 1e-9);
    }
}
