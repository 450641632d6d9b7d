//! Rank individual: ISR generative model and Gibbs conditional samplers.
//!
//! A [`RankIndividual`] couples an observed (possibly partial) rank with its
//! current completion `x` and the latent presentation order `y` in which the
//! ISR process inserted its items.
//!
//! Key ideas:
//! - The ISR process draws `y` uniformly, then inserts `y[1], y[2], …` into
//!   the growing sequence. Each new item is compared left to right with the
//!   placed items; a comparison agrees with the central rank μ with
//!   probability π and is flipped otherwise, and the item goes before the
//!   first placed item it compares as "before" (or at the end).
//! - Given `(x, y)`, replaying the insertion recovers the number of
//!   comparisons `a` and agreements `g`, so
//!   `ln P(x, y | μ, π) = −ln n! + g·ln π + (a − g)·ln(1 − π)`.
//! - Gibbs sweeps over `y` and `x` use adjacent exchanges with a two-state
//!   heat-bath choice; exchanges on `x` are restricted to those that keep
//!   the completion consistent with the observation.
use std::collections::BTreeMap;
use std::ops::AddAssign;

use rand::{Rng, seq::SliceRandom};
use tracing::debug;

use crate::{
    isr::{
        core::{
            enumeration::{
                enumerate_completions, enumerate_orders, first_completion, ln_completion_count,
                random_completion,
            },
            observation::ObservationPattern,
            permutation::RankVal,
            validation::{checked_factorial, validate_model_params, validate_rank_size},
        },
        errors::{RankError, RankResult},
    },
    numerical_stability::{ln_bernoulli_path, ln_factorial, log_pair_to_multi, log_sum_exp, log_to_multi},
};

/// Comparison counts of one insertion replay (`a` and `g`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComparisonCounts {
    /// Total number of comparisons performed (`a`).
    pub comparisons: usize,
    /// Comparisons agreeing with the central rank (`g`).
    pub agreements: usize,
}

impl ComparisonCounts {
    pub fn disagreements(&self) -> usize {
        self.comparisons - self.agreements
    }

    /// `g / a`, or `None` when no comparison was made.
    pub fn agreement_rate(&self) -> Option<f64> {
        if self.comparisons == 0 {
            None
        } else {
            Some(self.agreements as f64 / self.comparisons as f64)
        }
    }
}

impl AddAssign for ComparisonCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.comparisons += rhs.comparisons;
        self.agreements += rhs.agreements;
    }
}

/// Completed log-probability with its sufficient statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletedLogProbability {
    pub log_probability: f64,
    pub agreements: usize,
    pub disagreements: usize,
}

impl CompletedLogProbability {
    pub fn comparisons(&self) -> usize {
        self.agreements + self.disagreements
    }

    pub fn counts(&self) -> ComparisonCounts {
        ComparisonCounts { comparisons: self.comparisons(), agreements: self.agreements }
    }
}

/// Observed rank with its current completion and presentation order.
///
/// # Notes
/// - `completed` satisfies `constraints` at all times; every public mutator
///   preserves this.
/// - `latent_order` is a permutation of `0..n`.
#[derive(Debug, Clone, PartialEq)]
pub struct RankIndividual {
    completed: RankVal,
    constraints: ObservationPattern,
    latent_order: Vec<usize>,
}

impl RankIndividual {
    /// Individual observed through `constraints`.
    ///
    /// The completion starts at the lexicographically smallest consistent
    /// rank and the presentation order at the identity; call
    /// [`reset_to_random_completion`](Self::reset_to_random_completion)
    /// before sampling.
    ///
    /// # Errors
    /// - [`RankError::UnsatisfiableConstraints`] if no permutation satisfies
    ///   the pattern.
    pub fn new(constraints: ObservationPattern) -> RankResult<RankIndividual> {
        let ordering = first_completion(&constraints).ok_or(RankError::UnsatisfiableConstraints)?;
        let n = constraints.len();
        Ok(RankIndividual {
            completed: RankVal::from_ordering(ordering)?,
            constraints,
            latent_order: (0..n).collect(),
        })
    }

    /// Fully observed individual.
    pub fn from_rank(rank: RankVal) -> RankIndividual {
        let n = rank.len();
        RankIndividual {
            constraints: ObservationPattern::fully_observed(rank.ordering()),
            completed: rank,
            latent_order: (0..n).collect(),
        }
    }

    /// Fully missing individual of size `n`.
    pub fn missing(n: usize) -> RankIndividual {
        RankIndividual {
            completed: RankVal::identity(n),
            constraints: ObservationPattern::all_missing(n),
            latent_order: (0..n).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    pub fn completed(&self) -> &RankVal {
        &self.completed
    }

    pub fn constraints(&self) -> &ObservationPattern {
        &self.constraints
    }

    pub fn latent_order(&self) -> &[usize] {
        &self.latent_order
    }

    pub fn is_all_missing(&self) -> bool {
        self.constraints.is_all_missing()
    }

    pub fn is_all_present(&self) -> bool {
        self.constraints.is_all_present()
    }

    /// Replace the completion.
    ///
    /// # Errors
    /// - [`RankError::SizeMismatch`] for a rank of another size.
    /// - [`RankError::InconsistentCompletion`] if `rank` violates a constraint.
    pub fn set_completed(&mut self, rank: RankVal) -> RankResult<()> {
        validate_rank_size(&rank, self.len())?;
        if let Some(position) = self.constraints.first_violation(rank.ordering()) {
            return Err(RankError::InconsistentCompletion { position });
        }
        self.completed = rank;
        Ok(())
    }

    /// Replace the presentation order.
    ///
    /// # Errors
    /// - [`RankError::SizeMismatch`] or [`RankError::InvalidPermutation`].
    pub fn set_latent_order(&mut self, order: &[usize]) -> RankResult<()> {
        if order.len() != self.len() {
            return Err(RankError::SizeMismatch { expected: self.len(), actual: order.len() });
        }
        RankVal::from_ordering(order.to_vec())?;
        self.latent_order.copy_from_slice(order);
        Ok(())
    }

    /// Draw a uniform presentation order and a random consistent completion.
    ///
    /// The completion is uniform over all consistent ranks when every
    /// position is missing, or when the completions fit under `bound`.
    /// Otherwise a randomized depth-first search supplies a consistent
    /// starting point that later Gibbs sweeps mix away from.
    ///
    /// # Errors
    /// - [`RankError::UnsatisfiableConstraints`] if no completion exists.
    pub fn reset_to_random_completion<R>(&mut self, rng: &mut R, bound: usize) -> RankResult<()>
    where
        R: Rng + ?Sized,
    {
        let n = self.len();
        self.latent_order = (0..n).collect();
        self.latent_order.shuffle(rng);

        if self.constraints.is_all_missing() {
            let mut ordering: Vec<usize> = (0..n).collect();
            ordering.shuffle(rng);
            self.completed = RankVal::from_ordering(ordering)?;
            return Ok(());
        }

        match enumerate_completions(&self.constraints, bound) {
            Ok(mut all) => {
                if all.is_empty() {
                    return Err(RankError::UnsatisfiableConstraints);
                }
                let idx = rng.random_range(0..all.len());
                self.completed = all.swap_remove(idx);
            }
            Err(RankError::ConstraintTooLarge { count, bound }) => {
                debug!(count, bound, "completion enumeration over bound; using randomized search");
                let ordering = random_completion(&self.constraints, rng)
                    .ok_or(RankError::UnsatisfiableConstraints)?;
                self.completed = RankVal::from_ordering(ordering)?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Simulate `(x, y)` from the ISR model, overwriting both fields.
    ///
    /// Parameters
    /// ----------
    /// - `central_rank`: `&RankVal`
    ///   Mode μ of the distribution.
    /// - `precision`: `f64`
    ///   Probability π that a comparison agrees with μ.
    ///
    /// Returns
    /// -------
    /// `RankResult<f64>`
    ///   `ln P(x, y | μ, π)` of the simulated pair.
    ///
    /// Errors
    /// ------
    /// - `RankError::NotFullyMissing`
    ///   Returned for individuals with observed positions, whose completion
    ///   must stay consistent with the observation.
    /// - `RankError::InvalidPrecision`, `RankError::SizeMismatch`.
    pub fn generate<R>(&mut self, central_rank: &RankVal, precision: f64, rng: &mut R) -> RankResult<f64>
    where
        R: Rng + ?Sized,
    {
        validate_model_params(central_rank, precision, self.len())?;
        if !self.constraints.is_all_missing() {
            return Err(RankError::NotFullyMissing);
        }
        let n = self.len();
        if n == 0 {
            return Ok(0.0);
        }

        self.latent_order.shuffle(rng);
        let mut counts = ComparisonCounts::default();
        let mut placed: Vec<usize> = Vec::with_capacity(n);
        placed.push(self.latent_order[0]);

        for &item in &self.latent_order[1..] {
            let mut slot = None;
            for (i, &other) in placed.iter().enumerate() {
                let mut before = central_rank.precedes(item, other);
                counts.comparisons += 1;
                if rng.random_bool(precision) {
                    counts.agreements += 1;
                } else {
                    before = !before;
                }
                if before {
                    slot = Some(i);
                    break;
                }
            }
            match slot {
                Some(i) => placed.insert(i, item),
                None => placed.push(item),
            }
        }

        self.completed.set_ordering(&placed)?;
        Ok(log_probability(n, counts, precision))
    }

    /// Comparison counts obtained by replaying the insertion of `completed`
    /// in presentation order `latent_order`, judged against `central_rank`.
    ///
    /// # Errors
    /// - [`RankError::SizeMismatch`] if `central_rank` has another size.
    pub fn agreement_counts(&self, central_rank: &RankVal) -> RankResult<ComparisonCounts> {
        validate_rank_size(central_rank, self.len())?;
        Ok(replay_insertion(&self.completed, &self.latent_order, central_rank))
    }

    /// `ln P(x, y | μ, π)` of the current pair, with its sufficient statistics.
    pub fn completed_log_probability(
        &self, central_rank: &RankVal, precision: f64,
    ) -> RankResult<CompletedLogProbability> {
        validate_model_params(central_rank, precision, self.len())?;
        Ok(self.completed_log_probability_unchecked(central_rank, precision))
    }

    pub(crate) fn completed_log_probability_unchecked(
        &self, central_rank: &RankVal, precision: f64,
    ) -> CompletedLogProbability {
        let counts = replay_insertion(&self.completed, &self.latent_order, central_rank);
        CompletedLogProbability {
            log_probability: log_probability(self.len(), counts, precision),
            agreements: counts.agreements,
            disagreements: counts.disagreements(),
        }
    }

    fn log_probability_now(&self, central_rank: &RankVal, precision: f64) -> f64 {
        let counts = replay_insertion(&self.completed, &self.latent_order, central_rank);
        log_probability(self.len(), counts, precision)
    }

    /// One Gibbs sweep over the presentation order.
    ///
    /// For `p = 0..n-1`, choose between the current order and the order with
    /// positions `p, p+1` exchanged, proportionally to their completed
    /// probabilities.
    pub fn sample_latent_order<R>(&mut self, central_rank: &RankVal, precision: f64, rng: &mut R) -> RankResult<()>
    where
        R: Rng + ?Sized,
    {
        validate_model_params(central_rank, precision, self.len())?;
        let mut current = self.log_probability_now(central_rank, precision);
        for p in 0..self.len().saturating_sub(1) {
            self.latent_order.swap(p, p + 1);
            let proposed = self.log_probability_now(central_rank, precision);
            if rng.random::<f64>() < log_pair_to_multi(current, proposed) {
                current = proposed;
            } else {
                self.latent_order.swap(p, p + 1);
            }
        }
        Ok(())
    }

    /// One Gibbs sweep over the completion, restricted to allowed exchanges.
    pub fn sample_completion<R>(&mut self, central_rank: &RankVal, precision: f64, rng: &mut R) -> RankResult<()>
    where
        R: Rng + ?Sized,
    {
        validate_model_params(central_rank, precision, self.len())?;
        if self.constraints.is_all_present() {
            return Ok(());
        }
        let mut current = self.log_probability_now(central_rank, precision);
        for p in 0..self.len().saturating_sub(1) {
            if !self.exchange_allowed(p) {
                continue;
            }
            self.completed.apply_adjacent_exchange(p);
            let proposed = self.log_probability_now(central_rank, precision);
            if rng.random::<f64>() < log_pair_to_multi(current, proposed) {
                current = proposed;
            } else {
                self.completed.apply_adjacent_exchange(p);
            }
        }
        Ok(())
    }

    /// Which adjacent exchanges of `completed` keep it consistent.
    ///
    /// Exchange `p` is allowed iff neither position is observed and each
    /// current item is admissible at the other position.
    pub fn allowed_exchanges(&self) -> Vec<bool> {
        (0..self.len().saturating_sub(1)).map(|p| self.exchange_allowed(p)).collect()
    }

    fn exchange_allowed(&self, p: usize) -> bool {
        self.constraints.get(p).accepts_move_of(self.completed.item_at(p + 1))
            && self.constraints.get(p + 1).accepts_move_of(self.completed.item_at(p))
    }

    /// Every consistent completion, sorted lexicographically.
    ///
    /// # Errors
    /// - [`RankError::ConstraintTooLarge`] when more than `bound` exist.
    pub fn enumerate_completions(&self, bound: usize) -> RankResult<Vec<RankVal>> {
        enumerate_completions(&self.constraints, bound)
    }

    /// `ln` of the number of consistent completions, without listing them.
    ///
    /// # Errors
    /// - [`RankError::ConstraintTooLarge`] when the count needs more than
    ///   `bound` partial assignments of the candidate-set positions.
    pub fn ln_completion_count(&self, bound: usize) -> RankResult<f64> {
        ln_completion_count(&self.constraints, bound)
    }

    /// Exact conditional distribution of the presentation order given `completed`.
    ///
    /// Returns
    /// -------
    /// `(orders, probabilities)`
    ///   All `n!` presentation orders in lexicographic order, and their
    ///   conditional probabilities (summing to one).
    ///
    /// Errors
    /// ------
    /// - `RankError::ConstraintTooLarge` when `n! > bound`.
    pub fn exact_latent_distribution(
        &self, central_rank: &RankVal, precision: f64, bound: usize,
    ) -> RankResult<(Vec<Vec<usize>>, Vec<f64>)> {
        validate_model_params(central_rank, precision, self.len())?;
        let orders = enumerate_orders(self.len(), bound)?;
        let log_weights: Vec<f64> = orders
            .iter()
            .map(|order| {
                log_probability(
                    self.len(),
                    replay_insertion(&self.completed, order, central_rank),
                    precision,
                )
            })
            .collect();
        Ok((orders, log_to_multi(&log_weights)))
    }

    /// Probability of each consistent completion, marginalized over all
    /// presentation orders.
    ///
    /// # Errors
    /// - [`RankError::ConstraintTooLarge`] when the number of
    ///   (completion, order) pairs exceeds `bound`.
    pub fn observed_distribution(
        &self, central_rank: &RankVal, precision: f64, bound: usize,
    ) -> RankResult<BTreeMap<RankVal, f64>> {
        validate_model_params(central_rank, precision, self.len())?;
        let n = self.len();
        let completions = enumerate_completions(&self.constraints, bound)?;
        let count = checked_factorial(n)
            .and_then(|f| f.checked_mul(completions.len()))
            .unwrap_or(usize::MAX);
        if count > bound {
            return Err(RankError::ConstraintTooLarge { count, bound });
        }
        let orders = enumerate_orders(n, bound)?;

        let mut out = BTreeMap::new();
        for rank in completions {
            let log_terms: Vec<f64> = orders
                .iter()
                .map(|order| log_probability(n, replay_insertion(&rank, order, central_rank), precision))
                .collect();
            out.insert(rank, log_sum_exp(&log_terms).exp());
        }
        Ok(out)
    }

    /// Monte Carlo estimate of the distribution of generated ranks.
    ///
    /// Simulates `n_samples` ranks of this individual's size from
    /// `(central_rank, precision)` and returns their empirical frequencies.
    /// `self` is left untouched.
    pub fn simulate_observed_distribution<R>(
        &self, central_rank: &RankVal, precision: f64, n_samples: usize, rng: &mut R,
    ) -> RankResult<BTreeMap<RankVal, f64>>
    where
        R: Rng + ?Sized,
    {
        validate_model_params(central_rank, precision, self.len())?;
        let mut scratch = RankIndividual::missing(self.len());
        let mut counts: BTreeMap<RankVal, usize> = BTreeMap::new();
        for _ in 0..n_samples {
            scratch.generate(central_rank, precision, rng)?;
            *counts.entry(scratch.completed.clone()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(rank, c)| (rank, c as f64 / n_samples as f64))
            .collect())
    }
}

/// Replay the insertion of `completed` in order `latent_order`; count
/// comparisons and agreements with `central_rank`.
///
/// Insertion never reorders placed items, so the relative order of any two
/// items at insertion time equals their order in `completed`.
fn replay_insertion(completed: &RankVal, latent_order: &[usize], central_rank: &RankVal) -> ComparisonCounts {
    let mut counts = ComparisonCounts::default();
    let Some((&first, rest)) = latent_order.split_first() else {
        return counts;
    };
    let mut placed: Vec<usize> = Vec::with_capacity(latent_order.len());
    placed.push(first);

    for &item in rest {
        let mut slot = None;
        for (i, &other) in placed.iter().enumerate() {
            let before = completed.precedes(item, other);
            counts.comparisons += 1;
            if before == central_rank.precedes(item, other) {
                counts.agreements += 1;
            }
            if before {
                slot = Some(i);
                break;
            }
        }
        match slot {
            Some(i) => placed.insert(i, item),
            None => placed.push(item),
        }
    }
    counts
}

fn log_probability(n: usize, counts: ComparisonCounts, precision: f64) -> f64 {
    -ln_factorial(n) + ln_bernoulli_path(counts.agreements, counts.disagreements(), precision)
}
