//! Rank class model: central rank and precision of one mixture component.
//!
//! A [`RankClassModel`] holds the ISR parameters `(μ, π)` of one class and
//! the set of individuals currently assigned to it. Its operations work on
//! the whole data slice and only read the members.
//!
//! Key ideas:
//! - The conditional law of μ given the members' `(x, y)` is proportional
//!   to the product of their completed probabilities. It is explored by
//!   sweeps over adjacent exchanges of μ, each a two-state heat-bath choice.
//! - The M-step collects several μ draws whose aggregate counts satisfy
//!   `0 < g < a`, so that `π = g / a` stays inside the open unit interval,
//!   and commits the draw with the highest aggregate log-probability. Only
//!   when no such draw turns up is a boundary precision accepted.
use std::collections::BTreeSet;

use rand::Rng;
use tracing::{debug, trace, warn};

use crate::{
    isr::{
        core::{
            options::IsrOptions,
            permutation::RankVal,
            validation::{validate_index, validate_precision, validate_rank_size},
        },
        errors::{RankError, RankResult},
        models::individual::{ComparisonCounts, CompletedLogProbability, RankIndividual},
    },
    numerical_stability::{log_pair_to_multi, log_sum_exp},
};

/// ISR parameters of one class and its member set.
#[derive(Debug, Clone, PartialEq)]
pub struct RankClassModel {
    central_rank: RankVal,
    precision: f64,
    members: BTreeSet<usize>,
}

impl RankClassModel {
    /// # Errors
    /// - [`RankError::InvalidPrecision`] unless `precision ∈ [0, 1]`.
    pub fn new(central_rank: RankVal, precision: f64) -> RankResult<RankClassModel> {
        Ok(RankClassModel { central_rank, precision: validate_precision(precision)?, members: BTreeSet::new() })
    }

    pub fn central_rank(&self) -> &RankVal {
        &self.central_rank
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    pub fn members(&self) -> &BTreeSet<usize> {
        &self.members
    }

    pub fn set_members(&mut self, members: BTreeSet<usize>) {
        self.members = members;
    }

    pub fn set_central_rank(&mut self, central_rank: RankVal) -> RankResult<()> {
        validate_rank_size(&central_rank, self.central_rank.len())?;
        self.central_rank = central_rank;
        Ok(())
    }

    pub fn set_precision(&mut self, precision: f64) -> RankResult<()> {
        self.precision = validate_precision(precision)?;
        Ok(())
    }

    /// Start parameters from the data: μ is the current completion of a
    /// random member and `π = (1 + 1/nb_classes) / 2`.
    ///
    /// An empty class keeps its central rank.
    pub fn initialize_parameters<R>(&mut self, data: &[RankIndividual], nb_classes: usize, rng: &mut R) -> RankResult<()>
    where
        R: Rng + ?Sized,
    {
        self.check_members(data)?;
        if !self.members.is_empty() {
            let pick = rng.random_range(0..self.members.len());
            if let Some(&i) = self.members.iter().nth(pick) {
                self.central_rank = data[i].completed().clone();
            }
        }
        self.precision = 0.5 * (1.0 + 1.0 / nb_classes.max(1) as f64);
        Ok(())
    }

    /// Aggregate completed log-probability and counts over the members.
    ///
    /// # Errors
    /// - [`RankError::IndexOutOfRange`] for a member outside `data`.
    /// - [`RankError::SizeMismatch`] if a member's size differs from μ.
    pub fn completed_log_probability(&self, data: &[RankIndividual]) -> RankResult<CompletedLogProbability> {
        self.check_members(data)?;
        Ok(self.aggregate(data))
    }

    fn aggregate(&self, data: &[RankIndividual]) -> CompletedLogProbability {
        let mut total = CompletedLogProbability { log_probability: 0.0, agreements: 0, disagreements: 0 };
        for &i in &self.members {
            let lp = data[i].completed_log_probability_unchecked(&self.central_rank, self.precision);
            total.log_probability += lp.log_probability;
            total.agreements += lp.agreements;
            total.disagreements += lp.disagreements;
        }
        total
    }

    fn check_members(&self, data: &[RankIndividual]) -> RankResult<()> {
        for &i in &self.members {
            validate_index(i, data.len())?;
            validate_rank_size(&self.central_rank, data[i].len())?;
        }
        Ok(())
    }

    /// One Gibbs sweep over the central rank.
    ///
    /// For `p = 0..n-1`, exchange positions `p, p+1` of μ and keep the
    /// exchange with probability `L' / (L + L')`, where `L` and `L'` are the
    /// aggregate completed probabilities before and after.
    pub fn sample_central_rank<R>(&mut self, data: &[RankIndividual], rng: &mut R) -> RankResult<()>
    where
        R: Rng + ?Sized,
    {
        self.check_members(data)?;
        self.sweep_central_rank(data, rng);
        Ok(())
    }

    fn sweep_central_rank<R>(&mut self, data: &[RankIndividual], rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let mut current = self.aggregate(data).log_probability;
        for p in 0..self.central_rank.len().saturating_sub(1) {
            self.central_rank.apply_adjacent_exchange(p);
            let proposed = self.aggregate(data).log_probability;
            let accept = rng.random::<f64>() < log_pair_to_multi(current, proposed);
            trace!(p, current, proposed, accept, "central rank exchange");
            if accept {
                current = proposed;
            } else {
                self.central_rank.apply_adjacent_exchange(p);
            }
        }
    }

    /// M-step: re-estimate `(μ, π)` from the members' current `(x, y)`.
    ///
    /// Draws with `0 < g < a` are preferred. When every sweep ends on a
    /// draw with `g ∈ {0, a}` (members that agree, or disagree, with μ on
    /// every comparison), the best of them is committed with the boundary
    /// precision `π = g / a ∈ {0, 1}`.
    ///
    /// Parameters
    /// ----------
    /// - `options.m_step_iterations`: number of valid draws to collect.
    /// - `options.m_step_max_attempts`: maximum number of sweeps spent.
    ///
    /// Errors
    /// ------
    /// - `RankError::DegenerateComparisons`
    ///   Returned when no sweep produced a single comparison (an empty
    ///   class, or ranks of size one). The parameters are left unchanged.
    /// - `RankError::IndexOutOfRange`, `RankError::SizeMismatch`.
    pub fn m_step<R>(&mut self, data: &[RankIndividual], rng: &mut R, options: &IsrOptions) -> RankResult<()>
    where
        R: Rng + ?Sized,
    {
        self.check_members(data)?;
        let start = self.central_rank.clone();

        let mut best: Option<(RankVal, f64, f64)> = None;
        let mut best_boundary: Option<(RankVal, f64, f64)> = None;
        let mut nb_valid = 0;
        let mut attempts = 0;
        while nb_valid < options.m_step_iterations && attempts < options.m_step_max_attempts {
            attempts += 1;
            self.sweep_central_rank(data, rng);
            let agg = self.aggregate(data);
            let counts = agg.counts();
            if counts.comparisons == 0 {
                continue;
            }
            let pi = counts.agreements as f64 / counts.comparisons as f64;
            let slot = if counts.agreements == 0 || counts.agreements == counts.comparisons {
                &mut best_boundary
            } else {
                nb_valid += 1;
                &mut best
            };
            if slot.as_ref().is_none_or(|(_, _, lp)| agg.log_probability > *lp) {
                *slot = Some((self.central_rank.clone(), pi, agg.log_probability));
            }
        }

        match best.or(best_boundary) {
            Some((mu, pi, log_probability)) => {
                if nb_valid == 0 {
                    warn!(attempts, pi, central_rank = %mu, "m-step precision on the boundary of its support");
                }
                debug!(nb_valid, attempts, pi, log_probability, central_rank = %mu, "m-step selected draw");
                self.central_rank = mu;
                self.precision = pi;
                Ok(())
            }
            None => {
                self.central_rank = start;
                Err(RankError::DegenerateComparisons { attempts })
            }
        }
    }

    /// Observed log-likelihood of individual `i` under this class.
    ///
    /// Fully missing individuals contribute 0; otherwise the probabilities
    /// of every consistent completion are summed over all presentation
    /// orders.
    ///
    /// # Errors
    /// - [`RankError::IndexOutOfRange`] if `i >= data.len()`.
    /// - [`RankError::ConstraintTooLarge`] when completions × `n!` exceed `bound`.
    pub fn observed_log_likelihood(&self, data: &[RankIndividual], i: usize, bound: usize) -> RankResult<f64> {
        validate_index(i, data.len())?;
        let ind = &data[i];
        if ind.is_all_missing() {
            return Ok(0.0);
        }
        let distribution = ind.observed_distribution(&self.central_rank, self.precision, bound)?;
        let log_terms: Vec<f64> = distribution.values().map(|p| p.ln()).collect();
        Ok(log_sum_exp(&log_terms))
    }

    /// Warning when the members' comparisons are uniformly correct or
    /// uniformly incorrect under μ, which drives the precision estimate to
    /// the boundary of its support. `None` when there is enough variability.
    pub fn check_sample_condition(&self, data: &[RankIndividual]) -> RankResult<Option<String>> {
        self.check_members(data)?;
        let mut all_incorrect = true;
        let mut all_correct = true;
        for &i in &self.members {
            let ComparisonCounts { comparisons, agreements } =
                data[i].agreement_counts(&self.central_rank)?;
            if comparisons == 0 {
                all_correct = false;
            } else if agreements == comparisons {
                all_incorrect = false;
            } else {
                all_correct = false;
                all_incorrect = false;
            }
            if !all_correct && !all_incorrect {
                return Ok(None);
            }
        }
        Ok(Some(format!(
            "Rank class with {} members: comparisons are uniformly correct or incorrect, \
             the precision would be estimated on the boundary of its support.",
            self.members.len()
        )))
    }
}
