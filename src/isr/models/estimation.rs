//! Class estimation driver: burn-in / run state machine for one ISR class.
//!
//! Purpose
//! -------
//! Orchestrate the stochastic estimation of one class over a data slice:
//! randomize the completions of its members, run Gibbs sweeps (presentation
//! orders, completions, central rank, M-step), discard the burn-in sweeps,
//! accumulate parameter draws and completed probabilities during the run,
//! and freeze the final parameters to the posterior summaries.
//!
//! Key behaviors
//! -------------
//! - Phases advance as `Uninitialized → RandomlyCompleted → BurnIn →
//!   Running → Finalized`; calling an operation in the wrong phase returns
//!   [`RankError::InvalidPhase`].
//! - During the run each sweep records `(μ, π)` into [`ParamStatistics`],
//!   the completion of every partially observed member into a [`RankStat`],
//!   and every member's `P(x | y) = n! · P(x, y)` into a
//!   [`HarmonicMeanEstimator`].
//! - [`ClassEstimation::log_likelihood_contribution`] uses the exact
//!   observed log-likelihood when enumeration fits under the bound and the
//!   harmonic-mean estimate otherwise. Under the posterior of `(x_mis, y)`
//!   the mean of `1 / P(x | y)` is `N / P(x_obs)`, with `N` the number of
//!   completions, so the estimate is shifted back by `ln N`.
//! - An M-step that finds no comparison at all keeps the previous
//!   parameters and logs a warning instead of aborting the run.
//!
//! Conventions
//! -----------
//! - The driver owns the class model and borrows the data mutably only
//!   while sweeping; member indices refer to positions in that slice.
//! - Phase transitions are logged at debug level.
use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use tracing::{debug, warn};

use crate::{
    inference::{
        harmonic_mean::HarmonicMeanEstimator,
        param_stat::{ParamStatistics, ParamSummary, RankStat, RankSummary},
    },
    isr::{
        core::{options::IsrOptions, validation::validate_index},
        errors::{RankError, RankResult},
        models::{class::RankClassModel, individual::RankIndividual},
    },
    numerical_stability::ln_factorial,
};

/// Phase of a class estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimationPhase {
    Uninitialized,
    RandomlyCompleted,
    BurnIn,
    Running,
    Finalized,
}

impl EstimationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimationPhase::Uninitialized => "Uninitialized",
            EstimationPhase::RandomlyCompleted => "RandomlyCompleted",
            EstimationPhase::BurnIn => "BurnIn",
            EstimationPhase::Running => "Running",
            EstimationPhase::Finalized => "Finalized",
        }
    }
}

impl fmt::Display for EstimationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stochastic estimation of one ISR class.
#[derive(Debug, Clone)]
pub struct ClassEstimation {
    model: RankClassModel,
    options: IsrOptions,
    phase: EstimationPhase,
    /// Sweeps completed in the current phase.
    sweep: usize,
    stats: ParamStatistics,
    harmonic: HarmonicMeanEstimator,
    completion_stats: BTreeMap<usize, RankStat>,
    summary: Option<ParamSummary>,
}

impl ClassEstimation {
    /// Driver for `model` over a data slice of `nb_individuals` individuals.
    ///
    /// # Errors
    /// - [`RankError::InvalidOptions`] for an invalid confidence level.
    pub fn new(model: RankClassModel, nb_individuals: usize, options: IsrOptions) -> RankResult<ClassEstimation> {
        let stats = ParamStatistics::new(options.confidence_level).map_err(|_| RankError::InvalidOptions {
            name: "confidence_level",
            value: options.confidence_level,
            reason: "Confidence level must lie strictly inside (0, 1).",
        })?;
        Ok(ClassEstimation {
            model,
            options,
            phase: EstimationPhase::Uninitialized,
            sweep: 0,
            stats,
            harmonic: HarmonicMeanEstimator::new(nb_individuals, 1),
            completion_stats: BTreeMap::new(),
            summary: None,
        })
    }

    pub fn model(&self) -> &RankClassModel {
        &self.model
    }

    pub fn options(&self) -> &IsrOptions {
        &self.options
    }

    pub fn phase(&self) -> EstimationPhase {
        self.phase
    }

    pub fn harmonic_estimator(&self) -> &HarmonicMeanEstimator {
        &self.harmonic
    }

    /// `true` once every run sweep has been recorded.
    pub fn is_run_complete(&self) -> bool {
        self.phase == EstimationPhase::Running && self.sweep >= self.options.nb_run
    }

    fn invalid_phase(&self, operation: &'static str) -> RankError {
        RankError::InvalidPhase { operation, phase: self.phase.as_str() }
    }

    fn enter(&mut self, phase: EstimationPhase) {
        debug!(from = %self.phase, to = %phase, members = self.model.members().len(), "class estimation phase");
        self.phase = phase;
        self.sweep = 0;
    }

    /// Randomize the completion and presentation order of every member.
    ///
    /// # Errors
    /// - [`RankError::InvalidPhase`] unless uninitialized.
    /// - [`RankError::IndexOutOfRange`] for a member outside `data`.
    /// - [`RankError::UnsatisfiableConstraints`] from a member.
    pub fn initialize<R>(&mut self, data: &mut [RankIndividual], rng: &mut R) -> RankResult<()>
    where
        R: Rng + ?Sized,
    {
        if self.phase != EstimationPhase::Uninitialized {
            return Err(self.invalid_phase("initialize"));
        }
        for &i in self.model.members() {
            validate_index(i, data.len())?;
            data[i].reset_to_random_completion(rng, self.options.enumeration_bound)?;
        }
        self.enter(EstimationPhase::RandomlyCompleted);
        Ok(())
    }

    /// One estimation sweep; returns the phase after the sweep.
    ///
    /// Each sweep resamples every member's presentation order and completion,
    /// then the central rank, then runs the M-step. Burn-in sweeps record
    /// nothing; run sweeps feed the accumulators.
    ///
    /// # Errors
    /// - [`RankError::InvalidPhase`] before `initialize`, after `finalize`,
    ///   or once the run is complete.
    /// - Errors from the samplers and the M-step.
    pub fn step<R>(&mut self, data: &mut [RankIndividual], rng: &mut R) -> RankResult<EstimationPhase>
    where
        R: Rng + ?Sized,
    {
        match self.phase {
            EstimationPhase::RandomlyCompleted => {
                let next =
                    if self.options.nb_burn_in == 0 { EstimationPhase::Running } else { EstimationPhase::BurnIn };
                self.enter(next);
            }
            EstimationPhase::BurnIn => {}
            EstimationPhase::Running if !self.is_run_complete() => {}
            _ => return Err(self.invalid_phase("step")),
        }

        self.sweep_once(data, rng)?;

        match self.phase {
            EstimationPhase::BurnIn => {
                self.sweep += 1;
                if self.sweep >= self.options.nb_burn_in {
                    self.enter(EstimationPhase::Running);
                }
            }
            EstimationPhase::Running => {
                self.record(data)?;
                self.sweep += 1;
            }
            _ => {}
        }
        Ok(self.phase)
    }

    fn sweep_once<R>(&mut self, data: &mut [RankIndividual], rng: &mut R) -> RankResult<()>
    where
        R: Rng + ?Sized,
    {
        let mu = self.model.central_rank().clone();
        let pi = self.model.precision();
        for &i in self.model.members() {
            validate_index(i, data.len())?;
            data[i].sample_latent_order(&mu, pi, rng)?;
            data[i].sample_completion(&mu, pi, rng)?;
        }

        if self.model.members().is_empty() {
            debug!("empty class; parameters kept");
            return Ok(());
        }
        self.model.sample_central_rank(data, rng)?;
        if let Some(message) = self.model.check_sample_condition(data)? {
            warn!(%message, "degenerate rank class");
        }
        match self.model.m_step(data, rng, &self.options) {
            Err(RankError::DegenerateComparisons { attempts }) => {
                warn!(attempts, "m-step found no comparison; parameters kept");
                Ok(())
            }
            other => other,
        }
    }

    fn record(&mut self, data: &[RankIndividual]) -> RankResult<()> {
        let iteration = self.sweep;
        let total = self.options.nb_run;
        self.stats.record(iteration, total, self.model.central_rank(), self.model.precision())?;

        let mu = self.model.central_rank();
        let pi = self.model.precision();
        for &i in self.model.members() {
            let ind = &data[i];
            let lp = ind.completed_log_probability(mu, pi)?;
            self.harmonic.observe_log(i, 0, lp.log_probability + ln_factorial(ind.len()))?;

            if !ind.is_all_present() {
                if !self.completion_stats.contains_key(&i) {
                    let stat = RankStat::new(self.options.confidence_level)?;
                    self.completion_stats.insert(i, stat);
                }
                if let Some(stat) = self.completion_stats.get_mut(&i) {
                    stat.record(iteration, total, ind.completed())?;
                }
            }
        }
        Ok(())
    }

    /// Freeze the parameters to the run summaries and return them.
    ///
    /// The central rank becomes the modal draw and the precision the mean
    /// draw.
    ///
    /// # Errors
    /// - [`RankError::InvalidPhase`] unless the run phase recorded at least
    ///   one sweep.
    pub fn finalize(&mut self) -> RankResult<ParamSummary> {
        if self.phase != EstimationPhase::Running || self.sweep == 0 {
            return Err(self.invalid_phase("finalize"));
        }
        let summary = self.stats.finalize()?;
        self.model.set_central_rank(summary.modal_rank.clone())?;
        self.model.set_precision(summary.precision.mean)?;
        self.enter(EstimationPhase::Finalized);
        self.summary = Some(summary.clone());
        Ok(summary)
    }

    /// Initialize, burn in, run and finalize.
    pub fn run<R>(&mut self, data: &mut [RankIndividual], rng: &mut R) -> RankResult<ParamSummary>
    where
        R: Rng + ?Sized,
    {
        self.initialize(data, rng)?;
        while !self.is_run_complete() {
            self.step(data, rng)?;
        }
        self.finalize()
    }

    /// Summary returned by the last `finalize`.
    pub fn summary(&self) -> Option<&ParamSummary> {
        self.summary.as_ref()
    }

    /// Imputed completions of partially observed members, after `finalize`.
    ///
    /// # Errors
    /// - [`RankError::InvalidPhase`] before `finalize`.
    pub fn imputed_completions(&self) -> RankResult<BTreeMap<usize, RankSummary>> {
        if self.phase != EstimationPhase::Finalized {
            return Err(self.invalid_phase("imputed_completions"));
        }
        self.completion_stats
            .iter()
            .map(|(&i, stat)| Ok((i, stat.finalize()?)))
            .collect()
    }

    /// Observed log-likelihood of individual `i` under the class.
    ///
    /// Exact when completions × `n!` fit under the enumeration bound,
    /// otherwise the harmonic-mean estimate from the run plus `ln N`, `N`
    /// being the number of completions of `i`.
    ///
    /// # Errors
    /// - [`RankError::Inference`] with `InsufficientSamples` when the
    ///   estimate is needed but `i` was not a member during the run.
    /// - [`RankError::ConstraintTooLarge`] when even counting the
    ///   completions exceeds the bound.
    pub fn log_likelihood_contribution(&self, data: &[RankIndividual], i: usize) -> RankResult<f64> {
        match self.model.observed_log_likelihood(data, i, self.options.enumeration_bound) {
            Err(RankError::ConstraintTooLarge { count, bound }) => {
                debug!(individual = i, count, bound, "using harmonic-mean log-likelihood");
                let ln_nb_completions = data[i].ln_completion_count(bound)?;
                Ok(self.harmonic.log_likelihood(i, 0)? + ln_nb_completions)
            }
            other => other,
        }
    }
}
